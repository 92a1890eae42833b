//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_catalog_client;
mod http_warehouse_client;
mod key_pair_token_issuer;

pub use http_catalog_client::HttpCatalogClient;
pub use http_warehouse_client::HttpWarehouseClient;
pub use key_pair_token_issuer::KeyPairTokenIssuer;

//! Application services and ports for the warehouse catalog connector.

#![forbid(unsafe_code)]

mod access_service;
mod catalog_ports;
mod harvest_service;
mod warehouse_ports;

pub use access_service::AccessReconciliationService;
pub use catalog_ports::{AssetSink, CatalogClient, CatalogEventFeed, ConnectorStateStore};
pub use harvest_service::AssetHarvestService;
pub use warehouse_ports::{RoleStore, TokenIssuer, UserDirectory, WarehouseCatalog};

//! Domain entities and invariants for the warehouse catalog connector.

#![forbid(unsafe_code)]

mod access;
mod asset;
mod catalog;
mod event;
mod naming;
mod warehouse;

pub use access::{Access, AccessConsumer, AccessInfo, AccessProvider, ConsumerKind};
pub use asset::{Asset, AssetColumn, AssetInfo};
pub use catalog::{
    DataProduct, OutputPort, ROLE_OVERRIDE_KEY, Team, TeamMember, WAREHOUSE_OUTPUT_PORT_TYPE,
};
pub use event::{
    ACCESS_ACTIVATED_EVENT, ACCESS_DEACTIVATED_EVENT, AccessActivatedEvent,
    AccessDeactivatedEvent, CatalogEvent,
};
pub use naming::{access_role_name, data_product_role_name, sanitize_identifier, team_role_name};
pub use warehouse::{
    ColumnInfo, ContainingScope, Database, Grant, Privilege, Role, SchemaInfo, Securable,
    SecurableType, TableInfo, ViewInfo, WarehouseUser,
};

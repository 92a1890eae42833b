//! Ports towards the warehouse's administrative API.
//!
//! The warehouse is the only source of truth: nothing read through these
//! ports is cached across calls within one reconciliation, so concurrent
//! external mutation of warehouse state is tolerated.

use async_trait::async_trait;
use frostline_core::ConnectorResult;
use frostline_domain::{
    Database, Grant, Role, SchemaInfo, TableInfo, ViewInfo, WarehouseUser,
};

/// Role lifecycle and privilege grants on the warehouse.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the role with the given name, when it exists.
    async fn find_role(&self, role_name: &str) -> ConnectorResult<Option<Role>>;

    /// Creates a role with create-if-not-exists semantics. A role that
    /// already exists is success, not failure.
    async fn create_role(&self, role: Role) -> ConnectorResult<()>;

    /// Deletes a role with if-exists semantics; deleting an absent role
    /// is a no-op. The warehouse cascades all grants held by the role.
    async fn delete_role(&self, role_name: &str) -> ConnectorResult<()>;

    /// Grants privileges to a role. Re-granting an existing privilege is
    /// a no-op at the warehouse.
    async fn grant_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()>;

    /// Grants privileges to a role on all future objects within the
    /// grant's containing scope.
    async fn grant_future_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()>;
}

/// Warehouse user directory and user-level grants.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the full list of warehouse users.
    async fn list_users(&self) -> ConnectorResult<Vec<WarehouseUser>>;

    /// Grants USAGE on a role to one warehouse user.
    async fn grant_role_to_user(&self, user_name: &str, role_name: &str)
    -> ConnectorResult<()>;
}

/// Read access to warehouse databases, schemas, tables and views.
#[async_trait]
pub trait WarehouseCatalog: Send + Sync {
    /// Lists all databases visible to the connector.
    async fn list_databases(&self) -> ConnectorResult<Vec<Database>>;

    /// Lists all schemas of one database.
    async fn list_schemas(&self, database: &str) -> ConnectorResult<Vec<SchemaInfo>>;

    /// Returns one schema by exact database and schema name, when it exists.
    async fn find_schema(
        &self,
        database: &str,
        schema: &str,
    ) -> ConnectorResult<Option<SchemaInfo>>;

    /// Lists all tables of one schema, including column descriptions.
    async fn list_tables(&self, database: &str, schema: &str)
    -> ConnectorResult<Vec<TableInfo>>;

    /// Lists all views of one schema, including column descriptions.
    async fn list_views(&self, database: &str, schema: &str) -> ConnectorResult<Vec<ViewInfo>>;
}

/// Mints short-lived bearer tokens for outbound warehouse calls.
pub trait TokenIssuer: Send + Sync {
    /// Returns a freshly signed bearer token bound to the configured
    /// account and principal.
    fn bearer_token(&self) -> ConnectorResult<String>;
}

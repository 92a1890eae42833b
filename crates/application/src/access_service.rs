//! Access provisioning reconciliation.
//!
//! Translates access lifecycle events into warehouse role and privilege
//! mutations until the warehouse matches the access's desired state. The
//! service holds no local state: role existence and grants are read fresh
//! from the warehouse on every operation, and every mutation step is
//! individually idempotent. There is no retry and no rollback here; a
//! partially applied event is completed by redelivering it.

use std::sync::Arc;

use frostline_core::{ConnectorError, ConnectorResult};
use frostline_domain::{
    Access, AccessActivatedEvent, AccessDeactivatedEvent, ConsumerKind, DataProduct, Grant,
    OutputPort, Role, SchemaInfo, access_role_name, data_product_role_name, team_role_name,
};
use tracing::{info, warn};

use crate::catalog_ports::CatalogClient;
use crate::warehouse_ports::{RoleStore, UserDirectory, WarehouseCatalog};

mod identity;

#[cfg(test)]
mod tests;

/// Comment set on roles that represent consumers rather than accesses.
const MANAGED_ROLE_COMMENT: &str = "Managed by the catalog connector";

/// Server descriptor key naming the physical database.
const SERVER_DATABASE_KEY: &str = "database";

/// Server descriptor key naming the physical schema.
const SERVER_SCHEMA_KEY: &str = "schema";

/// Reconciles access lifecycle events against the warehouse role and
/// grant model.
pub struct AccessReconciliationService {
    catalog: Arc<dyn CatalogClient>,
    roles: Arc<dyn RoleStore>,
    users: Arc<dyn UserDirectory>,
    warehouse: Arc<dyn WarehouseCatalog>,
}

impl AccessReconciliationService {
    /// Creates an access reconciliation service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        roles: Arc<dyn RoleStore>,
        users: Arc<dyn UserDirectory>,
        warehouse: Arc<dyn WarehouseCatalog>,
    ) -> Self {
        Self {
            catalog,
            roles,
            users,
            warehouse,
        }
    }

    /// Handles an access activation event by granting the warehouse
    /// permissions the access implies.
    ///
    /// Non-warehouse output ports and inactive accesses are logged skips.
    /// Remote failures propagate unchanged; redelivery of the same event
    /// completes the remaining steps.
    pub async fn handle_access_activated(
        &self,
        event: &AccessActivatedEvent,
    ) -> ConnectorResult<()> {
        info!(access_id = %event.access_id, "processing access activation");
        let access = self.catalog.get_access(&event.access_id).await?;

        let Some((data_product, output_port)) = self.applicable_output_port(&access).await?
        else {
            return Ok(());
        };
        if !access.is_active() {
            info!(access_id = %access.id, "access is not active, skipping permission grants");
            return Ok(());
        }

        self.grant_permissions(&access, &data_product, &output_port)
            .await
    }

    /// Handles an access deactivation event by deleting the access role.
    ///
    /// The warehouse cascades all grants held by the role; deleting a role
    /// that was never created is a no-op.
    pub async fn handle_access_deactivated(
        &self,
        event: &AccessDeactivatedEvent,
    ) -> ConnectorResult<()> {
        info!(access_id = %event.access_id, "processing access deactivation");
        let access = self.catalog.get_access(&event.access_id).await?;

        if self.applicable_output_port(&access).await?.is_none() {
            return Ok(());
        }

        let role_name = access_role_name(&access);
        info!(access_id = %access.id, role = %role_name, "deleting access role");
        self.roles.delete_role(&role_name).await?;
        info!(role = %role_name, "access role deleted");
        Ok(())
    }

    /// Returns the data product and output port referenced by the access
    /// when this connector is responsible for them, or `None` for ports
    /// handled by other connectors.
    async fn applicable_output_port(
        &self,
        access: &Access,
    ) -> ConnectorResult<Option<(DataProduct, OutputPort)>> {
        let data_product = self
            .catalog
            .get_data_product(&access.provider.data_product_id)
            .await?;
        let Some(output_port) = data_product
            .output_port(&access.provider.output_port_id)
            .cloned()
        else {
            return Err(ConnectorError::NotFound(format!(
                "output port '{}' does not exist on data product '{}'",
                access.provider.output_port_id, access.provider.data_product_id
            )));
        };

        if !output_port.is_warehouse_port() {
            info!(
                access_id = %access.id,
                output_port_id = %output_port.id,
                "output port is not a warehouse port, skipping"
            );
            return Ok(None);
        }
        if output_port.server.is_none() {
            warn!(
                access_id = %access.id,
                output_port_id = %output_port.id,
                "output port has no server descriptor, skipping"
            );
            return Ok(None);
        }

        Ok(Some((data_product, output_port)))
    }

    async fn grant_permissions(
        &self,
        access: &Access,
        data_product: &DataProduct,
        output_port: &OutputPort,
    ) -> ConnectorResult<()> {
        // An access without a recognizable consumer must fail before any
        // warehouse mutation is attempted.
        let consumer_kind = access.consumer_kind()?;

        let schema = self.resolve_schema(data_product, output_port).await?;
        let role_name = access_role_name(access);
        let comment = format!(
            "Managed access {} to warehouse schema {} for data product {}, output port {}",
            access.id,
            schema.qualified_name(),
            data_product.id,
            output_port.id
        );
        let access_role = self.ensure_role(&role_name, &comment).await?;

        match consumer_kind {
            ConsumerKind::DataProduct => {
                let consumer_product_id = require_consumer_field(
                    access.consumer.data_product_id.as_deref(),
                    "consumerDataProductId",
                    &access.id,
                )?;
                let consumer_product = self.catalog.get_data_product(consumer_product_id).await?;
                let product_role = self
                    .ensure_role(&data_product_role_name(&consumer_product), MANAGED_ROLE_COMMENT)
                    .await?;
                self.roles
                    .grant_to_role(&access_role.name, Grant::usage_on_role(&product_role.name))
                    .await?;

                // Data-product consumers always also provision their owning team.
                let team_id = require_consumer_field(
                    access.consumer.team_id.as_deref(),
                    "consumerTeamId",
                    &access.id,
                )?;
                self.provision_consumer_team(&access_role.name, team_id)
                    .await?;
            }
            ConsumerKind::Team => {
                let team_id = require_consumer_field(
                    access.consumer.team_id.as_deref(),
                    "consumerTeamId",
                    &access.id,
                )?;
                self.provision_consumer_team(&access_role.name, team_id)
                    .await?;
            }
            ConsumerKind::User => {
                let email_address = require_consumer_field(
                    access.consumer.user_id.as_deref(),
                    "consumerUserId",
                    &access.id,
                )?;
                let user_names = identity::resolve_usernames(
                    self.users.as_ref(),
                    &[email_address.to_owned()],
                )
                .await?;
                for user_name in &user_names {
                    info!(user = %user_name, role = %access_role.name, "granting access role to warehouse user");
                    self.users
                        .grant_role_to_user(user_name, &access_role.name)
                        .await?;
                }
            }
        }

        self.grant_schema_permissions(&access_role.name, &schema)
            .await
    }

    /// Creates the team role, grants it to every resolvable team member,
    /// and grants the team role to the access role.
    async fn provision_consumer_team(
        &self,
        access_role_name: &str,
        team_id: &str,
    ) -> ConnectorResult<()> {
        let team = self.catalog.get_team(team_id).await?;
        let team_role = self
            .ensure_role(&team_role_name(&team), MANAGED_ROLE_COMMENT)
            .await?;

        let email_addresses = team.member_email_addresses();
        let user_names =
            identity::resolve_usernames(self.users.as_ref(), &email_addresses).await?;
        for user_name in &user_names {
            info!(user = %user_name, role = %team_role.name, "granting team role to warehouse user");
            self.users
                .grant_role_to_user(user_name, &team_role.name)
                .await?;
        }

        self.roles
            .grant_to_role(access_role_name, Grant::usage_on_role(&team_role.name))
            .await
    }

    /// Resolves the live schema the output port points at. An incomplete
    /// server descriptor or an absent schema is fatal for the event.
    async fn resolve_schema(
        &self,
        data_product: &DataProduct,
        output_port: &OutputPort,
    ) -> ConnectorResult<SchemaInfo> {
        let database = require_server_field(data_product, output_port, SERVER_DATABASE_KEY)?;
        let schema = require_server_field(data_product, output_port, SERVER_SCHEMA_KEY)?;

        self.warehouse
            .find_schema(database, schema)
            .await?
            .ok_or_else(|| {
                ConnectorError::NotFound(format!(
                    "schema {database}.{schema} not found in the warehouse"
                ))
            })
    }

    /// Returns the existing role untouched, or creates it with the given
    /// comment. An existing role's comment is never altered.
    async fn ensure_role(&self, role_name: &str, comment: &str) -> ConnectorResult<Role> {
        if let Some(existing) = self.roles.find_role(role_name).await? {
            info!(role = %role_name, "role already exists");
            return Ok(existing);
        }

        info!(role = %role_name, "creating role");
        let role = Role {
            name: role_name.to_owned(),
            comment: Some(comment.to_owned()),
        };
        self.roles.create_role(role.clone()).await?;
        Ok(role)
    }

    /// Grants the five schema-level permissions. All five are attempted
    /// unconditionally; each is idempotent at the warehouse.
    async fn grant_schema_permissions(
        &self,
        role_name: &str,
        schema: &SchemaInfo,
    ) -> ConnectorResult<()> {
        let database = schema.database_name.as_str();
        let schema_name = schema.name.as_str();
        info!(
            role = %role_name,
            schema = %schema.qualified_name(),
            "granting schema permissions"
        );

        self.roles
            .grant_to_role(role_name, Grant::usage_on_schema(database, schema_name))
            .await?;
        self.roles
            .grant_to_role(role_name, Grant::select_on_tables(database, schema_name))
            .await?;
        self.roles
            .grant_future_to_role(role_name, Grant::select_on_tables(database, schema_name))
            .await?;
        self.roles
            .grant_to_role(role_name, Grant::select_on_views(database, schema_name))
            .await?;
        self.roles
            .grant_future_to_role(role_name, Grant::select_on_views(database, schema_name))
            .await
    }
}

fn require_consumer_field<'a>(
    value: Option<&'a str>,
    field: &str,
    access_id: &str,
) -> ConnectorResult<&'a str> {
    value.ok_or_else(|| {
        ConnectorError::Validation(format!(
            "access '{access_id}' is missing consumer field '{field}'"
        ))
    })
}

fn require_server_field<'a>(
    data_product: &DataProduct,
    output_port: &'a OutputPort,
    key: &str,
) -> ConnectorResult<&'a str> {
    output_port
        .server_field(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ConnectorError::Validation(format!(
                "server field '{}' is not defined for data product '{}' in output port '{}'",
                key, data_product.id, output_port.id
            ))
        })
}

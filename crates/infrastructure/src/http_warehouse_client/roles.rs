use async_trait::async_trait;
use frostline_application::RoleStore;
use frostline_core::ConnectorResult;
use frostline_domain::{Grant, Role};

use super::HttpWarehouseClient;

#[async_trait]
impl RoleStore for HttpWarehouseClient {
    async fn find_role(&self, role_name: &str) -> ConnectorResult<Option<Role>> {
        let context = "find role";
        let request = self
            .request(reqwest::Method::GET, "/api/v2/roles")?
            .query(&[("like", role_name)]);
        let response = self.send(request, context).await?;
        let roles = response
            .json::<Vec<Role>>()
            .await
            .map_err(|error| super::remote_error(context, &error))?;

        // The like-filter matches a pattern; pick the exact name.
        Ok(roles
            .into_iter()
            .find(|role| role.name.eq_ignore_ascii_case(role_name)))
    }

    async fn create_role(&self, role: Role) -> ConnectorResult<()> {
        let request = self
            .request(reqwest::Method::POST, "/api/v2/roles")?
            .query(&[("createMode", "ifNotExists")])
            .json(&role);
        self.send(request, "create role").await?;
        Ok(())
    }

    async fn delete_role(&self, role_name: &str) -> ConnectorResult<()> {
        let request = self
            .request(reqwest::Method::DELETE, &format!("/api/v2/roles/{role_name}"))?
            .query(&[("ifExists", "true")]);
        self.send(request, "delete role").await?;
        Ok(())
    }

    async fn grant_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/roles/{role_name}/grants"),
            )?
            .json(&grant);
        self.send(request, "grant to role").await?;
        Ok(())
    }

    async fn grant_future_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/roles/{role_name}/future-grants"),
            )?
            .json(&grant);
        self.send(request, "grant future to role").await?;
        Ok(())
    }
}

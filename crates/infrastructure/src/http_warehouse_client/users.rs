use async_trait::async_trait;
use frostline_application::UserDirectory;
use frostline_core::ConnectorResult;
use frostline_domain::{Grant, WarehouseUser};

use super::HttpWarehouseClient;

#[async_trait]
impl UserDirectory for HttpWarehouseClient {
    async fn list_users(&self) -> ConnectorResult<Vec<WarehouseUser>> {
        self.get_json("/api/v2/users", "list users").await
    }

    async fn grant_role_to_user(&self, user_name: &str, role_name: &str) -> ConnectorResult<()> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/users/{user_name}/grants"),
            )?
            .json(&Grant::usage_on_role(role_name));
        self.send(request, "grant role to user").await?;
        Ok(())
    }
}

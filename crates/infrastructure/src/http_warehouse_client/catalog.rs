use async_trait::async_trait;
use frostline_application::WarehouseCatalog;
use frostline_core::ConnectorResult;
use frostline_domain::{Database, SchemaInfo, TableInfo, ViewInfo};

use super::HttpWarehouseClient;

#[async_trait]
impl WarehouseCatalog for HttpWarehouseClient {
    async fn list_databases(&self) -> ConnectorResult<Vec<Database>> {
        self.get_json("/api/v2/databases", "list databases").await
    }

    async fn list_schemas(&self, database: &str) -> ConnectorResult<Vec<SchemaInfo>> {
        let context = "list schemas";
        let request = self
            .request(
                reqwest::Method::GET,
                &format!("/api/v2/databases/{database}/schemas"),
            )?
            .query(&[("history", "true")]);
        let response = self.send(request, context).await?;
        response
            .json::<Vec<SchemaInfo>>()
            .await
            .map_err(|error| super::remote_error(context, &error))
    }

    async fn find_schema(
        &self,
        database: &str,
        schema: &str,
    ) -> ConnectorResult<Option<SchemaInfo>> {
        let schemas = self.list_schemas(database).await?;
        Ok(schemas
            .into_iter()
            .filter(|candidate| candidate.dropped_on.is_none())
            .find(|candidate| candidate.name.eq_ignore_ascii_case(schema)))
    }

    async fn list_tables(
        &self,
        database: &str,
        schema: &str,
    ) -> ConnectorResult<Vec<TableInfo>> {
        let context = "list tables";
        let request = self
            .request(
                reqwest::Method::GET,
                &format!("/api/v2/databases/{database}/schemas/{schema}/tables"),
            )?
            .query(&[("history", "true"), ("deep", "true")]);
        let response = self.send(request, context).await?;
        response
            .json::<Vec<TableInfo>>()
            .await
            .map_err(|error| super::remote_error(context, &error))
    }

    async fn list_views(&self, database: &str, schema: &str) -> ConnectorResult<Vec<ViewInfo>> {
        let context = "list views";
        let request = self
            .request(
                reqwest::Method::GET,
                &format!("/api/v2/databases/{database}/schemas/{schema}/views"),
            )?
            .query(&[("deep", "true")]);
        let response = self.send(request, context).await?;
        response
            .json::<Vec<ViewInfo>>()
            .await
            .map_err(|error| super::remote_error(context, &error))
    }
}

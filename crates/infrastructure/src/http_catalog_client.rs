//! HTTP client for the metadata catalog platform's REST API.

use async_trait::async_trait;
use frostline_application::{AssetSink, CatalogClient, CatalogEventFeed, ConnectorStateStore};
use frostline_core::{ConnectorError, ConnectorResult};
use frostline_domain::{Access, Asset, CatalogEvent, DataProduct, Team};
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_KEY_HEADER: &str = "x-api-key";

/// Catalog platform client authenticating with a static API key.
///
/// Implements every catalog-facing port: resource reads, event feed
/// polling, connector state persistence and asset pushes.
pub struct HttpCatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorState {
    #[serde(default)]
    last_event_id: Option<String>,
}

impl HttpCatalogClient {
    /// Creates a catalog client for the given base URL and API key.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, self.api_key.as_str())
    }

    async fn get_json<T>(&self, path: &str, context: &str) -> ConnectorResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        let response = check_status(response, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| remote_error(context, &error))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_access(&self, access_id: &str) -> ConnectorResult<Access> {
        self.get_json(&format!("/api/accesses/{access_id}"), "get access")
            .await
    }

    async fn get_data_product(&self, data_product_id: &str) -> ConnectorResult<DataProduct> {
        self.get_json(
            &format!("/api/dataproducts/{data_product_id}"),
            "get data product",
        )
        .await
    }

    async fn get_team(&self, team_id: &str) -> ConnectorResult<Team> {
        self.get_json(&format!("/api/teams/{team_id}"), "get team")
            .await
    }
}

#[async_trait]
impl CatalogEventFeed for HttpCatalogClient {
    async fn poll_events(
        &self,
        last_event_id: Option<&str>,
    ) -> ConnectorResult<Vec<CatalogEvent>> {
        let context = "poll events";
        let mut request = self.request(reqwest::Method::GET, "/api/events");
        if let Some(last_event_id) = last_event_id {
            request = request.query(&[("lastEventId", last_event_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        let response = check_status(response, context).await?;
        response
            .json::<Vec<CatalogEvent>>()
            .await
            .map_err(|error| remote_error(context, &error))
    }
}

#[async_trait]
impl ConnectorStateStore for HttpCatalogClient {
    async fn last_event_id(&self, connector_id: &str) -> ConnectorResult<Option<String>> {
        let context = "get connector state";
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/api/connectors/{connector_id}/state"),
            )
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;

        // A connector that has never stored state has none yet.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, context).await?;
        let state = response
            .json::<ConnectorState>()
            .await
            .map_err(|error| remote_error(context, &error))?;
        Ok(state.last_event_id)
    }

    async fn store_last_event_id(
        &self,
        connector_id: &str,
        event_id: &str,
    ) -> ConnectorResult<()> {
        let context = "store connector state";
        let state = ConnectorState {
            last_event_id: Some(event_id.to_owned()),
        };
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/connectors/{connector_id}/state"),
            )
            .json(&state)
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        check_status(response, context).await?;
        debug!(connector_id = %connector_id, event_id = %event_id, "stored connector state");
        Ok(())
    }
}

#[async_trait]
impl AssetSink for HttpCatalogClient {
    async fn asset_updated(&self, asset: Asset) -> ConnectorResult<()> {
        let context = "put asset";
        let response = self
            .request(reqwest::Method::PUT, &format!("/api/assets/{}", asset.id))
            .json(&asset)
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        check_status(response, context).await?;
        Ok(())
    }

    async fn asset_deleted(&self, asset_id: &str) -> ConnectorResult<()> {
        let context = "delete asset";
        let response = self
            .request(reqwest::Method::DELETE, &format!("/api/assets/{asset_id}"))
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        check_status(response, context).await?;
        Ok(())
    }
}

fn remote_error(context: &str, error: &dyn std::fmt::Display) -> ConnectorError {
    ConnectorError::Remote(format!("catalog {context}: {error}"))
}

async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> ConnectorResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ConnectorError::NotFound(format!(
            "catalog {context}: {body}"
        )));
    }
    Err(ConnectorError::Remote(format!(
        "catalog {context} failed with status {status}: {body}"
    )))
}

//! HTTP client for the warehouse's administrative REST API.

use std::sync::Arc;

use frostline_application::TokenIssuer;
use frostline_core::{ConnectorError, ConnectorResult};

mod catalog;
mod roles;
mod users;

const TOKEN_TYPE_HEADER: &str = "X-Warehouse-Authorization-Token-Type";
const TOKEN_TYPE: &str = "KEYPAIR_JWT";

/// Warehouse admin API client authenticating with key-pair bearer tokens.
///
/// A fresh token is minted for every outbound call, so long-running poll
/// loops never hold an expired credential.
pub struct HttpWarehouseClient {
    http_client: reqwest::Client,
    base_url: String,
    token_issuer: Arc<dyn TokenIssuer>,
}

impl HttpWarehouseClient {
    /// Creates a warehouse client for the given base URL.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token_issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http_client,
            base_url,
            token_issuer,
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> ConnectorResult<reqwest::RequestBuilder> {
        let bearer_token = self.token_issuer.bearer_token()?;
        Ok(self
            .http_client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(bearer_token)
            .header(TOKEN_TYPE_HEADER, TOKEN_TYPE))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> ConnectorResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|error| remote_error(context, &error))?;
        check_status(response, context).await
    }

    async fn get_json<T>(&self, path: &str, context: &str) -> ConnectorResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self.request(reqwest::Method::GET, path)?;
        let response = self.send(request, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| remote_error(context, &error))
    }
}

fn remote_error(context: &str, error: &dyn std::fmt::Display) -> ConnectorError {
    ConnectorError::Remote(format!("warehouse {context}: {error}"))
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
            "warehouse {context}: {body}"
        )));
    }
    Err(ConnectorError::Remote(format!(
        "warehouse {context} failed with status {status}: {body}"
    )))
}

//! Ports towards the metadata-catalog platform.

use async_trait::async_trait;
use frostline_core::ConnectorResult;
use frostline_domain::{Access, Asset, CatalogEvent, DataProduct, Team};

/// Read access to catalog resources referenced by lifecycle events.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns one access record by id.
    async fn get_access(&self, access_id: &str) -> ConnectorResult<Access>;

    /// Returns one data product by id.
    async fn get_data_product(&self, data_product_id: &str) -> ConnectorResult<DataProduct>;

    /// Returns one team by id.
    async fn get_team(&self, team_id: &str) -> ConnectorResult<Team>;
}

/// Polling access to the catalog platform's event feed.
#[async_trait]
pub trait CatalogEventFeed: Send + Sync {
    /// Returns events published after the given cursor, oldest first.
    async fn poll_events(
        &self,
        last_event_id: Option<&str>,
    ) -> ConnectorResult<Vec<CatalogEvent>>;
}

/// Remote persistence for the connector's event feed cursor.
#[async_trait]
pub trait ConnectorStateStore: Send + Sync {
    /// Returns the last event id processed by this connector, when any.
    async fn last_event_id(&self, connector_id: &str) -> ConnectorResult<Option<String>>;

    /// Stores the last event id processed by this connector.
    async fn store_last_event_id(
        &self,
        connector_id: &str,
        event_id: &str,
    ) -> ConnectorResult<()>;
}

/// Push callback receiving harvested catalog assets.
#[async_trait]
pub trait AssetSink: Send + Sync {
    /// Creates or updates one asset in the catalog.
    async fn asset_updated(&self, asset: Asset) -> ConnectorResult<()>;

    /// Removes one asset from the catalog.
    async fn asset_deleted(&self, asset_id: &str) -> ConnectorResult<()>;
}

//! Frostline warehouse connector runtime.

#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use frostline_application::{
    AccessReconciliationService, AssetHarvestService, CatalogEventFeed, ConnectorStateStore,
};
use frostline_core::{ConnectorError, ConnectorResult};
use frostline_domain::{
    ACCESS_ACTIVATED_EVENT, ACCESS_DEACTIVATED_EVENT, AccessActivatedEvent,
    AccessDeactivatedEvent, CatalogEvent,
};
use frostline_infrastructure::{HttpCatalogClient, HttpWarehouseClient, KeyPairTokenIssuer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct ConnectorConfig {
    catalog_base_url: String,
    catalog_api_key: String,
    warehouse_base_url: String,
    warehouse_account: String,
    warehouse_user: String,
    warehouse_private_key_file: PathBuf,
    excluded_databases: Vec<String>,
    access_management_enabled: bool,
    access_connector_id: String,
    event_poll_interval_ms: u64,
    assets_enabled: bool,
    harvest_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), ConnectorError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConnectorConfig::load()?;
    if !config.access_management_enabled && !config.assets_enabled {
        return Err(ConnectorError::Validation(
            "at least one of ACCESS_MANAGEMENT_ENABLED and ASSETS_ENABLED must be true".to_owned(),
        ));
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|error| {
            ConnectorError::Internal(format!("failed to build HTTP client: {error}"))
        })?;

    let catalog = Arc::new(HttpCatalogClient::new(
        http_client.clone(),
        config.catalog_base_url.as_str(),
        config.catalog_api_key.as_str(),
    ));
    let token_issuer = Arc::new(KeyPairTokenIssuer::from_pem_file(
        config.warehouse_account.as_str(),
        config.warehouse_user.as_str(),
        &config.warehouse_private_key_file,
    )?);
    let warehouse = Arc::new(HttpWarehouseClient::new(
        http_client,
        config.warehouse_base_url.as_str(),
        token_issuer,
    ));

    info!(
        catalog_base_url = %config.catalog_base_url,
        warehouse_base_url = %config.warehouse_base_url,
        warehouse_account = %config.warehouse_account,
        access_management_enabled = config.access_management_enabled,
        assets_enabled = config.assets_enabled,
        "frostline-connector started"
    );

    let mut tasks = Vec::new();

    if config.access_management_enabled {
        let reconciler = Arc::new(AccessReconciliationService::new(
            catalog.clone(),
            warehouse.clone(),
            warehouse.clone(),
            warehouse.clone(),
        ));
        let catalog = catalog.clone();
        let connector_id = config.access_connector_id.clone();
        let poll_interval = Duration::from_millis(config.event_poll_interval_ms);
        tasks.push(tokio::spawn(async move {
            run_event_loop(reconciler, catalog, connector_id, poll_interval).await;
        }));
    }

    if config.assets_enabled {
        let harvester = AssetHarvestService::new(
            warehouse,
            catalog,
            config.warehouse_account.clone(),
            config.excluded_databases.clone(),
        );
        let harvest_interval = Duration::from_millis(config.harvest_interval_ms);
        tasks.push(tokio::spawn(async move {
            run_harvest_loop(harvester, harvest_interval).await;
        }));
    }

    for task in tasks {
        if let Err(error) = task.await {
            warn!(error = %error, "connector task terminated");
        }
    }
    Ok(())
}

/// Polls the catalog event feed and feeds lifecycle events through the
/// reconciler, one event at a time.
///
/// The cursor only advances after an event has been fully processed, so a
/// failed event is redelivered on the next tick.
async fn run_event_loop(
    reconciler: Arc<AccessReconciliationService>,
    catalog: Arc<HttpCatalogClient>,
    connector_id: String,
    poll_interval: Duration,
) {
    info!(connector_id = %connector_id, "access management event loop started");
    loop {
        if let Err(error) =
            process_pending_events(&reconciler, catalog.as_ref(), connector_id.as_str()).await
        {
            warn!(
                connector_id = %connector_id,
                error = %error,
                "event processing failed, will retry on the next poll"
            );
        }
        tokio::time::sleep(poll_interval).await;
    }
}

async fn process_pending_events(
    reconciler: &AccessReconciliationService,
    catalog: &HttpCatalogClient,
    connector_id: &str,
) -> ConnectorResult<()> {
    let last_event_id = catalog.last_event_id(connector_id).await?;
    let events = catalog.poll_events(last_event_id.as_deref()).await?;

    for event in events {
        handle_event(reconciler, &event).await?;
        catalog.store_last_event_id(connector_id, &event.id).await?;
    }
    Ok(())
}

async fn handle_event(
    reconciler: &AccessReconciliationService,
    event: &CatalogEvent,
) -> ConnectorResult<()> {
    match event.event_type.as_str() {
        ACCESS_ACTIVATED_EVENT => {
            reconciler
                .handle_access_activated(&AccessActivatedEvent {
                    access_id: event.subject_id.clone(),
                })
                .await
        }
        ACCESS_DEACTIVATED_EVENT => {
            reconciler
                .handle_access_deactivated(&AccessDeactivatedEvent {
                    access_id: event.subject_id.clone(),
                })
                .await
        }
        other => {
            debug!(event_id = %event.id, event_type = %other, "ignoring event");
            Ok(())
        }
    }
}

/// Runs full harvest passes at a fixed delay.
async fn run_harvest_loop(harvester: AssetHarvestService, harvest_interval: Duration) {
    info!("asset harvest loop started");
    loop {
        if let Err(error) = harvester.harvest().await {
            warn!(error = %error, "asset harvest failed, will retry on the next run");
        }
        tokio::time::sleep(harvest_interval).await;
    }
}

impl ConnectorConfig {
    fn load() -> ConnectorResult<Self> {
        let catalog_base_url = required_env("CATALOG_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let catalog_api_key = required_env("CATALOG_API_KEY")?;
        let warehouse_base_url = required_env("WAREHOUSE_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let warehouse_account = required_env("WAREHOUSE_ACCOUNT")?;
        let warehouse_user = required_env("WAREHOUSE_USER")?;
        let warehouse_private_key_file =
            PathBuf::from(required_env("WAREHOUSE_PRIVATE_KEY_FILE")?);
        let excluded_databases = env::var("WAREHOUSE_EXCLUDED_DATABASES")
            .unwrap_or_default()
            .split(',')
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();
        let access_management_enabled = parse_env_bool("ACCESS_MANAGEMENT_ENABLED", true)?;
        let access_connector_id = env::var("ACCESS_CONNECTOR_ID")
            .unwrap_or_else(|_| "warehouse-access-management".to_owned());
        let event_poll_interval_ms = parse_env_u64("EVENT_POLL_INTERVAL_MS", 5_000)?;
        let assets_enabled = parse_env_bool("ASSETS_ENABLED", true)?;
        let harvest_interval_ms = parse_env_u64("HARVEST_INTERVAL_MS", 300_000)?;

        if event_poll_interval_ms == 0 {
            return Err(ConnectorError::Validation(
                "EVENT_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }
        if harvest_interval_ms == 0 {
            return Err(ConnectorError::Validation(
                "HARVEST_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            catalog_base_url,
            catalog_api_key,
            warehouse_base_url,
            warehouse_account,
            warehouse_user,
            warehouse_private_key_file,
            excluded_databases,
            access_management_enabled,
            access_connector_id,
            event_poll_interval_ms,
            assets_enabled,
            harvest_interval_ms,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> ConnectorResult<String> {
    env::var(name).map_err(|_| ConnectorError::Validation(format!("{name} is required")))
}

fn parse_env_bool(name: &str, default: bool) -> ConnectorResult<bool> {
    match env::var(name) {
        Ok(value) => value.parse::<bool>().map_err(|error| {
            ConnectorError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> ConnectorResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            ConnectorError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

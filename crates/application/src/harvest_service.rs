//! Warehouse metadata harvesting.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use frostline_core::ConnectorResult;
use frostline_domain::{
    Asset, AssetColumn, AssetInfo, ColumnInfo, SchemaInfo, TableInfo, ViewInfo,
};
use tracing::{debug, info};

use crate::catalog_ports::AssetSink;
use crate::warehouse_ports::WarehouseCatalog;


/// Source tag stamped on every harvested asset.
const ASSET_SOURCE: &str = "warehouse";

/// Schema internal to the warehouse, present in every database.
const INTERNAL_SCHEMA: &str = "INFORMATION_SCHEMA";

/// Walks the warehouse object tree and pushes every database schema,
/// table and view to the catalog as an asset.
///
/// Dropped schemas and tables are reported as deletions. System and
/// sample databases are excluded by name.
pub struct AssetHarvestService {
    warehouse: Arc<dyn WarehouseCatalog>,
    sink: Arc<dyn AssetSink>,
    account: String,
    excluded_databases: HashSet<String>,
}

impl AssetHarvestService {
    /// Creates an asset harvest service for one warehouse account.
    #[must_use]
    pub fn new(
        warehouse: Arc<dyn WarehouseCatalog>,
        sink: Arc<dyn AssetSink>,
        account: impl Into<String>,
        excluded_databases: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            warehouse,
            sink,
            account: account.into(),
            excluded_databases: excluded_databases.into_iter().collect(),
        }
    }

    /// Runs one full harvest pass over every included database.
    ///
    /// A remote failure aborts the pass; the next scheduled run starts
    /// over from the top.
    pub async fn harvest(&self) -> ConnectorResult<()> {
        info!("fetching warehouse databases");
        let databases = self.warehouse.list_databases().await?;

        for database in databases {
            if self.excluded_databases.contains(&database.name) {
                debug!(database = %database.name, "database excluded from harvesting");
                continue;
            }
            self.harvest_database(&database.name).await?;
        }
        Ok(())
    }

    async fn harvest_database(&self, database: &str) -> ConnectorResult<()> {
        info!(database = %database, "harvesting database");
        let schemas = self.warehouse.list_schemas(database).await?;

        for schema in schemas {
            if schema.name == INTERNAL_SCHEMA {
                debug!(schema = %schema.qualified_name(), "schema excluded from harvesting");
                continue;
            }

            info!(schema = %schema.qualified_name(), "harvesting schema");
            if schema.dropped_on.is_some() {
                self.sink.asset_deleted(&self.schema_asset_id(&schema)).await?;
                continue;
            }
            self.sink.asset_updated(self.schema_asset(&schema)).await?;

            let tables = self
                .warehouse
                .list_tables(database, &schema.name)
                .await?;
            for table in tables {
                if table.dropped_on.is_some() {
                    self.sink.asset_deleted(&self.table_asset_id(&table)).await?;
                    continue;
                }
                self.sink.asset_updated(self.table_asset(&table)).await?;
            }

            let views = self.warehouse.list_views(database, &schema.name).await?;
            for view in views {
                self.sink.asset_updated(self.view_asset(&view)).await?;
            }
        }
        Ok(())
    }

    fn schema_asset_id(&self, schema: &SchemaInfo) -> String {
        format!(
            "{ASSET_SOURCE}-{}-{}-{}",
            self.account, schema.database_name, schema.name
        )
    }

    fn table_asset_id(&self, table: &TableInfo) -> String {
        format!(
            "{ASSET_SOURCE}-{}-{}-{}-{}",
            self.account, table.database_name, table.schema_name, table.name
        )
    }

    fn view_asset_id(&self, view: &ViewInfo) -> String {
        format!(
            "{ASSET_SOURCE}-{}-{}-{}-{}",
            self.account, view.database_name, view.schema_name, view.name
        )
    }

    fn schema_asset(&self, schema: &SchemaInfo) -> Asset {
        let mut properties = self.base_properties(&schema.database_name, &schema.name);
        insert_present(&mut properties, "createdOn", schema.created_on.as_deref());
        insert_present(&mut properties, "kind", schema.kind.as_deref());
        insert_present(&mut properties, "owner", schema.owner.as_deref());

        Asset {
            id: self.schema_asset_id(schema),
            info: AssetInfo {
                name: schema.name.clone(),
                source: ASSET_SOURCE.to_owned(),
                qualified_name: schema.qualified_name(),
                asset_type: "warehouse_schema".to_owned(),
                status: "active".to_owned(),
                description: schema.comment.clone(),
            },
            properties,
            columns: Vec::new(),
        }
    }

    fn table_asset(&self, table: &TableInfo) -> Asset {
        let mut properties = self.base_properties(&table.database_name, &table.schema_name);
        properties.insert("table".to_owned(), table.name.clone());
        insert_present(&mut properties, "createdOn", table.created_on.as_deref());
        insert_present(&mut properties, "kind", table.kind.as_deref());
        insert_present(&mut properties, "tableType", table.table_type.as_deref());
        insert_present(&mut properties, "owner", table.owner.as_deref());

        Asset {
            id: self.table_asset_id(table),
            info: AssetInfo {
                name: table.name.clone(),
                source: ASSET_SOURCE.to_owned(),
                qualified_name: format!(
                    "{}.{}.{}",
                    table.database_name, table.schema_name, table.name
                ),
                asset_type: "warehouse_table".to_owned(),
                status: "active".to_owned(),
                description: table.comment.clone(),
            },
            properties,
            columns: asset_columns(&table.columns),
        }
    }

    fn view_asset(&self, view: &ViewInfo) -> Asset {
        let mut properties = self.base_properties(&view.database_name, &view.schema_name);
        properties.insert("view".to_owned(), view.name.clone());
        insert_present(&mut properties, "createdOn", view.created_on.as_deref());
        insert_present(&mut properties, "kind", view.kind.as_deref());
        insert_present(&mut properties, "owner", view.owner.as_deref());
        if let Some(secure) = view.secure {
            properties.insert("secure".to_owned(), secure.to_string());
        }

        Asset {
            id: self.view_asset_id(view),
            info: AssetInfo {
                name: view.name.clone(),
                source: ASSET_SOURCE.to_owned(),
                qualified_name: format!(
                    "{}.{}.{}",
                    view.database_name, view.schema_name, view.name
                ),
                asset_type: "warehouse_view".to_owned(),
                status: "active".to_owned(),
                description: view.comment.clone(),
            },
            properties,
            columns: asset_columns(&view.columns),
        }
    }

    fn base_properties(&self, database: &str, schema: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("account".to_owned(), self.account.clone()),
            ("database".to_owned(), database.to_owned()),
            ("schema".to_owned(), schema.to_owned()),
        ])
    }
}

fn insert_present(properties: &mut BTreeMap<String, String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        properties.insert(key.to_owned(), value.to_owned());
    }
}

fn asset_columns(columns: &[ColumnInfo]) -> Vec<AssetColumn> {
    columns
        .iter()
        .map(|column| AssetColumn {
            name: column.name.clone(),
            column_type: column.datatype.clone(),
            description: column.comment.clone(),
        })
        .collect()
}

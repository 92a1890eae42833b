//! Catalog asset records pushed to the metadata platform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A catalog asset describing one warehouse object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable asset identifier derived from account and object names.
    pub id: String,
    /// Descriptive asset attributes.
    pub info: AssetInfo,
    /// Additional key/value properties of the warehouse object.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Column descriptions, for tables and views.
    #[serde(default)]
    pub columns: Vec<AssetColumn>,
}

/// Descriptive attributes of a catalog asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Object name within the warehouse.
    pub name: String,
    /// Source system tag.
    pub source: String,
    /// Fully qualified warehouse name.
    pub qualified_name: String,
    /// Asset type tag, such as schema, table or view.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Lifecycle status of the asset.
    pub status: String,
    /// Optional description taken from the warehouse comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One column of a table or view asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetColumn {
    /// Column name.
    pub name: String,
    /// Warehouse data type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    /// Optional description taken from the column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

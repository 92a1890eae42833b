//! Warehouse-side principals, grants and catalog objects.
//!
//! Grants are ephemeral request payloads, never persisted locally. The
//! warehouse's own grant semantics are additive and idempotent, which is
//! what makes re-running a reconciliation safe.

use serde::{Deserialize, Serialize};

/// A named grantable warehouse principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Warehouse-legal role name.
    pub name: String,
    /// Human-readable comment set at creation time.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Privileges this connector grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privilege {
    /// Right to use a role or schema.
    Usage,
    /// Right to read rows from tables and views.
    Select,
}

/// Securable object classes this connector grants on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurableType {
    /// Another warehouse role.
    Role,
    /// A schema within a database.
    Schema,
    /// Tables within a scope.
    Table,
    /// Views within a scope.
    View,
}

/// Named securable target of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Securable {
    /// Fully qualified name of the securable object.
    pub name: String,
}

/// Scope selecting all objects of a securable type within a database
/// or schema; used for bulk and future grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainingScope {
    /// Database the scope belongs to.
    pub database: String,
    /// Optional schema narrowing the scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// A privilege grant submitted to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Class of the securable object.
    pub securable_type: SecurableType,
    /// Named securable, for grants on a single object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub securable: Option<Securable>,
    /// Containing scope, for grants on all objects within a scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_scope: Option<ContainingScope>,
    /// Privileges being granted.
    pub privileges: Vec<Privilege>,
    /// Whether the grantee may grant the privilege onwards.
    pub grant_option: bool,
}

impl Grant {
    /// USAGE on another role, making the grantee inherit it.
    #[must_use]
    pub fn usage_on_role(role_name: &str) -> Self {
        Self {
            securable_type: SecurableType::Role,
            securable: Some(Securable {
                name: role_name.to_owned(),
            }),
            containing_scope: None,
            privileges: vec![Privilege::Usage],
            grant_option: false,
        }
    }

    /// USAGE on one schema.
    #[must_use]
    pub fn usage_on_schema(database: &str, schema: &str) -> Self {
        Self {
            securable_type: SecurableType::Schema,
            securable: Some(Securable {
                name: format!("{database}.{schema}"),
            }),
            containing_scope: None,
            privileges: vec![Privilege::Usage],
            grant_option: false,
        }
    }

    /// SELECT on all tables within one schema.
    #[must_use]
    pub fn select_on_tables(database: &str, schema: &str) -> Self {
        Self {
            securable_type: SecurableType::Table,
            securable: None,
            containing_scope: Some(ContainingScope {
                database: database.to_owned(),
                schema: Some(schema.to_owned()),
            }),
            privileges: vec![Privilege::Select],
            grant_option: false,
        }
    }

    /// SELECT on all views within one schema.
    #[must_use]
    pub fn select_on_views(database: &str, schema: &str) -> Self {
        Self {
            securable_type: SecurableType::View,
            securable: None,
            containing_scope: Some(ContainingScope {
                database: database.to_owned(),
                schema: Some(schema.to_owned()),
            }),
            privileges: vec![Privilege::Select],
            grant_option: false,
        }
    }
}

/// A warehouse database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name.
    pub name: String,
    /// Optional database comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// A schema as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Schema name.
    pub name: String,
    /// Database the schema belongs to.
    pub database_name: String,
    /// Optional schema comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp as reported by the warehouse.
    #[serde(default)]
    pub created_on: Option<String>,
    /// Drop timestamp; set when the schema has been dropped.
    #[serde(default)]
    pub dropped_on: Option<String>,
    /// Warehouse-specific object kind tag.
    #[serde(default)]
    pub kind: Option<String>,
    /// Owning role.
    #[serde(default)]
    pub owner: Option<String>,
}

impl SchemaInfo {
    /// Returns the `database.schema` qualified name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database_name, self.name)
    }
}

/// A table as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Database the table belongs to.
    pub database_name: String,
    /// Schema the table belongs to.
    pub schema_name: String,
    /// Optional table comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp as reported by the warehouse.
    #[serde(default)]
    pub created_on: Option<String>,
    /// Drop timestamp; set when the table has been dropped.
    #[serde(default)]
    pub dropped_on: Option<String>,
    /// Warehouse-specific object kind tag.
    #[serde(default)]
    pub kind: Option<String>,
    /// Table type tag, such as managed or external.
    #[serde(default)]
    pub table_type: Option<String>,
    /// Owning role.
    #[serde(default)]
    pub owner: Option<String>,
    /// Column descriptions, when listed deeply.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// A view as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInfo {
    /// View name.
    pub name: String,
    /// Database the view belongs to.
    pub database_name: String,
    /// Schema the view belongs to.
    pub schema_name: String,
    /// Optional view comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp as reported by the warehouse.
    #[serde(default)]
    pub created_on: Option<String>,
    /// Warehouse-specific object kind tag.
    #[serde(default)]
    pub kind: Option<String>,
    /// Whether the view is a secure view.
    #[serde(default)]
    pub secure: Option<bool>,
    /// Owning role.
    #[serde(default)]
    pub owner: Option<String>,
    /// Column descriptions, when listed deeply.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Warehouse data type.
    #[serde(default)]
    pub datatype: Option<String>,
    /// Optional column comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// A warehouse user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseUser {
    /// Login name of the user.
    pub name: String,
    /// Email address registered for the user.
    #[serde(default)]
    pub email: Option<String>,
}

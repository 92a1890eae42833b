//! Access request records from the catalog platform.

use std::collections::HashMap;

use frostline_core::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};

use crate::catalog::ROLE_OVERRIDE_KEY;

/// An approved consumer-to-output-port relationship record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Access {
    /// Unique access identifier assigned by the catalog.
    pub id: String,
    /// Lifecycle information.
    #[serde(default)]
    pub info: AccessInfo,
    /// Provider side of the relationship.
    pub provider: AccessProvider,
    /// Consumer side of the relationship.
    pub consumer: AccessConsumer,
    /// Free-form custom properties; may carry a role name override.
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

/// Lifecycle attributes of an access record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessInfo {
    /// Whether the access request is currently approved and active.
    #[serde(default)]
    pub active: Option<bool>,
}

/// Provider reference of an access record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessProvider {
    /// Data product exposing the requested dataset.
    pub data_product_id: String,
    /// Output port of the data product being accessed.
    pub output_port_id: String,
}

/// Consumer reference of an access record.
///
/// The consumer is identified by the first populated reference in
/// declaration order, see [`Access::consumer_kind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConsumer {
    /// Consuming data product, when the consumer is a downstream product.
    #[serde(default)]
    pub data_product_id: Option<String>,
    /// Consuming team, when the consumer is a team. Also populated for
    /// data-product consumers as the product's owning team.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Consumer email address, when the consumer is an individual user.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Closed set of consumer kinds an access record can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerKind {
    /// A downstream data product consumes the output port.
    DataProduct,
    /// A team consumes the output port.
    Team,
    /// An individual user consumes the output port.
    User,
}

impl Access {
    /// Returns true when the access request is approved and active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.info.active == Some(true)
    }

    /// Resolves the consumer kind by strict precedence: data product,
    /// then team, then user. The first populated reference wins.
    pub fn consumer_kind(&self) -> ConnectorResult<ConsumerKind> {
        if self.consumer.data_product_id.is_some() {
            Ok(ConsumerKind::DataProduct)
        } else if self.consumer.team_id.is_some() {
            Ok(ConsumerKind::Team)
        } else if self.consumer.user_id.is_some() {
            Ok(ConsumerKind::User)
        } else {
            Err(ConnectorError::Validation(format!(
                "access '{}' has no recognizable consumer reference",
                self.id
            )))
        }
    }

    /// Returns the explicit warehouse role name override, when present.
    #[must_use]
    pub fn role_override(&self) -> Option<&str> {
        self.custom.get(ROLE_OVERRIDE_KEY).map(String::as_str)
    }
}

//! Catalog event feed records.

use serde::{Deserialize, Serialize};

/// Event type tag emitted when an access request is activated.
pub const ACCESS_ACTIVATED_EVENT: &str = "AccessActivatedEvent";

/// Event type tag emitted when an access request is deactivated.
pub const ACCESS_DEACTIVATED_EVENT: &str = "AccessDeactivatedEvent";

/// One event from the catalog platform's event feed.
///
/// Event types outside the access lifecycle are delivered too and are
/// skipped by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEvent {
    /// Unique event identifier, used as the feed cursor.
    pub id: String,
    /// Event type tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Identifier of the resource the event refers to.
    pub subject_id: String,
}

/// An access request was approved and activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessActivatedEvent {
    /// Identifier of the activated access record.
    pub access_id: String,
}

/// An access request was deactivated or withdrawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDeactivatedEvent {
    /// Identifier of the deactivated access record.
    pub access_id: String,
}

//! Deterministic warehouse role naming.
//!
//! Role names are derived from free-form catalog identifiers by a
//! sanitization step that guarantees warehouse-legal identifiers. The
//! mapping is deterministic but not injective: two distinct catalog ids
//! can sanitize to the same role name. This is a known limitation and is
//! deliberately not guarded against, to keep external naming stable.

use crate::access::Access;
use crate::catalog::{DataProduct, Team};

/// Derives a warehouse-legal identifier from a free-form catalog id.
///
/// `-`, `.` and `/` become `_`; every remaining character outside
/// `[a-zA-Z0-9_]` is stripped.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .filter_map(|ch| match ch {
            '-' | '.' | '/' => Some('_'),
            ch if ch.is_ascii_alphanumeric() || ch == '_' => Some(ch),
            _ => None,
        })
        .collect()
}

/// Returns the warehouse role name representing an access record.
#[must_use]
pub fn access_role_name(access: &Access) -> String {
    match access.role_override() {
        Some(name) => name.to_owned(),
        None => format!("access_{}", sanitize_identifier(&access.id)),
    }
}

/// Returns the warehouse role name representing a consuming data product.
#[must_use]
pub fn data_product_role_name(data_product: &DataProduct) -> String {
    match data_product.role_override() {
        Some(name) => name.to_owned(),
        None => format!("dataproduct_{}", sanitize_identifier(&data_product.id)),
    }
}

/// Returns the warehouse role name representing a consuming team.
#[must_use]
pub fn team_role_name(team: &Team) -> String {
    match team.role_override() {
        Some(name) => name.to_owned(),
        None => format!("team_{}", sanitize_identifier(&team.id)),
    }
}

//! Email-based resolution of warehouse user names.

use std::collections::HashSet;

use frostline_core::ConnectorResult;
use tracing::warn;

use crate::warehouse_ports::UserDirectory;

/// Maps catalog email addresses to warehouse user names.
///
/// Matching is case-insensitive on the email address. Addresses without a
/// warehouse counterpart are logged and skipped, never an error. The user
/// directory is listed at most once, and not at all when every address is
/// blank.
pub(super) async fn resolve_usernames(
    directory: &dyn UserDirectory,
    email_addresses: &[String],
) -> ConnectorResult<Vec<String>> {
    let wanted: HashSet<String> = email_addresses
        .iter()
        .map(|address| address.trim().to_lowercase())
        .filter(|address| !address.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let users = directory.list_users().await?;
    let mut resolved = Vec::new();
    let mut matched: HashSet<String> = HashSet::new();
    for user in users {
        let Some(email) = user.email.as_deref() else {
            continue;
        };
        let email = email.trim().to_lowercase();
        if wanted.contains(&email) {
            matched.insert(email);
            resolved.push(user.name);
        }
    }

    for address in &wanted {
        if !matched.contains(address) {
            warn!(email = %address, "no warehouse user found for email address");
        }
    }

    Ok(resolved)
}

//! Data product, output port and team records from the catalog platform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Output port type tag handled by this connector.
pub const WAREHOUSE_OUTPUT_PORT_TYPE: &str = "warehouse";

/// Custom-property key holding an explicit warehouse role name override.
pub const ROLE_OVERRIDE_KEY: &str = "warehouseRole";

/// Catalog description of a shareable dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    /// Unique data product identifier.
    pub id: String,
    /// Exposed access points of the data product.
    #[serde(default)]
    pub output_ports: Vec<OutputPort>,
    /// Free-form custom properties; may carry a role name override.
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

/// A data product's exposed, typed access point to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPort {
    /// Unique output port identifier within the data product.
    pub id: String,
    /// Port type tag; only [`WAREHOUSE_OUTPUT_PORT_TYPE`] ports are handled.
    #[serde(rename = "type", default)]
    pub port_type: Option<String>,
    /// Server descriptor identifying the physical location, with at least
    /// `database` and `schema` keys for warehouse ports.
    #[serde(default)]
    pub server: Option<HashMap<String, String>>,
}

/// A named group of catalog users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique team identifier.
    pub id: String,
    /// Team member records.
    #[serde(default)]
    pub members: Vec<TeamMember>,
    /// Free-form custom properties; may carry a role name override.
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

/// A single team member record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Display name of the member.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address used to resolve a warehouse user identity.
    #[serde(default)]
    pub email_address: Option<String>,
}

impl DataProduct {
    /// Returns the output port with the given id, when present.
    #[must_use]
    pub fn output_port(&self, output_port_id: &str) -> Option<&OutputPort> {
        self.output_ports
            .iter()
            .find(|output_port| output_port.id == output_port_id)
    }

    /// Returns the explicit warehouse role name override, when present.
    #[must_use]
    pub fn role_override(&self) -> Option<&str> {
        self.custom.get(ROLE_OVERRIDE_KEY).map(String::as_str)
    }
}

impl OutputPort {
    /// Returns true when the port type tag marks a warehouse port.
    #[must_use]
    pub fn is_warehouse_port(&self) -> bool {
        self.port_type
            .as_deref()
            .is_some_and(|port_type| port_type.eq_ignore_ascii_case(WAREHOUSE_OUTPUT_PORT_TYPE))
    }

    /// Returns one field of the server descriptor, when present.
    #[must_use]
    pub fn server_field(&self, key: &str) -> Option<&str> {
        self.server
            .as_ref()
            .and_then(|server| server.get(key))
            .map(String::as_str)
    }
}

impl Team {
    /// Returns the email addresses of all members that carry one.
    #[must_use]
    pub fn member_email_addresses(&self) -> Vec<String> {
        self.members
            .iter()
            .filter_map(|member| member.email_address.clone())
            .collect()
    }

    /// Returns the explicit warehouse role name override, when present.
    #[must_use]
    pub fn role_override(&self) -> Option<&str> {
        self.custom.get(ROLE_OVERRIDE_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputPort, Team, TeamMember};
    use std::collections::HashMap;

    #[test]
    fn warehouse_port_check_is_case_insensitive() {
        let mut output_port = OutputPort {
            id: "op-1".to_owned(),
            port_type: Some("Warehouse".to_owned()),
            server: Some(HashMap::new()),
        };
        assert!(output_port.is_warehouse_port());

        output_port.port_type = Some("object-storage".to_owned());
        assert!(!output_port.is_warehouse_port());

        output_port.port_type = None;
        assert!(!output_port.is_warehouse_port());
    }

    #[test]
    fn member_emails_skip_members_without_one() {
        let team = Team {
            id: "team-9".to_owned(),
            members: vec![
                TeamMember {
                    name: Some("Alice".to_owned()),
                    email_address: Some("A@x.com".to_owned()),
                },
                TeamMember::default(),
            ],
            custom: HashMap::new(),
        };

        assert_eq!(team.member_email_addresses(), vec!["A@x.com".to_owned()]);
    }
}

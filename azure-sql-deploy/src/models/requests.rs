// Request models
//
// `DeploymentAnswers` drives the non-interactive run: every selection the user would make in the
// wizard, expressed by display label or identity.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DeployResult;
use crate::wizard::settings::DatabaseSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeploymentAnswers {
    /// Account display name or id. When absent the first account is kept.
    #[serde(default)]
    pub account: Option<String>,
    /// Subscription display label (`Name (id)`) or subscription id.
    #[serde(default)]
    pub subscription: Option<String>,
    /// Server name or full resource id.
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl DeploymentAnswers {
    pub fn from_toml_str(raw: &str) -> DeployResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> DeployResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_parse_with_database_section() {
        let raw = r#"
account = "Contoso Admin"
subscription = "Dev"
server = "srv1"

[database]
database_name = "orders"
firewall_rule_name = "office"
start_ip_address = "10.0.0.1"
end_ip_address = "10.0.0.20"
"#;
        let answers = DeploymentAnswers::from_toml_str(raw).unwrap();
        assert_eq!(answers.account.as_deref(), Some("Contoso Admin"));
        assert_eq!(answers.database.database_name, "orders");
        // Unspecified keys keep page defaults
        assert_eq!(answers.database.collation, "SQL_Latin1_General_CP1_CI_AS");
        assert!(answers.database.create_firewall_rule);
    }

    #[test]
    fn empty_answers_are_valid() {
        let answers = DeploymentAnswers::from_toml_str("").unwrap();
        assert!(answers.account.is_none());
        assert!(answers.server.is_none());
    }

    #[test]
    fn malformed_answers_are_rejected() {
        assert!(DeploymentAnswers::from_toml_str("account = ").is_err());
    }
}

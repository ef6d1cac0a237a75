// Database settings page
//
// Name, collation and the optional server firewall rule for the new database.

use serde::{Deserialize, Serialize};

use crate::utils::validation::{
    validate_collation, validate_database_name, validate_firewall_rule_name, validate_ip_range,
};

pub const DEFAULT_COLLATION: &str = "SQL_Latin1_General_CP1_CI_AS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub database_name: String,
    pub collation: String,
    pub create_firewall_rule: bool,
    pub firewall_rule_name: String,
    pub start_ip_address: String,
    pub end_ip_address: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            database_name: String::new(),
            collation: DEFAULT_COLLATION.to_string(),
            create_firewall_rule: true,
            firewall_rule_name: String::new(),
            start_ip_address: String::new(),
            end_ip_address: String::new(),
        }
    }
}

impl DatabaseSettings {
    /// Every rule violation, in page order.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Err(e) = validate_database_name(&self.database_name) {
            errors.push(e);
        }
        if let Err(e) = validate_collation(&self.collation) {
            errors.push(e);
        }
        if self.create_firewall_rule {
            if let Err(e) = validate_firewall_rule_name(&self.firewall_rule_name) {
                errors.push(e);
            }
            if let Err(e) = validate_ip_range(&self.start_ip_address, &self.end_ip_address) {
                errors.push(e);
            }
        }
        errors
    }

    pub fn name_taken_message(&self) -> String {
        format!(
            "A database named '{}' already exists on the selected server. Choose a different name.",
            self.database_name.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DatabaseSettings {
        DatabaseSettings {
            database_name: "orders".to_string(),
            firewall_rule_name: "office".to_string(),
            start_ip_address: "10.0.0.1".to_string(),
            end_ip_address: "10.0.0.20".to_string(),
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(valid().validate().is_empty());
    }

    #[test]
    fn firewall_fields_ignored_when_rule_disabled() {
        let settings = DatabaseSettings {
            create_firewall_rule: false,
            firewall_rule_name: String::new(),
            start_ip_address: "bogus".to_string(),
            ..valid()
        };
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn all_violations_reported_in_order() {
        let settings = DatabaseSettings {
            database_name: "tempdb".to_string(),
            collation: "bad-collation".to_string(),
            firewall_rule_name: "a;b".to_string(),
            start_ip_address: "10.0.0.9".to_string(),
            end_ip_address: "10.0.0.1".to_string(),
            create_firewall_rule: true,
        };
        let errors = settings.validate();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors[0].contains("reserved"));
        assert!(errors[1].contains("Collation"));
        assert!(errors[2].contains("Firewall rule name"));
        assert!(errors[3].contains("must not be greater"));
    }

    #[test]
    fn name_taken_message_names_database() {
        assert!(valid().name_taken_message().contains("'orders'"));
    }
}

// Input validation utilities
//
// Rules follow the Azure SQL naming constraints for databases and server firewall rules.
// Each function returns a user-facing message on failure.

use regex::Regex;
use std::sync::OnceLock;

const MAX_NAME_LEN: usize = 128;

/// Characters Azure rejects in database names.
const DATABASE_NAME_FORBIDDEN: &[char] = &['<', '>', '*', '%', '&', ':', '\\', '/', '?'];

/// Characters Azure rejects in firewall rule names.
const FIREWALL_NAME_FORBIDDEN: &[char] = &['<', '>', '*', '%', '&', ':', ';', '\\', '/', '?'];

const SYSTEM_DATABASES: &[&str] = &["master", "tempdb", "model", "msdb"];

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let octet = r"(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])";
        Regex::new(&format!(r"^{o}\.{o}\.{o}\.{o}$", o = octet))
            .unwrap_or_else(|e| panic!("static IPv4 regex is invalid: {}", e))
    })
}

fn collation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+$")
            .unwrap_or_else(|e| panic!("static collation regex is invalid: {}", e))
    })
}

/// Dotted-quad IPv4 without leading zeros.
pub fn is_valid_ipv4(value: &str) -> bool {
    ipv4_regex().is_match(value.trim())
}

fn ipv4_to_u32(value: &str) -> Option<u32> {
    if !is_valid_ipv4(value) {
        return None;
    }
    value
        .trim()
        .split('.')
        .try_fold(0u32, |acc, part| part.parse::<u8>().ok().map(|o| (acc << 8) | o as u32))
}

pub fn validate_ip_range(start: &str, end: &str) -> Result<(), String> {
    let Some(start_n) = ipv4_to_u32(start) else {
        return Err(format!("Start IP address '{}' is not a valid IPv4 address.", start.trim()));
    };
    let Some(end_n) = ipv4_to_u32(end) else {
        return Err(format!("End IP address '{}' is not a valid IPv4 address.", end.trim()));
    };
    if start_n > end_n {
        return Err("Start IP address must not be greater than the end IP address.".to_string());
    }
    Ok(())
}

pub fn validate_database_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Database name is required.".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Database name must be 128 characters or fewer.".to_string());
    }
    if name.chars().any(|c| DATABASE_NAME_FORBIDDEN.contains(&c) || c.is_control()) {
        return Err(
            "Database name cannot contain any of the characters < > * % & : \\ / ?".to_string(),
        );
    }
    if name.ends_with('.') || name.ends_with(' ') {
        return Err("Database name cannot end with a period or a space.".to_string());
    }
    if SYSTEM_DATABASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name.trim()))
    {
        return Err(format!("'{}' is a reserved database name.", name.trim()));
    }
    Ok(())
}

pub fn validate_firewall_rule_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Firewall rule name is required.".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Firewall rule name must be 128 characters or fewer.".to_string());
    }
    if name.chars().any(|c| FIREWALL_NAME_FORBIDDEN.contains(&c) || c.is_control()) {
        return Err(
            "Firewall rule name cannot contain any of the characters < > * % & : ; \\ / ?"
                .to_string(),
        );
    }
    Ok(())
}

pub fn validate_collation(collation: &str) -> Result<(), String> {
    let c = collation.trim();
    if c.is_empty() {
        return Err("Collation is required.".to_string());
    }
    if !collation_regex().is_match(c) {
        return Err(format!(
            "Collation '{}' may only contain letters, numbers, and underscores.",
            c
        ));
    }
    Ok(())
}

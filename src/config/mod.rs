pub mod auth;
pub mod database;
pub mod jwt;
pub mod rate_limit;
pub mod sla;

use std::env;

/// Reads a boolean switch such as `RATE_LIMIT_ENABLED=off`.
pub(crate) fn env_flag(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

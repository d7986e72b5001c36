use super::env_flag;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Two route groups are throttled separately: the unauthenticated
/// login/register endpoints and everything behind the auth gate.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub api: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            api: RateLimitRule::new(20, 40),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = env_flag("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_overrides(&raw) {
                Ok((auth, api)) => {
                    cfg.auth = auth.unwrap_or(cfg.auth);
                    cfg.api = api.unwrap_or(cfg.api);
                }
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }
}

type Overrides = (Option<RateLimitRule>, Option<RateLimitRule>);

/// Accepts `"10:20"` (both groups) or `"auth=5:10,api=20:40"`.
fn parse_overrides(raw: &str) -> Result<Overrides, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        let rule = parse_rule(trimmed)?;
        return Ok((Some(rule), Some(rule)));
    }

    let (mut auth, mut api) = (None, None);
    for item in trimmed.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, raw_rule) = item
            .split_once('=')
            .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
        let rule = parse_rule(raw_rule.trim())?;
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => auth = Some(rule),
            "api" | "protected" => api = Some(rule),
            other => return Err(format!("unknown group '{}', expected auth/api", other)),
        }
    }

    Ok((auth, api))
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rule_applies_to_both_groups() {
        let (auth, api) = parse_overrides("12:24").unwrap();
        assert_eq!(auth, Some(RateLimitRule::new(12, 24)));
        assert_eq!(api, Some(RateLimitRule::new(12, 24)));
    }

    #[test]
    fn grouped_rules() {
        let (auth, api) = parse_overrides("auth=1:2, api=5:6").unwrap();
        assert_eq!(auth, Some(RateLimitRule::new(1, 2)));
        assert_eq!(api, Some(RateLimitRule::new(5, 6)));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = parse_overrides("public=3:4").unwrap_err();
        assert!(err.contains("unknown group"));
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert!(parse_overrides("0:10").is_err());
    }
}

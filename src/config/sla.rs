use crate::models::TicketPriority;
use std::collections::BTreeMap;
use std::env;

/// Target resolution time per priority, in hours. Read once at startup; there
/// is no API to edit it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlaPolicy {
    targets: BTreeMap<TicketPriority, f64>,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::new([
            (TicketPriority::High, 4.0),
            (TicketPriority::Medium, 8.0),
            (TicketPriority::Low, 24.0),
        ])
    }
}

impl SlaPolicy {
    pub fn new(targets: impl IntoIterator<Item = (TicketPriority, f64)>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    /// `SLA_HIGH_HOURS`, `SLA_MEDIUM_HOURS`, `SLA_LOW_HOURS`. `off`, `none`
    /// or a non-positive number drops the target for that priority.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut targets = BTreeMap::new();

        for (priority, default_hours) in defaults.targets {
            let var = format!("SLA_{}_HOURS", priority.as_str());
            match env::var(&var) {
                Ok(raw) => match parse_target(&raw) {
                    Ok(Some(hours)) => {
                        targets.insert(priority, hours);
                    }
                    Ok(None) => {}
                    Err(()) => {
                        tracing::warn!("Invalid {} '{}', using {}h", var, raw, default_hours);
                        targets.insert(priority, default_hours);
                    }
                },
                Err(_) => {
                    targets.insert(priority, default_hours);
                }
            }
        }

        Self { targets }
    }

    pub fn target_hours(&self, priority: TicketPriority) -> Option<f64> {
        self.targets.get(&priority).copied()
    }

    pub fn thresholds(&self) -> &BTreeMap<TicketPriority, f64> {
        &self.targets
    }
}

fn parse_target(raw: &str) -> Result<Option<f64>, ()> {
    let trimmed = raw.trim();
    if matches!(trimmed.to_ascii_lowercase().as_str(), "off" | "none" | "") {
        return Ok(None);
    }
    let hours: f64 = trimmed.parse().map_err(|_| ())?;
    if !hours.is_finite() {
        return Err(());
    }
    Ok((hours > 0.0).then_some(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets() {
        let policy = SlaPolicy::default();
        assert_eq!(policy.target_hours(TicketPriority::High), Some(4.0));
        assert_eq!(policy.target_hours(TicketPriority::Medium), Some(8.0));
        assert_eq!(policy.target_hours(TicketPriority::Low), Some(24.0));
    }

    #[test]
    fn parse_target_values() {
        assert_eq!(parse_target("12"), Ok(Some(12.0)));
        assert_eq!(parse_target("1.5"), Ok(Some(1.5)));
        assert_eq!(parse_target("off"), Ok(None));
        assert_eq!(parse_target("0"), Ok(None));
        assert_eq!(parse_target("-3"), Ok(None));
        assert_eq!(parse_target("soon"), Err(()));
    }

    #[test]
    fn empty_policy_has_no_targets() {
        let policy = SlaPolicy::new([]);
        assert_eq!(policy.target_hours(TicketPriority::High), None);
        assert!(policy.thresholds().is_empty());
    }
}

//! Configuration types for the leave policy.
//!
//! This module contains the strongly-typed policy structure that is
//! deserialized from a YAML file. There is no global settings lookup:
//! the policy is constructed once and passed into every component.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// How a December closing balance treats the year boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearBoundaryPolicy {
    /// January always opens with zero carry-forward (no cross-year carry).
    #[default]
    Reset,
    /// December's closing balance carries into January like any other month.
    Carry,
}

/// Retry settings for the transactional executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum number of attempts before a conflict becomes terminal.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds; doubles per retry.
    pub base_delay_ms: u64,
    /// Upper bound on the backoff delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 10,
            max_delay_ms: 500,
        }
    }
}

impl RetrySettings {
    /// The backoff delay before retrying after the given failed attempt
    /// (1-based): `base * 2^(attempt-1)`, capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let millis = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(millis.min(self.max_delay_ms))
    }
}

/// The complete leave policy for the engine.
///
/// # Example
///
/// ```
/// use leave_ledger::config::LeavePolicy;
/// use rust_decimal::Decimal;
///
/// let policy = LeavePolicy::default();
/// // 24 days a year is 2 days a month.
/// assert_eq!(policy.monthly_allocation("anywhere"), Decimal::from(2));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeavePolicy {
    /// Default yearly leave grant, in days.
    pub yearly_allocation: Decimal,
    /// Per-location yearly grants; override the default where present.
    pub location_overrides: HashMap<String, Decimal>,
    /// Leave-equivalent cost of a half-day, normally 0.5.
    pub half_day_weight: Decimal,
    /// When true, marking a half-day is rejected if the balance cannot
    /// cover the half-day weight. When false (the default), half-days are
    /// always allowed; the balance is still debited but floors at zero.
    pub half_day_requires_balance: bool,
    /// Whether December's closing balance crosses into January.
    pub year_boundary: YearBoundaryPolicy,
    /// Retry settings for the transactional executor.
    pub retry: RetrySettings,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            yearly_allocation: Decimal::from(24),
            location_overrides: HashMap::new(),
            half_day_weight: Decimal::new(5, 1),
            half_day_requires_balance: false,
            year_boundary: YearBoundaryPolicy::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl LeavePolicy {
    /// The yearly grant in effect for a location: the location override if
    /// one exists, the global default otherwise.
    pub fn yearly_allocation_for(&self, location_id: &str) -> Decimal {
        self.location_overrides
            .get(location_id)
            .copied()
            .unwrap_or(self.yearly_allocation)
    }

    /// The monthly grant for a location: the yearly grant divided by 12.
    pub fn monthly_allocation(&self, location_id: &str) -> Decimal {
        self.yearly_allocation_for(location_id) / Decimal::from(12)
    }

    /// Returns true if a carry-forward landing in `month` must be zeroed
    /// (January under the [`YearBoundaryPolicy::Reset`] policy).
    pub fn resets_carry_into(&self, month: u32) -> bool {
        month == 1 && self.year_boundary == YearBoundaryPolicy::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_policy_values() {
        let policy = LeavePolicy::default();
        assert_eq!(policy.yearly_allocation, dec("24"));
        assert_eq!(policy.half_day_weight, dec("0.5"));
        assert!(!policy.half_day_requires_balance);
        assert_eq!(policy.year_boundary, YearBoundaryPolicy::Reset);
    }

    #[test]
    fn test_monthly_allocation_divides_by_twelve() {
        let policy = LeavePolicy::default();
        assert_eq!(policy.monthly_allocation("loc_01"), dec("2"));
    }

    #[test]
    fn test_location_override_takes_precedence() {
        let mut policy = LeavePolicy::default();
        policy
            .location_overrides
            .insert("loc_hq".to_string(), dec("36"));
        assert_eq!(policy.monthly_allocation("loc_hq"), dec("3"));
        assert_eq!(policy.monthly_allocation("loc_01"), dec("2"));
    }

    #[test]
    fn test_reset_policy_zeroes_january_carry() {
        let policy = LeavePolicy::default();
        assert!(policy.resets_carry_into(1));
        assert!(!policy.resets_carry_into(2));

        let carry = LeavePolicy {
            year_boundary: YearBoundaryPolicy::Carry,
            ..LeavePolicy::default()
        };
        assert!(!carry.resets_carry_into(1));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetrySettings {
            max_attempts: 5,
            base_delay_ms: 10,
            max_delay_ms: 50,
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(10));
        assert_eq!(retry.delay_for(2), Duration::from_millis(20));
        assert_eq!(retry.delay_for(3), Duration::from_millis(40));
        assert_eq!(retry.delay_for(4), Duration::from_millis(50));
        assert_eq!(retry.delay_for(10), Duration::from_millis(50));
    }

    #[test]
    fn test_deserialize_partial_yaml_uses_defaults() {
        let yaml = "yearly_allocation: \"30\"\nhalf_day_requires_balance: true\n";
        let policy: LeavePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.yearly_allocation, dec("30"));
        assert!(policy.half_day_requires_balance);
        assert_eq!(policy.half_day_weight, dec("0.5"));
        assert_eq!(policy.retry, RetrySettings::default());
    }

    #[test]
    fn test_deserialize_year_boundary_variants() {
        let policy: LeavePolicy = serde_yaml::from_str("year_boundary: carry\n").unwrap();
        assert_eq!(policy.year_boundary, YearBoundaryPolicy::Carry);
    }
}

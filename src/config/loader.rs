//! Policy loading functionality.
//!
//! This module provides the [`PolicyLoader`] type for loading a leave
//! policy from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};

use super::types::LeavePolicy;

/// Loads and provides access to the leave policy.
///
/// # File format
///
/// ```text
/// yearly_allocation: "24"
/// location_overrides:
///   loc_hq: "36"
/// half_day_weight: "0.5"
/// half_day_requires_balance: false
/// year_boundary: reset
/// retry:
///   max_attempts: 5
///   base_delay_ms: 10
///   max_delay_ms: 500
/// ```
///
/// Every field is optional; omitted fields take their defaults.
///
/// # Example
///
/// ```no_run
/// use leave_ledger::config::PolicyLoader;
///
/// let loader = PolicyLoader::load("./config/policy.yaml").unwrap();
/// println!("yearly allocation: {}", loader.policy().yearly_allocation);
/// ```
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy: LeavePolicy,
}

impl PolicyLoader {
    /// Loads the policy from the specified YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ConfigNotFound`] if the file does not exist
    /// and [`LedgerError::ConfigParseError`] if it contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let policy =
            serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
                path: path_str,
                message: e.to_string(),
            })?;

        Ok(Self { policy })
    }

    /// Returns the loaded policy.
    pub fn policy(&self) -> &LeavePolicy {
        &self.policy
    }

    /// Consumes the loader, returning the policy.
    pub fn into_policy(self) -> LeavePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn write_temp_policy(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("policy-{}.yaml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_missing_file_is_config_not_found() {
        let result = PolicyLoader::load("/definitely/missing/policy.yaml");
        assert!(matches!(result, Err(LedgerError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_invalid_yaml_is_parse_error() {
        let path = write_temp_policy("yearly_allocation: [not, a, decimal\n");
        let result = PolicyLoader::load(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(LedgerError::ConfigParseError { .. })));
    }

    #[test]
    fn test_load_full_policy_file() {
        let path = write_temp_policy(
            "yearly_allocation: \"30\"\n\
             location_overrides:\n\
             \x20 loc_hq: \"36\"\n\
             half_day_weight: \"0.5\"\n\
             half_day_requires_balance: true\n\
             year_boundary: reset\n\
             retry:\n\
             \x20 max_attempts: 3\n",
        );
        let loader = PolicyLoader::load(&path).unwrap();
        fs::remove_file(&path).ok();

        let policy = loader.policy();
        assert_eq!(policy.yearly_allocation, Decimal::from_str("30").unwrap());
        assert_eq!(
            policy.yearly_allocation_for("loc_hq"),
            Decimal::from_str("36").unwrap()
        );
        assert!(policy.half_day_requires_balance);
        assert_eq!(policy.retry.max_attempts, 3);
    }

    #[test]
    fn test_empty_file_loads_defaults() {
        let path = write_temp_policy("{}\n");
        let loader = PolicyLoader::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(
            loader.into_policy().yearly_allocation,
            Decimal::from_str("24").unwrap()
        );
    }
}

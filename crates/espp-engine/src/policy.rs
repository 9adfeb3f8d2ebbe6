//! Tax Rate Policy
//!
//! The rates every disposition formula is evaluated against. Kept as a value
//! object so a change in tax law is a configuration change.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ENV_ORDINARY_INCOME_RATE: &str = "ESPP_ORDINARY_INCOME_RATE";
pub const ENV_LTCG_RATE: &str = "ESPP_LTCG_RATE";
pub const ENV_PLAN_DISCOUNT: &str = "ESPP_PLAN_DISCOUNT";

/// Rates applied by the disposition engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFields")]
pub struct TaxRatePolicy {
    /// Marginal rate on ordinary income; short-term gains are taxed here too
    pub ordinary_income_rate: f64,
    /// Long-term capital gains rate
    pub long_term_capital_gains_rate: f64,
    /// Discount the plan grants off the offering price (e.g., 0.15 = 15%)
    pub plan_discount: f64,
}

/// Unchecked rates as they appear on the wire
#[derive(Deserialize)]
struct PolicyFields {
    ordinary_income_rate: f64,
    long_term_capital_gains_rate: f64,
    plan_discount: f64,
}

impl TryFrom<PolicyFields> for TaxRatePolicy {
    type Error = PolicyError;

    fn try_from(fields: PolicyFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.ordinary_income_rate,
            fields.long_term_capital_gains_rate,
            fields.plan_discount,
        )
    }
}

impl Default for TaxRatePolicy {
    fn default() -> Self {
        Self {
            ordinary_income_rate: 0.24,
            long_term_capital_gains_rate: 0.15,
            plan_discount: 0.15,
        }
    }
}

impl TaxRatePolicy {
    pub fn new(
        ordinary_income_rate: f64,
        long_term_capital_gains_rate: f64,
        plan_discount: f64,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            ordinary_income_rate,
            long_term_capital_gains_rate,
            plan_discount,
        };
        policy.validate()?;

        Ok(policy)
    }

    /// Every rate must be a finite fraction in `[0, 1]`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let rates = [
            ("ordinary_income_rate", self.ordinary_income_rate),
            ("long_term_capital_gains_rate", self.long_term_capital_gains_rate),
            ("plan_discount", self.plan_discount),
        ];

        for (name, rate) in rates {
            check_rate(name, rate)?;
        }

        Ok(())
    }

    pub fn from_env() -> Result<Self, PolicyError> {
        Self::from_env_map(std::env::vars().collect())
    }

    /// Build a policy from environment-style variables. Unset variables keep
    /// their default rate. Errors name the offending variable.
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, PolicyError> {
        let defaults = Self::default();

        let ordinary_income_rate = parse_rate(
            &env_map,
            ENV_ORDINARY_INCOME_RATE,
            defaults.ordinary_income_rate,
        )?;
        let long_term_capital_gains_rate =
            parse_rate(&env_map, ENV_LTCG_RATE, defaults.long_term_capital_gains_rate)?;
        let plan_discount = parse_rate(&env_map, ENV_PLAN_DISCOUNT, defaults.plan_discount)?;

        Ok(Self {
            ordinary_income_rate,
            long_term_capital_gains_rate,
            plan_discount,
        })
    }
}

fn check_rate(name: &str, rate: f64) -> Result<f64, PolicyError> {
    if rate.is_finite() && (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(PolicyError::InvalidValue(
            name.to_string(),
            format!("must be between 0 and 1, got {}", rate),
        ))
    }
}

fn parse_rate(
    env_map: &HashMap<String, String>,
    key: &str,
    default: f64,
) -> Result<f64, PolicyError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    let rate = raw.trim().parse::<f64>().map_err(|_| {
        PolicyError::InvalidValue(key.to_string(), format!("must be a number, got {}", raw))
    })?;

    check_rate(key, rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_rates() {
        let policy = TaxRatePolicy::default();
        assert_eq!(policy.ordinary_income_rate, 0.24);
        assert_eq!(policy.long_term_capital_gains_rate, 0.15);
        assert_eq!(policy.plan_discount, 0.15);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(TaxRatePolicy::new(1.5, 0.15, 0.15).is_err());
        assert!(TaxRatePolicy::new(0.24, -0.01, 0.15).is_err());
        assert!(TaxRatePolicy::new(0.24, 0.15, f64::NAN).is_err());
        assert!(TaxRatePolicy::new(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_from_env_map_defaults_when_unset() {
        let policy = TaxRatePolicy::from_env_map(HashMap::new()).unwrap();
        assert_eq!(policy, TaxRatePolicy::default());
    }

    #[test]
    fn test_from_env_map_overrides() {
        let policy = TaxRatePolicy::from_env_map(env(&[
            (ENV_ORDINARY_INCOME_RATE, "0.32"),
            (ENV_LTCG_RATE, " 0.20 "),
        ]))
        .unwrap();

        assert_eq!(policy.ordinary_income_rate, 0.32);
        assert_eq!(policy.long_term_capital_gains_rate, 0.20);
        assert_eq!(policy.plan_discount, 0.15);
    }

    #[test]
    fn test_from_env_map_rejects_bad_values() {
        let err =
            TaxRatePolicy::from_env_map(env(&[(ENV_PLAN_DISCOUNT, "fifteen")])).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidValue(ref key, _) if key == ENV_PLAN_DISCOUNT));

        let err = TaxRatePolicy::from_env_map(env(&[(ENV_LTCG_RATE, "2")])).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidValue(ref key, _) if key == ENV_LTCG_RATE));

        let err =
            TaxRatePolicy::from_env_map(env(&[(ENV_ORDINARY_INCOME_RATE, "NaN")])).unwrap_err();
        assert!(
            matches!(err, PolicyError::InvalidValue(ref key, _) if key == ENV_ORDINARY_INCOME_RATE)
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let policy: TaxRatePolicy = serde_json::from_str(
            r#"{"ordinary_income_rate":0.22,
                "long_term_capital_gains_rate":0.15,
                "plan_discount":0.10}"#,
        )
        .unwrap();
        assert_eq!(policy.plan_discount, 0.10);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let result = serde_json::from_str::<TaxRatePolicy>(
            r#"{"ordinary_income_rate":1.5,
                "long_term_capital_gains_rate":0.15,
                "plan_discount":0.10}"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("ordinary_income_rate"), "{}", err);
    }
}

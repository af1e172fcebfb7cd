//! YAML generation profile for the generate command.
//!
//! A profile overrides the built-in defaults; CLI flags override the
//! profile. All fields are optional.

use crate::generator::GeneratorConfig;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Generation profile loaded from a YAML file.
///
/// ```yaml
/// customers: 20000
/// sellers: 1000
/// orders: 50000
/// seed: 7
/// workers: 8
/// horizon: 2025-06-30
/// items_per_order: { min: 1, max: 5 }
/// freight_ratio: { min: 0.09, max: 0.35 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// Number of customers to generate.
    pub customers: Option<usize>,
    /// Number of sellers to generate.
    pub sellers: Option<usize>,
    /// Number of orders to generate.
    pub orders: Option<usize>,
    /// Random seed.
    pub seed: Option<u64>,
    /// Worker threads for order generation.
    pub workers: Option<usize>,
    /// Latest customer signup date.
    pub customer_signup_cutoff: Option<NaiveDate>,
    /// Latest seller signup date.
    pub seller_signup_cutoff: Option<NaiveDate>,
    /// Latest purchase date.
    pub horizon: Option<NaiveDate>,
    /// Items per order bounds.
    pub items_per_order: Option<Bounds<u32>>,
    /// Freight value as a fraction of item price.
    pub freight_ratio: Option<Bounds<f64>>,
}

/// Inclusive min/max bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl Profile {
    /// Load a profile from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        let profile: Profile = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("failed to parse profile: {}", path.display()))?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(b) = &self.items_per_order {
            if b.min == 0 || b.min > b.max {
                anyhow::bail!("items_per_order bounds invalid: min {} max {}", b.min, b.max);
            }
        }
        if let Some(b) = &self.freight_ratio {
            if b.min < 0.0 || b.min >= b.max {
                anyhow::bail!("freight_ratio bounds invalid: min {} max {}", b.min, b.max);
            }
        }
        Ok(())
    }

    /// Apply the profile on top of a config, leaving unset fields alone.
    pub fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(n) = self.customers {
            config.customers = n;
        }
        if let Some(n) = self.sellers {
            config.sellers = n;
        }
        if let Some(n) = self.orders {
            config.orders = n;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(d) = self.customer_signup_cutoff {
            config.customer_signup_cutoff = d;
        }
        if let Some(d) = self.seller_signup_cutoff {
            config.seller_signup_cutoff = d;
        }
        if let Some(d) = self.horizon {
            config.horizon = d;
        }
        if let Some(b) = self.items_per_order {
            config.min_items_per_order = b.min;
            config.max_items_per_order = b.max;
        }
        if let Some(b) = self.freight_ratio {
            config.min_freight_ratio = b.min;
            config.max_freight_ratio = b.max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_changes_nothing() {
        let mut config = GeneratorConfig::default();
        let before = config.clone();
        Profile::default().apply(&mut config);
        assert_eq!(config.customers, before.customers);
        assert_eq!(config.seed, before.seed);
    }

    #[test]
    fn test_profile_overrides_defaults() {
        let yaml = "customers: 100\nseed: 9\nitems_per_order: { min: 2, max: 3 }\n";
        let profile: Profile = serde_yaml_ng::from_str(yaml).unwrap();
        let mut config = GeneratorConfig::default();
        profile.apply(&mut config);
        assert_eq!(config.customers, 100);
        assert_eq!(config.seed, 9);
        assert_eq!(config.min_items_per_order, 2);
        assert_eq!(config.max_items_per_order, 3);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "locale: en_US\n";
        assert!(serde_yaml_ng::from_str::<Profile>(yaml).is_err());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let profile: Profile =
            serde_yaml_ng::from_str("items_per_order: { min: 5, max: 1 }\n").unwrap();
        assert!(profile.validate().is_err());
    }
}

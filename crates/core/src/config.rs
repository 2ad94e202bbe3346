use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::class::AccountingClass;
use crate::period::{Epoch, YearMonth};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse audit config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid approval-exemption pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("epoch month out of range: {0}")]
    InvalidEpoch(u32),
}

/// Everything the orchestrators and checks need that is not ledger data.
/// Built once by the caller and passed by reference; no ambient globals.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    epoch_year: i32,
    epoch_month: u32,
    /// Minimum similarity for the labeled-amount matcher.
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f32,
    /// Payments whose subject matches any of these need no board approval.
    #[serde(default)]
    pub approval_exempt_patterns: Vec<String>,
    /// Closing balances carried over from the old bookkeeping regime,
    /// used in place of prior-period data at the epoch start.
    #[serde(default)]
    pub epoch_carryover: EpochCarryover,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpochCarryover {
    pub management: Option<i64>,
    pub reserve: Option<i64>,
    pub parking: Option<i64>,
    pub neighborhood: Option<i64>,
}

fn default_fuzzy_cutoff() -> f32 {
    0.4
}

impl AuditConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AuditConfig = toml::from_str(content)?;
        if YearMonth::new(config.epoch_year, config.epoch_month).is_none() {
            return Err(ConfigError::InvalidEpoch(config.epoch_month));
        }
        Ok(config)
    }

    pub fn epoch(&self) -> Epoch {
        // Range-checked in from_toml.
        Epoch(YearMonth { year: self.epoch_year, month: self.epoch_month })
    }

    pub fn carryover_for(&self, class: AccountingClass) -> Option<i64> {
        match class {
            AccountingClass::Management => self.epoch_carryover.management,
            AccountingClass::Reserve => self.epoch_carryover.reserve,
            AccountingClass::Parking => self.epoch_carryover.parking,
            AccountingClass::Neighborhood => self.epoch_carryover.neighborhood,
        }
    }

    /// Compiles the exemption patterns; a bad pattern is an operator
    /// error surfaced eagerly, not skipped.
    pub fn exempt_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.approval_exempt_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }
}

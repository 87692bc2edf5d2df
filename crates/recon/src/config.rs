//! Run configuration.
//!
//! A run is described declaratively in TOML: the enrollment ledger, the
//! carriers with their parse strategy and statement documents, and the
//! variance tolerance. Configs are validated once at load and never
//! mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ReconError;

/// Top-level reconciliation config, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    /// Display name for the run.
    pub name: String,
    /// Enrollment ledger CSV, relative to the config file.
    pub enrollment_file: String,
    /// Carrier code to carrier settings. Codes also key the enrollment
    /// ledger's carrier column.
    pub carriers: BTreeMap<String, CarrierConfig>,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarrierConfig {
    /// Human-readable carrier name used in reports.
    pub name: String,
    /// Parse strategy for this carrier's statements.
    pub kind: CarrierKind,
    /// Text identifying the commission table among a document's chunks.
    pub table_marker: String,
    /// Statement documents to load, relative to the config file.
    #[serde(default)]
    pub documents: Vec<String>,
    /// Fixed statement date; inferred from the records when omitted.
    #[serde(default)]
    pub statement_date: Option<NaiveDate>,
    /// Group payouts to split into known per-member amounts.
    #[serde(default)]
    pub fanout: Vec<FanoutGroup>,
}

/// How a carrier's statement tables are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    /// Header row mapped to canonical fields by similarity scoring.
    Standard,
    /// Statement opens with a title row; columns are positional.
    TitleRow,
    /// Member identity lives in text blocks above each table.
    AnchorBlocks,
}

impl fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CarrierKind::Standard => "standard",
            CarrierKind::TitleRow => "title_row",
            CarrierKind::AnchorBlocks => "anchor_blocks",
        };
        f.write_str(s)
    }
}

/// A group identifier whose single statement line is really a bundle of
/// individual members with known amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct FanoutGroup {
    pub group_id: String,
    pub members: Vec<FanoutMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FanoutMember {
    pub policy_id: String,
    pub amount_cents: i64,
}

/// Variance floors below which a payment difference is not flagged.
/// Both must be exceeded strictly.
#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    /// Absolute variance floor in cents.
    #[serde(default = "default_tolerance_cents")]
    pub amount_cents: i64,
    /// Percentage variance floor.
    #[serde(default = "default_tolerance_percentage")]
    pub percentage: f64,
}

fn default_tolerance_cents() -> i64 {
    1000
}

fn default_tolerance_percentage() -> f64 {
    5.0
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        ToleranceConfig {
            amount_cents: default_tolerance_cents(),
            percentage: default_tolerance_percentage(),
        }
    }
}

impl ReconConfig {
    pub fn from_toml(s: &str) -> Result<ReconConfig, ReconError> {
        let config: ReconConfig =
            toml::from_str(s).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ReconError> {
        if self.enrollment_file.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "enrollment_file must not be empty".to_string(),
            ));
        }
        if self.carriers.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one carrier is required".to_string(),
            ));
        }
        if self.tolerance.amount_cents <= 0 {
            return Err(ReconError::ConfigValidation(
                "tolerance.amount_cents must be positive".to_string(),
            ));
        }
        if self.tolerance.percentage < 0.0 {
            return Err(ReconError::ConfigValidation(
                "tolerance.percentage must not be negative".to_string(),
            ));
        }
        for (code, carrier) in &self.carriers {
            if carrier.table_marker.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "carrier '{code}': table_marker must not be empty"
                )));
            }
            for group in &carrier.fanout {
                if group.group_id.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "carrier '{code}': fanout group_id must not be empty"
                    )));
                }
                if group.members.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "carrier '{code}': fanout group '{}' has no members",
                        group.group_id
                    )));
                }
                for member in &group.members {
                    if member.amount_cents <= 0 {
                        return Err(ReconError::ConfigValidation(format!(
                            "carrier '{code}': fanout member '{}' amount must be positive",
                            member.policy_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

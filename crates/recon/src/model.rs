//! Core data model for commission reconciliation.
//!
//! Every stage of the pipeline consumes the previous stage's output and
//! produces a new value; nothing here is mutated after construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::document::Document;
use crate::money::Money;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One commission line extracted from a carrier statement.
///
/// `member_id`, `effective_date` and `payout` are always populated; the rest
/// depend on what the statement's table actually carried. `effective_date`
/// keeps the carrier's own text form, date parsing happens at match time.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionRecord {
    pub carrier: String,
    pub source_document: String,
    pub member_id: String,
    pub effective_date: String,
    pub payout: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Money>,
    /// Audit note left by the identifier normalizer when it rewrote or
    /// fanned out this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalization_note: Option<String>,
}

/// One row of the enrollment ledger, the system of record for what each
/// subscriber should earn per statement period.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentRecord {
    pub policy_id: String,
    pub carrier: String,
    pub member_name: String,
    pub plan_name: String,
    pub effective_date: String,
    pub statement_date: NaiveDate,
    pub status: String,
    pub commission_type: String,
    pub expected_commission: Money,
}

/// A decoded extraction response together with the file it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub source: String,
    pub document: Document,
}

/// Everything a reconciliation run needs, pre-loaded by the caller.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    /// Carrier code to the documents fetched for that carrier.
    pub documents: BTreeMap<String, Vec<SourceDocument>>,
    pub enrollment: Vec<EnrollmentRecord>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A statement row that could not be turned into a record.
///
/// Label echoes and subtotal lines are dropped silently; this type is for
/// rows that looked like data but failed to parse.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub source_document: String,
    pub row: usize,
    pub reason: String,
}

/// Result of parsing one document: the records it yielded plus every row
/// that was skipped with a reason.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub records: Vec<CommissionRecord>,
    pub skipped: Vec<SkippedRow>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// A commission record paired with the enrollment row it matched.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedEntry {
    pub commission: CommissionRecord,
    pub enrollment: EnrollmentRecord,
    pub match_basis: String,
}

/// A commission record with no enrollment counterpart for the period.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedEntry {
    pub commission: CommissionRecord,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Variances and discrepancies
// ---------------------------------------------------------------------------

/// Expected-versus-actual totals for one enrolled subscriber.
///
/// Every enrolled subscriber for the period gets exactly one entry, even
/// when no statement money arrived: `actual_commission` is then 0.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberVariance {
    pub policy_id: String,
    pub member_name: String,
    pub actual_commission: Money,
    pub expected_commission: Money,
    pub variance_amount: Money,
    pub variance_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    Overpayment,
    Underpayment,
    Duplicate,
    Outlier,
    ZeroOrNegative,
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscrepancyKind::Overpayment => "overpayment",
            DiscrepancyKind::Underpayment => "underpayment",
            DiscrepancyKind::Duplicate => "duplicate",
            DiscrepancyKind::Outlier => "outlier",
            DiscrepancyKind::ZeroOrNegative => "zero_or_negative",
        };
        f.write_str(s)
    }
}

/// One flagged anomaly with a human-readable reason.
#[derive(Debug, Clone, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub policy_id: String,
    /// Variance amount for payment discrepancies, the payout itself for
    /// outliers and zero/negative entries, the summed total for duplicates.
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Per-carrier results
// ---------------------------------------------------------------------------

/// Extraction and match counts for one carrier run.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierSummary {
    pub total_extracted: usize,
    pub total_matched: usize,
    pub total_unmatched: usize,
    pub match_percentage: f64,
    pub total_commission: Money,
    pub matched_commission: Money,
    pub unmatched_commission: Money,
}

/// Money totals over the enrolled population for the period.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierTotals {
    pub actual_commissions: Money,
    pub expected_commissions: Money,
    pub variance_amount: Money,
    pub variance_percentage: f64,
}

/// Full reconciliation output for one carrier.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub carrier: String,
    pub carrier_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_date: Option<NaiveDate>,
    pub summary: CarrierSummary,
    pub totals: CarrierTotals,
    pub subscriber_variances: Vec<SubscriberVariance>,
    pub matched: Vec<MatchedEntry>,
    pub unmatched: Vec<UnmatchedEntry>,
    pub discrepancies: Vec<Discrepancy>,
    pub skipped_rows: Vec<SkippedRow>,
    /// Set when the run could not reconcile at all, e.g. no enrollment rows
    /// exist for the statement period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Enrollment rows available for this carrier before period filtering.
    pub enrollment_records_available: usize,
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// One carrier's share of the portfolio total.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierShare {
    pub amount: Money,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopCarrier {
    pub carrier: String,
    pub amount: Money,
}

/// Commission growth between the two most recent statement periods.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodGrowth {
    pub previous_period: NaiveDate,
    pub current_period: NaiveDate,
    pub previous_total: Money,
    pub current_total: Money,
    /// Fractional growth: 0.25 means 25% up on the previous period.
    pub growth_rate: f64,
}

/// Cross-carrier rollup over one run's per-carrier results.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub total_all_carriers: Money,
    pub carrier_breakdown: BTreeMap<String, CarrierShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_performing_carrier: Option<TopCarrier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_growth: Option<PeriodGrowth>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Top-level result of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: RunMeta,
    pub carriers: BTreeMap<String, ReconciliationResult>,
    pub portfolio: PortfolioSummary,
}

//! Reconciliation engine.
//!
//! Matching is deliberately exact: a commission record matches an
//! enrollment row only when the member id is identical and the record's
//! date equals the statement date to the day. Anything fuzzier belongs
//! in normalization, before matching, where it leaves an audit note.
//!
//! Variance analysis runs over the enrolled population rather than the
//! statement, so a subscriber the carrier silently dropped still shows
//! up, with an actual of zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::aggregate::aggregate_portfolio;
use crate::config::{CarrierConfig, ReconConfig, ToleranceConfig};
use crate::error::ReconError;
use crate::model::{
    CarrierSummary, CarrierTotals, CommissionRecord, Discrepancy, DiscrepancyKind,
    EnrollmentRecord, MatchedEntry, ParseOutcome, ReconInput, ReconReport, ReconciliationResult,
    RunMeta, SkippedRow, SubscriberVariance, UnmatchedEntry,
};
use crate::money::Money;
use crate::normalize::normalize_records;
use crate::parser::parse_document;

/// Recorded on every matched entry.
pub const MATCH_BASIS: &str = "exact member_id and statement_date match";
/// Recorded on every unmatched entry.
pub const NO_MATCH_REASON: &str = "no exact enrollment match";
/// Result condition when the ledger has no rows for the period.
pub const NO_ENROLLMENT_CONDITION: &str = "no enrollment data for statement period";

/// Date forms carriers actually print. The two-digit form must come
/// before `%Y`, which accepts 1-4 digits and would read "25" as year 25.
const DATE_FORMATS: [&str; 3] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// Run the whole pipeline: parse, normalize, reconcile per carrier, then
/// roll the portfolio up. Carrier documents for a code the config does
/// not know are an error; a configured carrier with no documents is not.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconReport, ReconError> {
    for code in input.documents.keys() {
        if !config.carriers.contains_key(code) {
            return Err(ReconError::UnknownCarrier(code.clone()));
        }
    }

    let mut carriers = BTreeMap::new();
    for (code, carrier) in &config.carriers {
        let docs = input.documents.get(code).map(Vec::as_slice).unwrap_or(&[]);
        let mut outcome = ParseOutcome::default();
        for doc in docs {
            let one = parse_document(&doc.document, code, carrier, &doc.source);
            outcome.records.extend(one.records);
            outcome.skipped.extend(one.skipped);
        }
        let subset: Vec<EnrollmentRecord> = input
            .enrollment
            .iter()
            .filter(|e| e.carrier == *code)
            .cloned()
            .collect();
        let records = normalize_records(outcome.records, carrier, &subset);
        let statement_date = carrier
            .statement_date
            .or_else(|| infer_statement_date(&records));
        let result = reconcile(
            code,
            carrier,
            records,
            &subset,
            statement_date,
            &config.tolerance,
            outcome.skipped,
        );
        carriers.insert(code.clone(), result);
    }

    let portfolio = aggregate_portfolio(&carriers);
    Ok(ReconReport {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        carriers,
        portfolio,
    })
}

/// Reconcile one carrier's normalized records against its ledger subset.
pub fn reconcile(
    carrier_code: &str,
    carrier: &CarrierConfig,
    records: Vec<CommissionRecord>,
    enrollment: &[EnrollmentRecord],
    statement_date: Option<NaiveDate>,
    tolerance: &ToleranceConfig,
    skipped_rows: Vec<SkippedRow>,
) -> ReconciliationResult {
    let in_period: Vec<&EnrollmentRecord> = match statement_date {
        Some(date) => enrollment
            .iter()
            .filter(|e| e.statement_date == date)
            .collect(),
        None => Vec::new(),
    };
    let mut index: BTreeMap<&str, &EnrollmentRecord> = BTreeMap::new();
    for record in &in_period {
        index.insert(record.policy_id.as_str(), record);
    }

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for record in &records {
        let record_date = parse_flex_date(&record.effective_date);
        let hit = match (statement_date, record_date) {
            (Some(want), Some(have)) if want == have => index.get(record.member_id.as_str()),
            _ => None,
        };
        match hit {
            Some(enrolled) => matched.push(MatchedEntry {
                commission: record.clone(),
                enrollment: (*enrolled).clone(),
                match_basis: MATCH_BASIS.to_string(),
            }),
            None => unmatched.push(UnmatchedEntry {
                commission: record.clone(),
                reason: NO_MATCH_REASON.to_string(),
            }),
        }
    }

    // Occurrence counts and paid totals per policy, over every record on
    // the statement whether it matched or not.
    let mut by_policy: BTreeMap<&str, (usize, Money)> = BTreeMap::new();
    for record in &records {
        let entry = by_policy
            .entry(record.member_id.as_str())
            .or_insert((0, Money(0)));
        entry.0 += 1;
        entry.1 = entry.1 + record.payout;
    }

    let amount_tolerance = Money(tolerance.amount_cents);
    let mut subscriber_variances = Vec::new();
    let mut discrepancies = Vec::new();
    for enrolled in &in_period {
        let actual = by_policy
            .get(enrolled.policy_id.as_str())
            .map(|(_, total)| *total)
            .unwrap_or(Money(0));
        let expected = enrolled.expected_commission;
        let variance = actual - expected;
        let pct = if expected.0 != 0 {
            variance.0 as f64 / expected.0 as f64 * 100.0
        } else {
            0.0
        };
        subscriber_variances.push(SubscriberVariance {
            policy_id: enrolled.policy_id.clone(),
            member_name: enrolled.member_name.clone(),
            actual_commission: actual,
            expected_commission: expected,
            variance_amount: variance,
            variance_percentage: pct,
        });
        // All three gates are strict; a variance of exactly the tolerance
        // is not a finding, and zero-expected rows are never flagged.
        if expected > Money(0)
            && variance.abs() > amount_tolerance
            && pct.abs() > tolerance.percentage
        {
            let kind = if variance > Money(0) {
                DiscrepancyKind::Overpayment
            } else {
                DiscrepancyKind::Underpayment
            };
            discrepancies.push(Discrepancy {
                kind,
                policy_id: enrolled.policy_id.clone(),
                amount: variance,
                percentage: Some(pct),
                reason: format!(
                    "Commission variance: Expected {expected}, Actual {actual}, \
                     Variance {variance} ({pct:.1}%)"
                ),
            });
        }
    }

    for (policy_id, (count, total)) in &by_policy {
        if *count > 1 {
            discrepancies.push(Discrepancy {
                kind: DiscrepancyKind::Duplicate,
                policy_id: policy_id.to_string(),
                amount: *total,
                percentage: None,
                reason: format!("Policy {policy_id} appears {count} times with total {total}"),
            });
        }
    }

    for record in &records {
        if record.payout <= Money(0) {
            discrepancies.push(Discrepancy {
                kind: DiscrepancyKind::ZeroOrNegative,
                policy_id: record.member_id.clone(),
                amount: record.payout,
                percentage: None,
                reason: format!("Commission amount is {}", record.payout),
            });
        }
    }

    if let Some((low, high)) = iqr_bounds(&records) {
        for record in &records {
            let cents = record.payout.0 as f64;
            if cents < low || cents > high {
                discrepancies.push(Discrepancy {
                    kind: DiscrepancyKind::Outlier,
                    policy_id: record.member_id.clone(),
                    amount: record.payout,
                    percentage: None,
                    reason: format!(
                        "Amount {} is outside normal range (${:.2} - ${:.2})",
                        record.payout,
                        low / 100.0,
                        high / 100.0
                    ),
                });
            }
        }
    }

    let total_extracted = records.len();
    let total_matched = matched.len();
    let total_unmatched = unmatched.len();
    let match_percentage = if total_extracted > 0 {
        total_matched as f64 / total_extracted as f64 * 100.0
    } else {
        0.0
    };
    let summary = CarrierSummary {
        total_extracted,
        total_matched,
        total_unmatched,
        match_percentage,
        total_commission: records.iter().map(|r| r.payout).sum(),
        matched_commission: matched.iter().map(|m| m.commission.payout).sum(),
        unmatched_commission: unmatched.iter().map(|u| u.commission.payout).sum(),
    };

    let actual_commissions: Money = subscriber_variances
        .iter()
        .map(|v| v.actual_commission)
        .sum();
    let expected_commissions: Money = subscriber_variances
        .iter()
        .map(|v| v.expected_commission)
        .sum();
    let variance_amount = actual_commissions - expected_commissions;
    let variance_percentage = if expected_commissions.0 != 0 {
        variance_amount.0 as f64 / expected_commissions.0 as f64 * 100.0
    } else {
        0.0
    };
    let totals = CarrierTotals {
        actual_commissions,
        expected_commissions,
        variance_amount,
        variance_percentage,
    };

    let condition = in_period
        .is_empty()
        .then(|| NO_ENROLLMENT_CONDITION.to_string());

    ReconciliationResult {
        carrier: carrier_code.to_string(),
        carrier_name: carrier.name.clone(),
        statement_date,
        summary,
        totals,
        subscriber_variances,
        matched,
        unmatched,
        discrepancies,
        skipped_rows,
        condition,
        enrollment_records_available: enrollment.len(),
    }
}

/// Parse a carrier date in any of the accepted forms.
pub fn parse_flex_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// The statement period is the most frequent record date; on a tie the
/// earliest date wins.
pub fn infer_statement_date(records: &[CommissionRecord]) -> Option<NaiveDate> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        if let Some(date) = parse_flex_date(&record.effective_date) {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    let mut best: Option<(NaiveDate, usize)> = None;
    for (date, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((date, count));
        }
    }
    best.map(|(date, _)| date)
}

/// Tukey fences over the payout distribution, in cents. Values must be
/// strictly outside the fences to count.
fn iqr_bounds(records: &[CommissionRecord]) -> Option<(f64, f64)> {
    if records.is_empty() {
        return None;
    }
    let mut amounts: Vec<f64> = records.iter().map(|r| r.payout.0 as f64).collect();
    amounts.sort_by(f64::total_cmp);
    let q1 = quantile(&amounts, 0.25);
    let q3 = quantile(&amounts, 0.75);
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

/// Linear-interpolation quantile over a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = pos - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

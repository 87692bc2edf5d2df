//! Enrollment ledger loading.
//!
//! The ledger is a CSV export of every enrollment the agency expects
//! commission on. A missing required column is a hard error since the
//! whole run would be meaningless without it; a malformed row is only
//! skipped, with the line number kept for the report.

use chrono::NaiveDate;

use crate::error::ReconError;
use crate::model::{EnrollmentRecord, SkippedRow};
use crate::money::parse_money;

const REQUIRED_COLUMNS: [&str; 5] = [
    "policy_id",
    "carrier",
    "member_name",
    "statement_date",
    "expected_commission",
];

/// Load the ledger from CSV text. Returns the usable records plus the
/// rows that were dropped and why.
pub fn load_enrollment_csv(
    data: &str,
    source: &str,
) -> Result<(Vec<EnrollmentRecord>, Vec<SkippedRow>), ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| ReconError::Io(format!("enrollment ledger {source}: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    for name in REQUIRED_COLUMNS {
        if column(name).is_none() {
            return Err(ReconError::LedgerColumn {
                column: name.to_string(),
            });
        }
    }
    let policy_id = column("policy_id").unwrap_or_default();
    let carrier = column("carrier").unwrap_or_default();
    let member_name = column("member_name").unwrap_or_default();
    let statement_date = column("statement_date").unwrap_or_default();
    let expected_commission = column("expected_commission").unwrap_or_default();
    let plan_name = column("plan_name");
    let effective_date = column("effective_date");
    let status = column("status");
    let commission_type = column("commission_type");

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ReconError::Io(format!("enrollment ledger {source}: {e}")))?;
        // Header is line 1.
        let line = index + 2;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        let optional = |idx: Option<usize>| idx.map(&field).unwrap_or_default();

        let id = field(policy_id);
        if id.is_empty() {
            skipped.push(SkippedRow {
                source_document: source.to_string(),
                row: line,
                reason: "policy_id is empty".to_string(),
            });
            continue;
        }
        let date_text = field(statement_date);
        let date = match NaiveDate::parse_from_str(&date_text, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                skipped.push(SkippedRow {
                    source_document: source.to_string(),
                    row: line,
                    reason: format!("statement_date '{date_text}' is not YYYY-MM-DD"),
                });
                continue;
            }
        };
        let amount_text = field(expected_commission);
        let amount = match parse_money(&amount_text) {
            Ok(a) => a,
            Err(reason) => {
                skipped.push(SkippedRow {
                    source_document: source.to_string(),
                    row: line,
                    reason: format!("expected_commission '{amount_text}': {reason}"),
                });
                continue;
            }
        };
        records.push(EnrollmentRecord {
            policy_id: id,
            carrier: field(carrier),
            member_name: field(member_name),
            plan_name: optional(plan_name),
            effective_date: optional(effective_date),
            statement_date: date,
            status: optional(status),
            commission_type: optional(commission_type),
            expected_commission: amount,
        });
    }
    Ok((records, skipped))
}

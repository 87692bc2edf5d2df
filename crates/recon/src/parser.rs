//! Carrier statement parsing.
//!
//! Turns a decoded extraction document into commission records using the
//! carrier's configured strategy. Label echoes and subtotal lines are
//! dropped silently; rows that look like data but fail to parse come back
//! as skips with a reason. A bad row never aborts the document.

use regex::Regex;

use crate::config::{CarrierConfig, CarrierKind};
use crate::document::{table_rows, Document};
use crate::mapper::{anchor_table_columns, map_columns, ColumnMap};
use crate::model::{CommissionRecord, ParseOutcome, SkippedRow};
use crate::money::{parse_money, Money};

/// Cells that echo a column label instead of carrying data. Statements
/// repeat their header mid-table after page breaks.
const MEMBER_ECHOES: [&str; 2] = ["Member ID", "Policy ID"];
const PAYOUT_ECHOES: [&str; 3] = ["Payout", "Commission", "Net Amount"];

/// Parse one document with the carrier's strategy.
pub fn parse_document(
    document: &Document,
    carrier_code: &str,
    carrier: &CarrierConfig,
    source: &str,
) -> ParseOutcome {
    match carrier.kind {
        CarrierKind::AnchorBlocks => {
            parse_anchor_blocks(document, carrier_code, &carrier.table_marker, source)
        }
        CarrierKind::Standard | CarrierKind::TitleRow => {
            parse_marked_table(document, carrier_code, carrier, source)
        }
    }
}

/// Find the first chunk carrying the carrier's table marker, map its
/// header and parse its rows. Later marked tables are summaries and are
/// not read.
fn parse_marked_table(
    document: &Document,
    carrier_code: &str,
    carrier: &CarrierConfig,
    source: &str,
) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    for chunk in &document.chunks {
        if !chunk.is_table() || !chunk.markdown.contains(&carrier.table_marker) {
            continue;
        }
        let rows = table_rows(&chunk.markdown);
        if rows.is_empty() {
            continue;
        }
        let Some(map) = map_columns(&rows[0], carrier.kind) else {
            outcome.skipped.push(SkippedRow {
                source_document: source.to_string(),
                row: 0,
                reason: "header could not be mapped: member_id, effective_date and payout \
                         are required"
                    .to_string(),
            });
            continue;
        };
        let table = parse_table(&rows, &map, carrier_code, source);
        outcome.records.extend(table.records);
        outcome.skipped.extend(table.skipped);
        break;
    }
    outcome
}

/// Parse mapped table rows into records. `rows[0]` is the header.
pub fn parse_table(
    rows: &[Vec<String>],
    map: &ColumnMap,
    carrier: &str,
    source: &str,
) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    for (i, row) in rows.iter().enumerate().skip(1) {
        let member_id = required_cell(row, map.member_id);
        if member_id.is_empty() || MEMBER_ECHOES.contains(&member_id.as_str()) {
            continue;
        }
        let effective_date = required_cell(row, map.effective_date);
        if !effective_date.contains('/') && !effective_date.contains('-') {
            continue;
        }
        let Some(raw_payout) = row.get(map.payout) else {
            outcome.skipped.push(SkippedRow {
                source_document: source.to_string(),
                row: i,
                reason: format!(
                    "row has {} cells, payout column {} is out of range",
                    row.len(),
                    map.payout
                ),
            });
            continue;
        };
        let payout_text = raw_payout.replace(',', "");
        let payout_text = payout_text.trim();
        if payout_text.is_empty() || PAYOUT_ECHOES.contains(&payout_text) {
            continue;
        }
        let payout = match parse_money(payout_text) {
            Ok(amount) => amount,
            Err(reason) => {
                outcome.skipped.push(SkippedRow {
                    source_document: source.to_string(),
                    row: i,
                    reason: format!("payout '{raw_payout}': {reason}"),
                });
                continue;
            }
        };
        outcome.records.push(CommissionRecord {
            carrier: carrier.to_string(),
            source_document: source.to_string(),
            member_id,
            effective_date,
            payout,
            plan_id: optional_cell(row, map.plan_id),
            transaction_id: optional_cell(row, map.transaction_id),
            pbp_id: optional_cell(row, map.pbp_id),
            last_name: optional_cell(row, map.last_name),
            first_name: optional_cell(row, map.first_name),
            broker_name: optional_cell(row, map.broker_name),
            broker_id: optional_cell(row, map.broker_id),
            commission_type: optional_cell(row, map.commission_type),
            gross_amount: money_cell(row, map.gross_amount),
            normalization_note: None,
        });
    }
    outcome
}

/// A member identity block sitting above its commission tables.
struct MemberAnchor {
    member_id: String,
    effective_date: String,
    last_name: String,
    first_name: String,
    chunk_index: usize,
}

/// Two-pass parse for statements that put member identity in text blocks:
/// first collect every member anchor and marked table with their chunk
/// positions, then attribute each table to the nearest anchor above it.
fn parse_anchor_blocks(
    document: &Document,
    carrier_code: &str,
    table_marker: &str,
    source: &str,
) -> ParseOutcome {
    // "Norris William N 00000790462A (LV-MS) Effective 1/1/2024"
    let anchor_re = Regex::new(
        r"([A-Z][a-zA-Z'\s]+)\s+(\d{11}[A-Z])\s*\([^)]+\)\s*Effective\s+(\d{1,2}/\d{1,2}/\d{2,4})",
    )
    .unwrap();

    let mut anchors: Vec<MemberAnchor> = Vec::new();
    let mut tables: Vec<usize> = Vec::new();
    for (index, chunk) in document.chunks.iter().enumerate() {
        if let Some(caps) = anchor_re.captures(&chunk.markdown) {
            let full_name = caps[1].trim().to_string();
            let (last_name, first_name) = split_member_name(&full_name);
            anchors.push(MemberAnchor {
                member_id: caps[2].to_string(),
                effective_date: caps[3].to_string(),
                last_name,
                first_name,
                chunk_index: index,
            });
        }
        if chunk.is_table() && chunk.markdown.contains(table_marker) {
            tables.push(index);
        }
    }

    let mut outcome = ParseOutcome::default();
    for &table_index in &tables {
        let anchor = anchors
            .iter()
            .filter(|a| a.chunk_index < table_index)
            .max_by_key(|a| a.chunk_index);
        let Some(anchor) = anchor else {
            continue;
        };
        let rows = table_rows(&document.chunks[table_index].markdown);
        if rows.len() < 2 {
            continue;
        }
        let header = &rows[0];
        let cols = anchor_table_columns(header);
        let Some(payout_col) = cols.payout else {
            outcome.skipped.push(SkippedRow {
                source_document: source.to_string(),
                row: 0,
                reason: format!(
                    "table for member {} has no paid-amount column",
                    anchor.member_id
                ),
            });
            continue;
        };
        for (i, row) in rows.iter().enumerate().skip(1) {
            if row.len() < header.len() {
                continue;
            }
            if row.iter().any(|cell| cell.to_lowercase().contains("total")) {
                continue;
            }
            if row.iter().take(3).all(|cell| cell.is_empty()) {
                continue;
            }
            let Some(raw_payout) = row.get(payout_col) else {
                continue;
            };
            let payout_text = raw_payout.replace(',', "");
            let payout_text = payout_text.trim();
            if payout_text.is_empty() || payout_text.eq_ignore_ascii_case("paid amount") {
                continue;
            }
            let payout = match parse_money(payout_text) {
                Ok(amount) => amount,
                Err(reason) => {
                    outcome.skipped.push(SkippedRow {
                        source_document: source.to_string(),
                        row: i,
                        reason: format!(
                            "payout '{raw_payout}' for member {}: {reason}",
                            anchor.member_id
                        ),
                    });
                    continue;
                }
            };
            let month_paid = text_cell(row, cols.month_paid);
            let year = text_cell(row, cols.year);
            let effective_date = month_year_date(month_paid, year)
                .unwrap_or_else(|| anchor.effective_date.clone());
            outcome.records.push(CommissionRecord {
                carrier: carrier_code.to_string(),
                source_document: source.to_string(),
                member_id: anchor.member_id.clone(),
                effective_date,
                payout,
                plan_id: optional_cell(row, cols.product_type),
                transaction_id: None,
                pbp_id: None,
                last_name: non_empty(anchor.last_name.clone()),
                first_name: non_empty(anchor.first_name.clone()),
                broker_name: None,
                broker_id: None,
                commission_type: optional_cell(row, cols.comments),
                gross_amount: money_cell(row, cols.rate),
                normalization_note: None,
            });
        }
    }
    outcome
}

/// Surname first: "Norris William N" is last "Norris", first "William N".
fn split_member_name(full_name: &str) -> (String, String) {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.len() {
        0 => (String::new(), String::new()),
        1 => (full_name.to_string(), String::new()),
        _ => (parts[0].to_string(), parts[1..].join(" ")),
    }
}

/// Convert a "MAY 25" month-paid cell into first-of-month date text. The
/// year column only gates presence; the digits come from the cell itself.
fn month_year_date(month_paid: &str, year: &str) -> Option<String> {
    if month_paid.trim().is_empty() || year.trim().is_empty() {
        return None;
    }
    let upper = month_paid.trim().to_uppercase();
    let mut parts = upper.split_whitespace();
    let month = parts.next()?;
    let year_part = parts.next()?;
    let month_num = match month {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    let full_year = if year_part.len() == 2 {
        format!("20{year_part}")
    } else {
        year_part.to_string()
    };
    Some(format!("{month_num}/1/{full_year}"))
}

fn required_cell(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn optional_cell(row: &[String], idx: Option<usize>) -> Option<String> {
    let cell = idx.and_then(|i| row.get(i))?.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn money_cell(row: &[String], idx: Option<usize>) -> Option<Money> {
    idx.and_then(|i| row.get(i)).and_then(|s| parse_money(s).ok())
}

fn text_cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or("")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

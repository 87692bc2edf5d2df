//! Statement-header column mapping.
//!
//! Binds each canonical field to at most one table column by similarity
//! score. Payout is resolved first and payout-looking columns are reserved
//! for it; every other field is then assigned greedily in declaration
//! order, so no two fields ever share a column.

use crate::config::CarrierKind;
use crate::similarity::{normalize_header, similarity};

/// A column only binds when its best score is strictly above this.
const ACCEPT_THRESHOLD: f64 = 0.3;

/// Header fragments that mark a column as payout-bearing. Such columns are
/// off limits to every field except payout itself.
const PAYOUT_PROTECT: [&str; 8] = [
    "payout",
    "net",
    "commission",
    "payment",
    "amount",
    "pay",
    "total",
    "final",
];

/// Canonical fields and their keyword lists, in assignment order.
/// Payout stays first.
const FIELD_KEYWORDS: [(&str, &[&str]); 12] = [
    (
        "payout",
        &[
            "payout",
            "net",
            "commission",
            "payment",
            "amount",
            "total",
            "final",
            "paid amount",
        ],
    ),
    ("plan_id", &["plan", "product", "scheme"]),
    (
        "transaction_id",
        &[
            "transaction",
            "trans",
            "reference",
            "ref",
            "confirmation",
            "confirm",
        ],
    ),
    (
        "member_id",
        &[
            "member",
            "policy",
            "subscriber",
            "customer",
            "client",
            "enrollee",
            "participant",
        ],
    ),
    (
        "effective_date",
        &["effective", "start", "begin", "commence", "date", "activation"],
    ),
    ("pbp_id", &["pbp", "benefit", "plan", "package"]),
    ("last_name", &["last", "surname", "family", "lastname"]),
    ("first_name", &["first", "given", "forename", "firstname"]),
    (
        "broker_name",
        &["broker", "agent", "representative", "rep", "advisor"],
    ),
    (
        "broker_id",
        &["broker", "agent", "representative", "rep", "advisor"],
    ),
    ("commission_type", &["type", "category", "class", "kind"]),
    ("gross_amount", &["gross", "rate", "base", "initial"]),
];

/// Resolved column positions for one statement table.
///
/// The three mandatory fields are plain indices; a table whose header
/// cannot bind all three is rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub member_id: usize,
    pub effective_date: usize,
    pub payout: usize,
    pub plan_id: Option<usize>,
    pub transaction_id: Option<usize>,
    pub pbp_id: Option<usize>,
    pub last_name: Option<usize>,
    pub first_name: Option<usize>,
    pub broker_name: Option<usize>,
    pub broker_id: Option<usize>,
    pub commission_type: Option<usize>,
    pub gross_amount: Option<usize>,
}

/// Map a table's first row to canonical fields, or reject the table when
/// any of member_id, effective_date or payout cannot be bound.
pub fn map_columns(header: &[String], kind: CarrierKind) -> Option<ColumnMap> {
    if kind == CarrierKind::TitleRow && is_title_row(header) {
        return Some(title_row_layout());
    }
    similarity_map(header)
}

/// A statement that opens with a decorative title instead of a header:
/// a single-cell first row, or any cell naming the incentive program.
fn is_title_row(header: &[String]) -> bool {
    header.len() == 1 || header.iter().any(|c| c.to_lowercase().contains("incentive"))
}

/// Known positional layout used when the header row is a title. Column 9
/// is a filler column and stays unmapped.
fn title_row_layout() -> ColumnMap {
    ColumnMap {
        member_id: 2,
        effective_date: 3,
        payout: 12,
        plan_id: Some(0),
        transaction_id: Some(1),
        pbp_id: Some(4),
        last_name: Some(5),
        first_name: Some(6),
        broker_name: Some(7),
        broker_id: Some(8),
        commission_type: Some(10),
        gross_amount: Some(11),
    }
}

fn similarity_map(header: &[String]) -> Option<ColumnMap> {
    let protected: Vec<bool> = header
        .iter()
        .map(|h| {
            let n = normalize_header(h);
            PAYOUT_PROTECT.iter().any(|k| n.contains(k))
        })
        .collect();

    let mut used = vec![false; header.len()];
    let mut slots = [None::<usize>; FIELD_KEYWORDS.len()];
    for (fi, (_, keywords)) in FIELD_KEYWORDS.iter().enumerate() {
        let payout_field = fi == 0;
        let mut best: Option<(usize, f64)> = None;
        for (idx, cell) in header.iter().enumerate() {
            if used[idx] || (!payout_field && protected[idx]) {
                continue;
            }
            let score = similarity(cell, keywords);
            if score <= ACCEPT_THRESHOLD {
                continue;
            }
            // Strictly greater keeps the leftmost column on score ties.
            let better = match best {
                None => true,
                Some((_, top)) => score > top,
            };
            if better {
                best = Some((idx, score));
            }
        }
        if let Some((idx, _)) = best {
            used[idx] = true;
            slots[fi] = Some(idx);
        }
    }

    let [payout, plan_id, transaction_id, member_id, effective_date, pbp_id, last_name, first_name, broker_name, broker_id, commission_type, gross_amount] =
        slots;
    let (Some(member_id), Some(effective_date), Some(payout)) =
        (member_id, effective_date, payout)
    else {
        return None;
    };
    Some(ColumnMap {
        member_id,
        effective_date,
        payout,
        plan_id,
        transaction_id,
        pbp_id,
        last_name,
        first_name,
        broker_name,
        broker_id,
        commission_type,
        gross_amount,
    })
}

/// Column positions for the anchor-block table layout, bound by literal
/// header text rather than similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorColumns {
    pub product_type: Option<usize>,
    pub product_code: Option<usize>,
    pub month_paid: Option<usize>,
    pub year: Option<usize>,
    pub rate: Option<usize>,
    pub payout: Option<usize>,
    pub comments: Option<usize>,
}

pub fn anchor_table_columns(header: &[String]) -> AnchorColumns {
    let mut cols = AnchorColumns::default();
    for (idx, cell) in header.iter().enumerate() {
        let h = cell.to_lowercase();
        if h.contains("product type") {
            cols.product_type = Some(idx);
        } else if h.contains("product code") {
            cols.product_code = Some(idx);
        } else if h.contains("month paid") || h.contains("paid to date") {
            cols.month_paid = Some(idx);
        } else if h.trim() == "year" {
            cols.year = Some(idx);
        } else if h.trim() == "rate" {
            cols.rate = Some(idx);
        } else if h.contains("paid amount") && !h.contains("month") {
            cols.payout = Some(idx);
        } else if h.contains("comment") {
            cols.comments = Some(idx);
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn statement_header() -> Vec<String> {
        cells(&[
            "Contract ID",
            "Txn ID",
            "Member ID",
            "Effective Date",
            "PBP",
            "Last",
            "First",
            "Broker",
            "NPN",
            "Term",
            "Reason",
            "Rate",
            "Payout Amt",
        ])
    }

    #[test]
    fn single_cell_title_uses_fixed_layout() {
        let header = cells(&["Incentive ID : Broker Commission"]);
        let map = map_columns(&header, CarrierKind::TitleRow).unwrap();
        assert_eq!(map.member_id, 2);
        assert_eq!(map.effective_date, 3);
        assert_eq!(map.payout, 12);
        assert_eq!(map.broker_id, Some(8));
        assert_eq!(map.commission_type, Some(10));
    }

    #[test]
    fn incentive_cell_triggers_fixed_layout() {
        let header = cells(&["Q3 Incentive Summary", "Broker Detail"]);
        let map = map_columns(&header, CarrierKind::TitleRow).unwrap();
        assert_eq!(map.payout, 12);
    }

    #[test]
    fn title_detection_is_kind_gated() {
        // A standard carrier never takes the positional layout; this title
        // has no mappable member or date column, so the table is rejected.
        let header = cells(&["Incentive ID : Broker Commission"]);
        assert!(map_columns(&header, CarrierKind::Standard).is_none());
    }

    #[test]
    fn full_statement_header_binds_mandatory_fields() {
        let map = map_columns(&statement_header(), CarrierKind::Standard).unwrap();
        assert_eq!(map.member_id, 2);
        assert_eq!(map.effective_date, 3);
        assert_eq!(map.payout, 12);
        assert_eq!(map.pbp_id, Some(4));
        assert_eq!(map.first_name, Some(6));
        assert_eq!(map.broker_name, Some(7));
    }

    #[test]
    fn no_two_fields_share_a_column() {
        let map = map_columns(&statement_header(), CarrierKind::Standard).unwrap();
        let mut indices = vec![map.member_id, map.effective_date, map.payout];
        for opt in [
            map.plan_id,
            map.transaction_id,
            map.pbp_id,
            map.last_name,
            map.first_name,
            map.broker_name,
            map.broker_id,
            map.commission_type,
            map.gross_amount,
        ]
        .into_iter()
        .flatten()
        {
            indices.push(opt);
        }
        let before = indices.len();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), before, "a column was bound twice");
    }

    #[test]
    fn mapping_is_deterministic() {
        let a = map_columns(&statement_header(), CarrierKind::Standard);
        let b = map_columns(&statement_header(), CarrierKind::Standard);
        assert_eq!(a, b);
    }

    #[test]
    fn missing_mandatory_field_rejects_table() {
        assert!(map_columns(&cells(&["Name", "Amount"]), CarrierKind::Standard).is_none());
        assert!(map_columns(&[], CarrierKind::Standard).is_none());
    }

    #[test]
    fn payout_may_claim_protected_column() {
        // "Payout Amt" is payout-protected; payout itself binds it while no
        // other field can.
        let map = map_columns(&statement_header(), CarrierKind::Standard).unwrap();
        assert_eq!(map.payout, 12);
        assert_ne!(map.gross_amount, Some(12));
        assert_ne!(map.transaction_id, Some(12));
    }

    #[test]
    fn anchor_header_binds_by_literal_text() {
        let header = cells(&[
            "Product type",
            "Product code",
            "Month paid/ Paid to date",
            "Year",
            "Rate",
            "Paid amount",
            "Comments",
        ]);
        let cols = anchor_table_columns(&header);
        assert_eq!(cols.product_type, Some(0));
        assert_eq!(cols.product_code, Some(1));
        assert_eq!(cols.month_paid, Some(2));
        assert_eq!(cols.year, Some(3));
        assert_eq!(cols.rate, Some(4));
        assert_eq!(cols.payout, Some(5));
        assert_eq!(cols.comments, Some(6));
    }

    #[test]
    fn anchor_payout_never_binds_month_column() {
        let header = cells(&["Month paid amount", "Paid amount"]);
        let cols = anchor_table_columns(&header);
        assert_eq!(cols.month_paid, Some(0));
        assert_eq!(cols.payout, Some(1));
    }
}

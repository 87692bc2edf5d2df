//! Member identifier normalization.
//!
//! Statements do not always carry the identifier the enrollment ledger
//! knows. Group invoices use compound ids like `843027_United Dental`,
//! extraction sometimes affixes a stray letter to an id, and a few
//! carriers put the member's name where the id belongs. Normalization
//! rewrites each record's `member_id` into ledger form before matching,
//! leaving a note on the record whenever the rewrite is a guess.

use crate::config::{CarrierConfig, CarrierKind};
use crate::model::{CommissionRecord, EnrollmentRecord};
use crate::money::Money;

/// Normalize extracted records for one carrier. `enrollment` is the
/// ledger subset for the same carrier and feeds name recovery.
pub fn normalize_records(
    records: Vec<CommissionRecord>,
    carrier: &CarrierConfig,
    enrollment: &[EnrollmentRecord],
) -> Vec<CommissionRecord> {
    let mut out = Vec::with_capacity(records.len());
    for mut record in records {
        if let Some((group, _)) = record.member_id.split_once('_') {
            // Compound group ids keep only the group number.
            if !group.is_empty() {
                record.member_id = group.to_string();
            }
        } else if carrier.kind == CarrierKind::AnchorBlocks && is_affixed_id(&record.member_id) {
            record.member_id = record.member_id[1..].to_string();
        } else if looks_like_person_name(&record.member_id) {
            match resolve_member_name(&record.member_id, enrollment) {
                Some(policy_id) => {
                    record.normalization_note =
                        Some(format!("member id recovered from name '{}'", record.member_id));
                    record.member_id = policy_id;
                }
                None => {
                    record.normalization_note =
                        Some(format!("unmapped member name '{}'", record.member_id));
                }
            }
        }

        // Group policies fan out to their configured member allocations.
        let group = carrier
            .fanout
            .iter()
            .find(|g| g.group_id == record.member_id);
        if let Some(group) = group {
            for member in &group.members {
                let mut split = record.clone();
                split.member_id = member.policy_id.clone();
                split.payout = Money(member.amount_cents);
                split.normalization_note =
                    Some(format!("allocated from group {}", group.group_id));
                out.push(split);
            }
        } else {
            out.push(record);
        }
    }
    out
}

/// A stray letter affixed to an 11-digit id plus its real check letter,
/// `A00000790462A` for ledger id `00000790462A`.
fn is_affixed_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 13
        && bytes[0].is_ascii_alphabetic()
        && bytes[1..12].iter().all(|b| b.is_ascii_digit())
        && bytes[12].is_ascii_alphabetic()
}

/// Two or three alphabetic tokens and no digits reads as a person's
/// name sitting in the id column.
fn looks_like_person_name(id: &str) -> bool {
    if id.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let tokens = id.split_whitespace().count();
    if !(2..=3).contains(&tokens) {
        return false;
    }
    id.chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || "'.,-".contains(c))
}

/// Look the name up against ledger member names. The first and last
/// tokens of the statement name must each match some ledger token,
/// where middle initials on the ledger side are allowed to differ.
fn resolve_member_name(name: &str, enrollment: &[EnrollmentRecord]) -> Option<String> {
    let want: Vec<String> = name.split_whitespace().map(|t| t.to_lowercase()).collect();
    let first = want.first()?;
    let last = want.last()?;
    for record in enrollment {
        let have: Vec<String> = record
            .member_name
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        let first_hit = have.iter().any(|t| tokens_match(first, t));
        let last_hit = have.iter().any(|t| tokens_match(last, t));
        if first_hit && last_hit {
            return Some(record.policy_id.clone());
        }
    }
    None
}

/// Exact match, or one token is a prefix of the other with at least two
/// characters in common.
fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let shorter = a.chars().count().min(b.chars().count());
    shorter >= 2 && a.chars().zip(b.chars()).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FanoutGroup, FanoutMember};
    use chrono::NaiveDate;

    fn carrier(kind: CarrierKind) -> CarrierConfig {
        CarrierConfig {
            name: "Test Carrier".to_string(),
            kind,
            table_marker: "Statement".to_string(),
            documents: Vec::new(),
            statement_date: None,
            fanout: Vec::new(),
        }
    }

    fn record(member_id: &str, payout_cents: i64) -> CommissionRecord {
        CommissionRecord {
            carrier: "test".to_string(),
            source_document: "doc.json".to_string(),
            member_id: member_id.to_string(),
            effective_date: "1/1/2024".to_string(),
            payout: Money(payout_cents),
            plan_id: None,
            transaction_id: None,
            pbp_id: None,
            last_name: None,
            first_name: None,
            broker_name: None,
            broker_id: None,
            commission_type: None,
            gross_amount: None,
            normalization_note: None,
        }
    }

    fn enrollment(policy_id: &str, member_name: &str) -> EnrollmentRecord {
        EnrollmentRecord {
            policy_id: policy_id.to_string(),
            carrier: "test".to_string(),
            member_name: member_name.to_string(),
            plan_name: String::new(),
            effective_date: String::new(),
            statement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: String::new(),
            commission_type: String::new(),
            expected_commission: Money(0),
        }
    }

    #[test]
    fn name_in_id_column_recovers_policy_id() {
        let ledger = vec![enrollment("00000790462A", "Norris William N")];
        let out = normalize_records(
            vec![record("Norris William", 4357)],
            &carrier(CarrierKind::AnchorBlocks),
            &ledger,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].member_id, "00000790462A");
        let note = out[0].normalization_note.as_deref().unwrap();
        assert!(note.contains("recovered"));
        assert!(note.contains("Norris William"));
    }

    #[test]
    fn unresolved_name_keeps_id_and_warns() {
        let ledger = vec![enrollment("00000790462A", "Garcia Maria")];
        let out = normalize_records(
            vec![record("Norris William", 4357)],
            &carrier(CarrierKind::Standard),
            &ledger,
        );
        assert_eq!(out[0].member_id, "Norris William");
        assert!(out[0]
            .normalization_note
            .as_deref()
            .unwrap()
            .contains("unmapped member name"));
    }

    #[test]
    fn affixed_letter_stripped_for_anchor_carriers() {
        let out = normalize_records(
            vec![record("A00000790462A", 4357)],
            &carrier(CarrierKind::AnchorBlocks),
            &[],
        );
        assert_eq!(out[0].member_id, "00000790462A");
        assert!(out[0].normalization_note.is_none());
    }

    #[test]
    fn affixed_letter_kept_for_other_carriers() {
        let out = normalize_records(
            vec![record("A00000790462A", 4357)],
            &carrier(CarrierKind::Standard),
            &[],
        );
        assert_eq!(out[0].member_id, "A00000790462A");
    }

    #[test]
    fn compound_id_reduces_to_group_number() {
        let out = normalize_records(
            vec![record("843027_United Dental Group", 5428)],
            &carrier(CarrierKind::Standard),
            &[],
        );
        assert_eq!(out[0].member_id, "843027");
        assert!(out[0].normalization_note.is_none());
    }

    #[test]
    fn group_id_fans_out_to_member_allocations() {
        let mut cfg = carrier(CarrierKind::Standard);
        cfg.fanout = vec![FanoutGroup {
            group_id: "843027".to_string(),
            members: vec![
                FanoutMember {
                    policy_id: "00000790462A".to_string(),
                    amount_cents: 2714,
                },
                FanoutMember {
                    policy_id: "00000790463B".to_string(),
                    amount_cents: 2714,
                },
            ],
        }];
        let out = normalize_records(
            vec![record("843027_United Dental Group", 5428)],
            &cfg,
            &[],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].member_id, "00000790462A");
        assert_eq!(out[1].member_id, "00000790463B");
        assert_eq!(out[0].payout, Money(2714));
        assert_eq!(out[1].payout, Money(2714));
        assert_eq!(out[0].payout + out[1].payout, Money(5428));
        assert!(out[0]
            .normalization_note
            .as_deref()
            .unwrap()
            .contains("allocated from group 843027"));
    }

    #[test]
    fn ungrouped_id_passes_through() {
        let out = normalize_records(
            vec![record("843027", 5428)],
            &carrier(CarrierKind::Standard),
            &[],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].member_id, "843027");
        assert_eq!(out[0].payout, Money(5428));
    }

    #[test]
    fn person_name_detection_bounds() {
        assert!(looks_like_person_name("Norris William"));
        assert!(looks_like_person_name("Norris William N"));
        assert!(looks_like_person_name("O'Brien Mary"));
        assert!(!looks_like_person_name("90004932901"));
        assert!(!looks_like_person_name("Norris"));
        assert!(!looks_like_person_name("A B C D"));
        assert!(!looks_like_person_name("Unit 4B"));
    }

    #[test]
    fn name_tokens_allow_prefix_matches() {
        let ledger = vec![enrollment("00000790462A", "Norr William")];
        let out = normalize_records(
            vec![record("Norris William", 4357)],
            &carrier(CarrierKind::Standard),
            &ledger,
        );
        assert_eq!(out[0].member_id, "00000790462A");
    }
}

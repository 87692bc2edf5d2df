use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use tally_recon::document::Document;
use tally_recon::engine::{NO_ENROLLMENT_CONDITION, NO_MATCH_REASON};
use tally_recon::ledger::load_enrollment_csv;
use tally_recon::model::{ReconInput, SourceDocument};
use tally_recon::report::notification;
use tally_recon::{run, Money, ReconConfig};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn february_config() -> ReconConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("february.recon.toml")).unwrap();
    ReconConfig::from_toml(&toml).unwrap()
}

/// Read the ledger and every configured document the way the CLI does.
fn load_input(config: &ReconConfig) -> ReconInput {
    let dir = fixtures_dir();
    let ledger = std::fs::read_to_string(dir.join(&config.enrollment_file)).unwrap();
    let (enrollment, skipped) = load_enrollment_csv(&ledger, &config.enrollment_file).unwrap();
    assert!(skipped.is_empty(), "fixture ledger should load cleanly");

    let mut documents = BTreeMap::new();
    for (code, carrier) in &config.carriers {
        let docs = carrier
            .documents
            .iter()
            .map(|file| {
                let text = std::fs::read_to_string(dir.join(file))
                    .unwrap_or_else(|e| panic!("cannot read {file}: {e}"));
                SourceDocument {
                    source: file.clone(),
                    document: Document::from_json(&text).unwrap(),
                }
            })
            .collect();
        documents.insert(code.clone(), docs);
    }
    ReconInput { documents, enrollment }
}

// -------------------------------------------------------------------------
// Clean February run
// -------------------------------------------------------------------------

#[test]
fn february_statements_reconcile_cleanly() {
    let config = february_config();
    let input = load_input(&config);
    let report = run(&config, &input).unwrap();

    assert_eq!(report.meta.config_name, "february");
    assert_eq!(report.carriers.len(), 2);

    let hne = &report.carriers["hne"];
    assert_eq!(hne.carrier_name, "Health New England");
    // No configured date, so the period is inferred from the records.
    assert_eq!(hne.statement_date, NaiveDate::from_ymd_opt(2025, 2, 1));
    assert_eq!(hne.summary.total_extracted, 3);
    assert_eq!(hne.summary.total_matched, 3);
    assert_eq!(hne.summary.match_percentage, 100.0);
    assert_eq!(hne.summary.total_commission, Money(68028));
    assert!(hne.discrepancies.is_empty());
    assert!(hne.skipped_rows.is_empty());
    assert!(hne.condition.is_none());

    let humana = &report.carriers["humana"];
    assert_eq!(humana.summary.total_extracted, 1);
    assert_eq!(humana.summary.total_matched, 1);
    assert_eq!(humana.summary.total_commission, Money(5428));
    let entry = &humana.matched[0];
    assert_eq!(entry.enrollment.policy_id, "00000790462A");
    assert_eq!(entry.commission.effective_date, "2/1/2025");
    assert_eq!(entry.commission.plan_id.as_deref(), Some("LV-MS"));
    assert_eq!(entry.commission.commission_type.as_deref(), Some("New enrollment"));

    let portfolio = &report.portfolio;
    assert_eq!(portfolio.total_all_carriers, Money(73456));
    assert_eq!(portfolio.top_performing_carrier.as_ref().unwrap().carrier, "hne");
    assert!(portfolio.period_growth.is_none(), "single period has no growth");
    let hne_share = portfolio.carrier_breakdown["hne"].percentage;
    assert!((hne_share - 92.61).abs() < 0.01, "hne share was {hne_share}");
}

#[test]
fn fanout_group_allocates_to_ledger_policies() {
    let config = february_config();
    let input = load_input(&config);
    let report = run(&config, &input).unwrap();

    let matched = &report.carriers["hne"].matched;
    assert_eq!(matched[0].commission.member_id, "90004932901");

    let first = &matched[1].commission;
    let second = &matched[2].commission;
    assert_eq!(first.member_id, "843027A01");
    assert_eq!(second.member_id, "843027A02");
    assert_eq!(first.payout, Money(2714));
    assert_eq!(
        first.normalization_note.as_deref(),
        Some("allocated from group 843027")
    );
    // The group's statement payout is conserved across the allocation.
    assert_eq!(first.payout + second.payout, Money(5428));
    assert_eq!(matched[1].enrollment.policy_id, "843027A01");
}

// -------------------------------------------------------------------------
// Period with no enrollment
// -------------------------------------------------------------------------

#[test]
fn period_without_enrollment_flags_every_carrier() {
    let mut config = february_config();
    for carrier in config.carriers.values_mut() {
        carrier.statement_date = NaiveDate::from_ymd_opt(2025, 3, 1);
    }
    let input = load_input(&config);
    let report = run(&config, &input).unwrap();

    for result in report.carriers.values() {
        assert_eq!(result.condition.as_deref(), Some(NO_ENROLLMENT_CONDITION));
        assert_eq!(result.summary.total_matched, 0);
    }
    let hne = &report.carriers["hne"];
    assert_eq!(hne.summary.total_unmatched, 3);
    assert_eq!(hne.unmatched[0].reason, NO_MATCH_REASON);
    // Commission totals still reflect what the statements paid.
    assert_eq!(report.portfolio.total_all_carriers, Money(73456));
}

// -------------------------------------------------------------------------
// Notification
// -------------------------------------------------------------------------

#[test]
fn notification_summarizes_the_run() {
    let config = february_config();
    let input = load_input(&config);
    let report = run(&config, &input).unwrap();

    let note = notification(&report, "2025-02-26");
    assert_eq!(
        note.subject,
        "Commission Reconciliation Report - 2025-02-26 - 100.0% Match Rate"
    );
    assert!(note.body.contains("- Carriers Processed: 2"));
    assert!(note.body.contains("- Total Commission Amount: $734.56"));
    assert!(note.body.contains("Health New England:"));
    assert!(note.body.contains("STATUS: All carriers show excellent match rates (>90%)"));
}

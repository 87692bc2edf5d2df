//! `tally run`: load a config and its input files, reconcile, render.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;

use tally_recon::document::Document;
use tally_recon::ledger::load_enrollment_csv;
use tally_recon::model::{ReconInput, SourceDocument};
use tally_recon::report::notification;
use tally_recon::{ReconConfig, ReconReport};

use crate::exit_codes::{EXIT_RECON_FINDINGS, EXIT_RECON_RUNTIME};
use crate::CliError;

fn recon_err(code: u8, message: impl Into<String>) -> CliError {
    CliError { code, message: message.into(), hint: None }
}

pub fn cmd_run(
    config_path: &Path,
    json: bool,
    output: Option<&Path>,
    statement_date: Option<&str>,
    notify: bool,
) -> Result<(), CliError> {
    let config_text = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", config_path.display())))?;
    let mut config = ReconConfig::from_toml(&config_text).map_err(CliError::recon)?;

    if let Some(text) = statement_date {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
            CliError::usage(format!("invalid --statement-date '{text}'"))
                .with_hint("use YYYY-MM-DD, e.g. 2025-02-01")
        })?;
        for carrier in config.carriers.values_mut() {
            carrier.statement_date = Some(date);
        }
    }

    // Paths in the config resolve relative to the config file itself.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let input = load_input(&config, base_dir)?;

    let report = tally_recon::run(&config, &input).map_err(CliError::recon)?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot encode report: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &rendered).map_err(|e| {
            recon_err(EXIT_RECON_RUNTIME, format!("cannot write {}: {e}", path.display()))
        })?;
        eprintln!("wrote {}", path.display());
    }
    if json {
        println!("{rendered}");
    }

    print_summary(&report);

    if notify {
        let run_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let note = notification(&report, &run_date);
        println!("Subject: {}", note.subject);
        println!();
        println!("{}", note.body);
    }

    let findings: usize = report
        .carriers
        .values()
        .map(|r| r.discrepancies.len() + r.unmatched.len())
        .sum();
    if findings > 0 {
        return Err(recon_err(
            EXIT_RECON_FINDINGS,
            format!("{findings} finding(s) require review"),
        ));
    }
    Ok(())
}

/// Read the enrollment ledger and every configured carrier document.
fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, CliError> {
    let ledger_path = base_dir.join(&config.enrollment_file);
    let ledger_text = std::fs::read_to_string(&ledger_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", ledger_path.display())))?;
    let (enrollment, skipped) =
        load_enrollment_csv(&ledger_text, &ledger_path.display().to_string())
            .map_err(CliError::recon)?;
    for skip in &skipped {
        eprintln!("warning: {} line {}: {}", skip.source_document, skip.row, skip.reason);
    }

    let mut documents: BTreeMap<String, Vec<SourceDocument>> = BTreeMap::new();
    for (code, carrier) in &config.carriers {
        let mut docs = Vec::with_capacity(carrier.documents.len());
        for file in &carrier.documents {
            let path = base_dir.join(file);
            let text = std::fs::read_to_string(&path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            let document = Document::from_json(&text).map_err(CliError::recon)?;
            docs.push(SourceDocument { source: file.clone(), document });
        }
        documents.insert(code.clone(), docs);
    }

    Ok(ReconInput { documents, enrollment })
}

fn print_summary(report: &ReconReport) {
    for (code, result) in &report.carriers {
        let s = &result.summary;
        eprintln!(
            "{code}: {} extracted, {} matched ({:.1}%), {} unmatched, {} flagged, {} skipped",
            s.total_extracted,
            s.total_matched,
            s.match_percentage,
            s.total_unmatched,
            result.discrepancies.len(),
            result.skipped_rows.len(),
        );
        if let Some(condition) = &result.condition {
            eprintln!("{code}: note: {condition}");
        }
    }

    let p = &report.portfolio;
    eprintln!(
        "portfolio: {} across {} carrier(s)",
        p.total_all_carriers,
        report.carriers.len(),
    );
    if let Some(top) = &p.top_performing_carrier {
        eprintln!("top: {} at {}", top.carrier, top.amount);
    }
    if let Some(growth) = &p.period_growth {
        eprintln!(
            "growth: {:+.1}% from {} to {}",
            growth.growth_rate * 100.0,
            growth.previous_period,
            growth.current_period,
        );
    }
}

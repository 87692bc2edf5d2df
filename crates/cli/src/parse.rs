//! `tally parse`: run a single document through carrier extraction and
//! print what came out. Useful when onboarding a new carrier layout.

use std::path::Path;

use tally_recon::document::Document;
use tally_recon::parser::parse_document;
use tally_recon::ReconConfig;

use crate::exit_codes::EXIT_RECON_RUNTIME;
use crate::CliError;

pub fn cmd_parse(
    document_path: &Path,
    carrier_code: &str,
    config_path: &Path,
) -> Result<(), CliError> {
    let config_text = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", config_path.display())))?;
    let config = ReconConfig::from_toml(&config_text).map_err(CliError::recon)?;

    let Some(carrier) = config.carriers.get(carrier_code) else {
        let known: Vec<&str> = config.carriers.keys().map(String::as_str).collect();
        return Err(
            CliError::usage(format!("carrier '{carrier_code}' is not in the config"))
                .with_hint(format!("configured carriers: {}", known.join(", "))),
        );
    };

    let document_text = std::fs::read_to_string(document_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", document_path.display())))?;
    let document = Document::from_json(&document_text).map_err(CliError::recon)?;

    let source = document_path.display().to_string();
    let outcome = parse_document(&document, carrier_code, carrier, &source);

    let rendered = serde_json::to_string_pretty(&outcome.records).map_err(|e| CliError {
        code: EXIT_RECON_RUNTIME,
        message: format!("cannot encode records: {e}"),
        hint: None,
    })?;
    println!("{rendered}");

    eprintln!("{} record(s), {} skipped", outcome.records.len(), outcome.skipped.len());
    for skip in &outcome.skipped {
        eprintln!("skipped row {}: {}", skip.row, skip.reason);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::exit_codes::{EXIT_PARSE, EXIT_USAGE};

    const CONFIG: &str = r#"
name = "february"
enrollment_file = "enrollment.csv"

[carriers.hne]
name = "Health New England"
kind = "title_row"
table_marker = "Incentive ID : Broker Commission"
"#;

    #[test]
    fn unknown_carrier_is_usage_error_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("recon.toml");
        std::fs::write(&config_path, CONFIG).unwrap();
        let document_path = dir.path().join("doc.json");
        std::fs::write(&document_path, r#"{"chunks": []}"#).unwrap();

        let err = cmd_parse(&document_path, "aetna", &config_path).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert_eq!(err.hint.as_deref(), Some("configured carriers: hne"));
    }

    #[test]
    fn undecodable_document_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("recon.toml");
        std::fs::write(&config_path, CONFIG).unwrap();
        let document_path = dir.path().join("doc.json");
        std::fs::write(&document_path, "not json").unwrap();

        let err = cmd_parse(&document_path, "hne", &config_path).unwrap_err();
        assert_eq!(err.code, EXIT_PARSE);
    }

    #[test]
    fn empty_document_parses_to_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("recon.toml");
        std::fs::write(&config_path, CONFIG).unwrap();
        let document_path = dir.path().join("doc.json");
        std::fs::write(&document_path, r#"{"chunks": []}"#).unwrap();

        cmd_parse(&document_path, "hne", &config_path).unwrap();
    }
}

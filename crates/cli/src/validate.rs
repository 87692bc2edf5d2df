//! `tally validate`: parse and validate a recon config without touching
//! any input files.

use std::path::Path;

use tally_recon::ReconConfig;

use crate::CliError;

pub fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config_text = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", config_path.display())))?;
    let config = ReconConfig::from_toml(&config_text).map_err(CliError::recon)?;
    eprintln!("valid: '{}' with {} carrier(s)", config.name, config.carriers.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::exit_codes::{EXIT_IO, EXIT_RECON_INVALID_CONFIG};

    #[test]
    fn valid_config_passes() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("recon.toml");
        std::fs::write(
            &config_path,
            r#"
name = "february"
enrollment_file = "enrollment.csv"

[carriers.hne]
name = "Health New England"
kind = "title_row"
table_marker = "Incentive ID : Broker Commission"
"#,
        )
        .unwrap();

        cmd_validate(&config_path).unwrap();
    }

    #[test]
    fn config_without_carriers_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("recon.toml");
        std::fs::write(&config_path, "name = \"empty\"\nenrollment_file = \"e.csv\"\n")
            .unwrap();

        let err = cmd_validate(&config_path).unwrap_err();
        assert_eq!(err.code, EXIT_RECON_INVALID_CONFIG);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = cmd_validate(Path::new("/nonexistent/recon.toml")).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
    }
}

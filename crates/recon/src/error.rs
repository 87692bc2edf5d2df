use std::fmt;

/// Errors surfaced by the reconciliation engine.
///
/// Malformed statement rows never raise: they are skipped and reported as
/// structured [`SkippedRow`](crate::model::SkippedRow) values. Only missing
/// external inputs and unusable configuration abort a run.
#[derive(Debug)]
pub enum ReconError {
    /// TOML config failed to parse.
    ConfigParse(String),
    /// Config parsed but failed semantic validation.
    ConfigValidation(String),
    /// A carrier code was referenced that the config does not define.
    UnknownCarrier(String),
    /// An extraction-response document could not be decoded.
    DocumentDecode(String),
    /// The enrollment ledger is missing a required column.
    LedgerColumn { column: String },
    /// Underlying IO failure (file read, CSV reader).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownCarrier(code) => write!(f, "unknown carrier: {code}"),
            Self::DocumentDecode(msg) => write!(f, "document decode error: {msg}"),
            Self::LedgerColumn { column } => {
                write!(f, "enrollment ledger missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

//! CLI exit code registry.
//!
//! Single source of truth for every exit code the `tally` binary can
//! return. Exit codes are part of the shell contract; reconciliation
//! pipelines branch on them, so changing a value is a breaking change.
//!
//! | Range  | Owner     | Meaning                                   |
//! |--------|-----------|-------------------------------------------|
//! | 0      | universal | success                                   |
//! | 1      | universal | reserved (unspecified failure)            |
//! | 2      | universal | usage error (bad flags, unknown carrier)  |
//! | 3      | universal | I/O error (unreadable or unwritable file) |
//! | 4      | universal | parse error (malformed document or ledger)|
//! | 10..19 | recon     | reconciliation outcomes                   |

// ============================================================
// Universal codes
// ============================================================

/// Command completed successfully.
pub const EXIT_SUCCESS: u8 = 0;

/// Bad invocation: invalid flag values or a carrier the config does
/// not define.
pub const EXIT_USAGE: u8 = 2;

/// A file could not be read.
pub const EXIT_IO: u8 = 3;

/// An input decoded but its contents were malformed: a document that
/// is not chunked JSON, or an enrollment ledger missing a required
/// column.
pub const EXIT_PARSE: u8 = 4;

// ============================================================
// Reconciliation codes (10..19)
// ============================================================

/// The recon config parsed but failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 10;

/// Reconciliation ran to completion and produced findings that need
/// review: discrepancies or unmatched entries.
pub const EXIT_RECON_FINDINGS: u8 = 11;

/// Reconciliation could not complete: report serialization or output
/// write failed.
pub const EXIT_RECON_RUNTIME: u8 = 12;

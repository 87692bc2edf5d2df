//! `tally-recon` is the commission reconciliation engine: carrier
//! statement parsing, identifier normalization, exact matching against
//! the enrollment ledger, variance analysis and portfolio rollup.
//!
//! The crate is deliberately pure: it never touches the filesystem or
//! the network. Callers load extraction documents and the enrollment
//! ledger, hand both to [`run`], and get a [`ReconReport`] back.

pub mod aggregate;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod mapper;
pub mod model;
pub mod money;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod similarity;

pub use config::ReconConfig;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use model::{ReconInput, ReconReport, ReconciliationResult};
pub use money::Money;

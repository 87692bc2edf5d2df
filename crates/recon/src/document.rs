//! Extraction-response documents.
//!
//! An upstream extraction service turns each statement PDF into a JSON
//! document of chunks; tables arrive as embedded `<table>` markup inside a
//! chunk's markdown. This module decodes the JSON shape and tokenizes the
//! markup into rows of cell text.

use regex::Regex;
use serde::Deserialize;

use crate::error::ReconError;

/// A decoded extraction response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

/// One extracted region of the source PDF, in reading order.
#[derive(Debug, Clone, Deserialize)]
pub struct Chunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    #[serde(default)]
    pub markdown: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Table,
    Text,
    /// Anything else the extraction service labels (marginalia, figures).
    #[serde(other)]
    Other,
}

impl Document {
    pub fn from_json(data: &str) -> Result<Document, ReconError> {
        serde_json::from_str(data).map_err(|e| ReconError::DocumentDecode(e.to_string()))
    }
}

impl Chunk {
    pub fn is_table(&self) -> bool {
        self.kind == ChunkKind::Table
    }
}

/// Tokenize table markup into rows of trimmed cell text. Rows without any
/// `<td>` cells are dropped.
pub fn table_rows(markdown: &str) -> Vec<Vec<String>> {
    let row_re = Regex::new(r"<tr>(.*?)</tr>").unwrap();
    let cell_re = Regex::new(r"<td[^>]*>([^<]*)</td>").unwrap();

    let mut rows = Vec::new();
    for row in row_re.captures_iter(markdown) {
        let cells: Vec<String> = cell_re
            .captures_iter(&row[1])
            .map(|c| c[1].trim().to_string())
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

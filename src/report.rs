//! Plain-text summaries printed after a run.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cooccurrence::{CooccurrenceMatrix, PairSpec};
use crate::family::Family;

/// Diagnostics for one processed family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    pub family: Family,
    /// Distinct tokens before merging.
    pub vocabulary_size: usize,
    /// Indicator column names after merging.
    pub columns: Vec<String>,
}

/// Diagnostics for a whole pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub rows: usize,
    pub families: Vec<FamilyReport>,
}

impl PipelineReport {
    pub fn family(&self, family: Family) -> Option<&FamilyReport> {
        self.families.iter().find(|r| r.family == family)
    }
}

/// Per-family token and column counts.
pub fn format_family_summary(report: &PipelineReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rows processed: {}", report.rows);
    for family in &report.families {
        let _ = writeln!(
            out,
            "\n{}: {} distinct tokens before merging, {} columns after merging",
            family.family.source_column(),
            family.vocabulary_size,
            family.columns.len()
        );
        for column in &family.columns {
            let _ = writeln!(out, "  {column}");
        }
    }
    out
}

/// The `n` largest cells of a matrix, one `row\tcolumn\tcount` line each.
pub fn format_top_pairs(pair: &PairSpec, matrix: &CooccurrenceMatrix, n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Top {n} {}:", pair.title());
    let top = matrix.top(n);
    if top.is_empty() {
        let _ = match pair.threshold {
            Some(t) => writeln!(out, "  (no rows above threshold {t})"),
            None => writeln!(out, "  (no co-occurrences)"),
        };
    }
    for entry in top {
        let _ = writeln!(out, "  {}\t{}\t{}", entry.row, entry.column, entry.count);
    }
    out
}

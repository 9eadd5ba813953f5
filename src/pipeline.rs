//! Encodes and merges every family of an incident table, one after another.

use log::info;

use crate::encode::one_hot_encode;
use crate::error::{PipelineError, Result};
use crate::family::Family;
use crate::merge::RuleBook;
use crate::report::{FamilyReport, PipelineReport};
use crate::table::{RawTable, WideTable};
use crate::vocabulary::Vocabulary;

pub struct Pipeline {
    rules: RuleBook,
}

impl Pipeline {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    /// Pipeline using the curated rules shipped with the crate.
    pub fn with_builtin_rules() -> Result<Self> {
        Ok(Self::new(RuleBook::builtin()?))
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Replaces all four raw family columns by their merged indicator columns.
    ///
    /// Fails before touching anything when a family column is missing.
    pub fn run(&self, raw: RawTable) -> Result<(WideTable, PipelineReport)> {
        raw.require_families(&Family::ALL)?;
        let mut wide = WideTable::from_raw(raw);
        let mut report = PipelineReport {
            rows: wide.len(),
            families: Vec::with_capacity(Family::ALL.len()),
        };
        for family in Family::ALL {
            report.families.push(self.process_family(&mut wide, family)?);
        }
        Ok((wide, report))
    }

    /// Vocabulary, encoding and merging for a single family.
    pub fn process_family(&self, wide: &mut WideTable, family: Family) -> Result<FamilyReport> {
        let cells = wide
            .take_column(family.source_column())
            .ok_or_else(|| PipelineError::MissingColumns(vec![family.source_column().to_string()]))?;

        let vocabulary = Vocabulary::build(cells.iter().map(Option::as_deref));
        let encoded = one_hot_encode(family, cells.iter().map(Option::as_deref), &vocabulary);
        let merged = match self.rules.get(family) {
            Some(rules) => rules.apply(encoded),
            None => encoded,
        };

        let report = FamilyReport {
            family,
            vocabulary_size: vocabulary.len(),
            columns: merged.column_names(),
        };
        info!(
            "{}: {} distinct tokens before merging, {} columns after merging",
            family.source_column(),
            report.vocabulary_size,
            report.columns.len()
        );
        wide.push_family(merged);
        Ok(report)
    }
}

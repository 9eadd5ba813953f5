//! Hand-off point to heatmap rendering.
//!
//! The pipeline does not draw anything itself. A renderer receives each
//! (thresholded) matrix with its title; the bundled implementation writes a
//! labelled grid file per matrix for an external charting tool.

use std::path::{Path, PathBuf};

use log::debug;

use crate::cooccurrence::{CooccurrenceMatrix, PairSpec};
use crate::error::Result;
use crate::export::{self, ExportFormat, StagedOutputs};

pub trait MatrixRenderer {
    fn render(&mut self, pair: &PairSpec, matrix: &CooccurrenceMatrix) -> Result<()>;
}

/// Renders each matrix to `<stem>_<timestamp>_<rows>_vs_<columns>[_t<threshold>].<ext>`.
///
/// Nothing touches the disk until the staged files are committed.
#[derive(Debug)]
pub struct MatrixFileExporter {
    dir: PathBuf,
    stem: String,
    stamp: String,
    format: ExportFormat,
    staged: StagedOutputs,
}

impl MatrixFileExporter {
    pub fn new(dir: &Path, stem: &str, stamp: &str, format: ExportFormat) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            stamp: stamp.to_string(),
            format,
            staged: StagedOutputs::new(),
        }
    }

    /// Target paths rendered so far, in render order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.staged.paths()
    }

    pub fn into_staged(self) -> StagedOutputs {
        self.staged
    }
}

/// File name part identifying a pair. Pairs over the same families differ by threshold.
pub fn pair_suffix(pair: &PairSpec) -> String {
    let mut suffix = format!(
        "{}_vs_{}",
        export::file_safe(pair.rows.name()),
        export::file_safe(pair.columns.name())
    );
    if let Some(threshold) = pair.threshold {
        suffix.push_str(&format!("_t{threshold}"));
    }
    suffix
}

impl MatrixRenderer for MatrixFileExporter {
    fn render(&mut self, pair: &PairSpec, matrix: &CooccurrenceMatrix) -> Result<()> {
        let path = export::timestamped_path(
            &self.dir,
            &self.stem,
            &self.stamp,
            &pair_suffix(pair),
            self.format,
        );
        let mut bytes = Vec::new();
        export::write_matrix(&mut bytes, matrix, self.format)?;
        debug!("{}: staged {}", pair.title(), path.display());
        self.staged.push(path, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{FamilyTable, IndicatorColumn};
    use crate::family::Family;

    #[test]
    fn writes_one_labelled_grid_per_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let tech = FamilyTable::new(
            Family::Technology,
            2,
            vec![IndicatorColumn::new("nlp", vec![true, true])],
        );
        let issue = FamilyTable::new(
            Family::Issue,
            2,
            vec![
                IndicatorColumn::new("privacy", vec![true, false]),
                IndicatorColumn::new("=bias", vec![true, true]),
            ],
        );
        let matrix = CooccurrenceMatrix::build(&tech, &issue);
        let pair = PairSpec::new(Family::Technology, Family::Issue, None);

        let mut exporter =
            MatrixFileExporter::new(dir.path(), "incidents", "20260101_000000", ExportFormat::Csv);
        exporter.render(&pair, &matrix).unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        let written = exporter.into_staged().commit().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("incidents_20260101_000000_technology_vs_issue.csv"));
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            content,
            "Technology \\ Issue,issue_privacy,issue_=bias\ntech_nlp,1,2\n"
        );
    }

    #[test]
    fn thresholds_keep_same_family_pairs_apart() {
        let dir = tempfile::tempdir().unwrap();
        let tech = FamilyTable::new(
            Family::Technology,
            3,
            vec![IndicatorColumn::new("nlp", vec![true, true, false])],
        );
        let issue = FamilyTable::new(
            Family::Issue,
            3,
            vec![IndicatorColumn::new("privacy", vec![true, false, false])],
        );
        let matrix = CooccurrenceMatrix::build(&tech, &issue);
        let loose = PairSpec::new(Family::Technology, Family::Issue, Some(0));
        let strict = PairSpec::new(Family::Technology, Family::Issue, Some(5));

        let mut exporter =
            MatrixFileExporter::new(dir.path(), "inc", "20260101_000000", ExportFormat::Csv);
        exporter.render(&loose, &matrix.clone().retain_rows_above(0)).unwrap();
        exporter.render(&strict, &matrix.retain_rows_above(5)).unwrap();

        let written = exporter.into_staged().commit().unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("inc_20260101_000000_technology_vs_issue_t0.csv"));
        assert!(written[1].ends_with("inc_20260101_000000_technology_vs_issue_t5.csv"));
        assert_eq!(
            std::fs::read_to_string(&written[0]).unwrap(),
            "Technology \\ Issue,issue_privacy\ntech_nlp,1\n"
        );
        assert_eq!(
            std::fs::read_to_string(&written[1]).unwrap(),
            "Technology \\ Issue,issue_privacy\n"
        );
    }
}

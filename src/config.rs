use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cooccurrence::{PairSpec, default_pairs};
use crate::error::{PipelineError, Result};
use crate::export::ExportFormat;

/// Options for a full run. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// Directory with `<family>.json` merge rules. Built-in rules when unset.
    pub rules_dir: Option<PathBuf>,
    /// Exact path for the wide table. Generated inside `output_dir` when unset.
    pub output: Option<PathBuf>,
    /// Directory for generated output files.
    pub output_dir: PathBuf,
    pub export_format: ExportFormat,
    /// Family pairs to cross, in report order.
    pub pairs: Vec<PairSpec>,
    /// Number of ranked pairs printed per matrix.
    pub top_n: usize,
    /// Build matrices on the rayon thread pool.
    pub parallel: bool,
    /// Write each thresholded matrix to its own file.
    pub export_matrices: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rules_dir: None,
            output: None,
            output_dir: PathBuf::from("."),
            export_format: ExportFormat::Csv,
            pairs: default_pairs(),
            top_n: 10,
            parallel: false,
            export_matrices: true,
        }
    }
}

impl PipelineOptions {
    /// Reads options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&json).map_err(|e| {
            PipelineError::Configuration(format!("{}: {e}", path.display()))
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PipelineError::Configuration(
                "top_n must be at least 1".to_string(),
            ));
        }
        for (i, pair) in self.pairs.iter().enumerate() {
            if self.pairs[..i].contains(pair) {
                return Err(PipelineError::Configuration(format!(
                    "pair {pair} is listed more than once"
                )));
            }
        }
        Ok(())
    }
}

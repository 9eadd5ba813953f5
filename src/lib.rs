//! # incident_onehot
//!
//! Turns the free-text multi-value fields of an incident table
//! (`Technology(ies)`, `Sector(s)`, `Issue(s)`, `Transparency`) into one-hot
//! indicator columns, folds spelling and phrasing variants together with
//! curated merge rules, and counts how often categories of two families occur
//! on the same incident.
//!
//! ```no_run
//! use std::path::Path;
//! use incident_onehot::{PipelineOptions, run};
//!
//! let report = run(Path::new("incidents.csv"), &PipelineOptions::default())?;
//! println!("{}", report.summary);
//! # Ok::<(), incident_onehot::PipelineError>(())
//! ```

pub mod config;
pub mod cooccurrence;
pub mod encode;
pub mod error;
pub mod export;
pub mod family;
pub mod merge;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod table;
pub mod tokenize;
pub mod vocabulary;

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

pub use config::PipelineOptions;
pub use cooccurrence::{CooccurrenceMatrix, PairSpec, RankedPair, build_all, build_pair, default_pairs};
pub use encode::{FamilyTable, IndicatorColumn, one_hot_encode};
pub use error::{MergeRuleError, PipelineError, Result};
pub use export::{ExportFormat, StagedOutputs, csv_safe_cell, write_matrix, write_wide_table};
pub use family::Family;
pub use merge::{MergeGroup, MergeRules, RuleBook};
pub use pipeline::Pipeline;
pub use render::{MatrixFileExporter, MatrixRenderer};
pub use report::{FamilyReport, PipelineReport, format_family_summary, format_top_pairs};
pub use table::{RawTable, WideTable};
pub use tokenize::tokenize;
pub use vocabulary::Vocabulary;

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pipeline: PipelineReport,
    /// Where the wide table was written.
    pub wide_table: PathBuf,
    /// Matrix files, in pair order. Empty when matrix export is off.
    pub matrices: Vec<PathBuf>,
    /// Text printed by the CLI: family diagnostics, then top pairs per matrix.
    pub summary: String,
}

/// Loads `input`, runs the pipeline, builds the co-occurrence matrices and
/// writes the outputs.
///
/// All outputs are rendered in memory and committed as one batch, so a failing
/// run leaves no output files behind.
pub fn run(input: &Path, options: &PipelineOptions) -> Result<RunReport> {
    options.validate()?;
    let pipeline = match &options.rules_dir {
        Some(dir) => Pipeline::new(RuleBook::from_dir(dir)?),
        None => Pipeline::with_builtin_rules()?,
    };

    let raw = RawTable::load(input)?;
    info!("loaded {} rows from {}", raw.len(), input.display());
    let (wide, report) = pipeline.run(raw)?;
    let matrices = build_all(&wide, &options.pairs, options.parallel);

    let mut summary = format_family_summary(&report);
    for (pair, matrix) in &matrices {
        summary.push('\n');
        summary.push_str(&format_top_pairs(pair, matrix, options.top_n));
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("incidents");
    let stamp = export::timestamp(Local::now());

    let wide_table = options.output.clone().unwrap_or_else(|| {
        export::timestamped_path(
            &options.output_dir,
            stem,
            &stamp,
            "wide",
            options.export_format,
        )
    });
    let mut outputs = StagedOutputs::new();
    let mut bytes = Vec::new();
    write_wide_table(&mut bytes, &wide, options.export_format)?;
    outputs.push(wide_table.clone(), bytes);

    let mut exported = Vec::new();
    if options.export_matrices {
        let mut exporter =
            MatrixFileExporter::new(&options.output_dir, stem, &stamp, options.export_format);
        for (pair, matrix) in &matrices {
            exporter.render(pair, matrix)?;
        }
        exported = exporter.paths();
        outputs.append(exporter.into_staged());
    }

    outputs.commit()?;
    info!(
        "wrote {} rows x {} columns to {}",
        wide.len(),
        wide.headers().len(),
        wide_table.display()
    );
    for path in &exported {
        info!("wrote {}", path.display());
    }

    Ok(RunReport {
        pipeline: report,
        wide_table,
        matrices: exported,
        summary,
    })
}

#![forbid(unsafe_code)]
//! # incident_onehot CLI
//!
//! Encodes the multi-value category fields of an incident table into merged
//! one-hot columns, writes the wide table, and reports family co-occurrences.
//!
//! ## Example
//! ```bash
//! cargo run --release -- incidents.csv --pair technology:issue:80 --top 10
//! ```
//!
//! Set `RUST_LOG=info` for per-family diagnostics. See `--help` for all options.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use incident_onehot::{ExportFormat, PairSpec, PipelineOptions, run};
use log::error;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Incident table (.csv, or .tsv for tab-separated input)
    input: PathBuf,

    /// JSON file with pipeline options; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with technology.json, sector.json, issue.json, transparency.json merge rules
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Exact output path for the wide table
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Directory for generated output files (default: current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format for exports (csv, tsv, json)
    #[arg(long)]
    export_format: Option<ExportFormat>,

    /// Family pair to cross as rows:columns[:threshold], repeatable (e.g. technology:issue:80)
    #[arg(long = "pair")]
    pairs: Vec<PairSpec>,

    /// Number of top co-occurrences printed per pair
    #[arg(long)]
    top: Option<usize>,

    /// Build co-occurrence matrices in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Do not write matrix files
    #[arg(long, default_value_t = false)]
    no_matrices: bool,
}

impl Cli {
    fn options(&self) -> incident_onehot::Result<PipelineOptions> {
        let mut options = match &self.config {
            Some(path) => PipelineOptions::load(path)?,
            None => PipelineOptions::default(),
        };
        if let Some(dir) = &self.rules_dir {
            options.rules_dir = Some(dir.clone());
        }
        if let Some(path) = &self.output {
            options.output = Some(path.clone());
        }
        if let Some(dir) = &self.output_dir {
            options.output_dir = dir.clone();
        }
        if let Some(format) = self.export_format {
            options.export_format = format;
        }
        if !self.pairs.is_empty() {
            options.pairs = self.pairs.clone();
        }
        if let Some(top) = self.top {
            options.top_n = top;
        }
        options.parallel |= self.parallel;
        options.export_matrices &= !self.no_matrices;
        Ok(options)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = cli.options().and_then(|options| run(&cli.input, &options));
    match result {
        Ok(report) => {
            println!("{}", report.summary);
            println!("Wide table: {}", report.wide_table.display());
            for path in &report.matrices {
                println!("Matrix: {}", path.display());
            }
        }
        Err(e) => {
            error!("Error processing {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    }
}

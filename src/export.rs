//! File exports: wide table and labelled matrices as CSV, TSV or JSON.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use csv::WriterBuilder;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::cooccurrence::CooccurrenceMatrix;
use crate::error::{PipelineError, Result};
use crate::table::WideTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Neutralizes cells a spreadsheet would evaluate as a formula.
///
/// A leading `=`, `+`, `-`, `@`, tab or carriage return gets a `'` prefix.
/// Numbers such as `-3` and cells that already start with `'` are left alone.
pub fn csv_safe_cell(cell: String) -> String {
    let risky = matches!(
        cell.chars().next(),
        Some('=' | '+' | '-' | '@' | '\t' | '\r')
    );
    if risky && cell.trim().parse::<f64>().is_err() {
        format!("'{cell}")
    } else {
        cell
    }
}

/// Timestamp used in generated file names, e.g. `20261018_142501`.
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `<dir>/<stem>_<timestamp>_<suffix>.<ext>`
pub fn timestamped_path(
    dir: &Path,
    stem: &str,
    stamp: &str,
    suffix: &str,
    format: ExportFormat,
) -> PathBuf {
    dir.join(format!(
        "{stem}_{stamp}_{suffix}.{}",
        format.extension()
    ))
}

/// Makes a label usable inside a file name.
pub fn file_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[derive(Serialize)]
struct JsonTable<'a> {
    columns: &'a [String],
    rows: &'a [Vec<String>],
}

#[derive(Serialize)]
struct JsonMatrix<'a> {
    rows: Vec<String>,
    columns: Vec<String>,
    counts: &'a [Vec<u32>],
}

fn write_delimited<W: Write>(
    out: W,
    format: ExportFormat,
    headers: &[String],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(out);
    wtr.write_record(headers.iter().cloned().map(csv_safe_cell))?;
    for row in rows {
        wtr.write_record(row.into_iter().map(csv_safe_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the wide table to any writer.
///
/// CSV and TSV output is meant to be opened in spreadsheets, so every cell
/// (passthrough values and headers included) goes through [`csv_safe_cell`].
/// JSON output carries the cells unchanged.
pub fn write_wide_table<W: Write>(out: W, wide: &WideTable, format: ExportFormat) -> Result<()> {
    let headers = wide.headers();
    match format {
        ExportFormat::Json => {
            let rows: Vec<Vec<String>> = wide.iter_rows().collect();
            serde_json::to_writer_pretty(
                out,
                &JsonTable {
                    columns: &headers,
                    rows: &rows,
                },
            )?;
            Ok(())
        }
        _ => write_delimited(out, format, &headers, wide.iter_rows()),
    }
}

/// Writes a matrix as a labelled grid: a corner cell, then one row per row label.
pub fn write_matrix<W: Write>(
    out: W,
    matrix: &CooccurrenceMatrix,
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(
                out,
                &JsonMatrix {
                    rows: matrix.row_labels(),
                    columns: matrix.column_labels(),
                    counts: matrix.counts(),
                },
            )?;
            Ok(())
        }
        _ => {
            let corner = format!(
                "{} \\ {}",
                matrix.row_family().label(),
                matrix.column_family().label()
            );
            let headers: Vec<String> = std::iter::once(corner)
                .chain(matrix.column_labels())
                .collect();
            let rows = matrix
                .row_labels()
                .into_iter()
                .zip(matrix.counts())
                .map(|(label, counts)| {
                    std::iter::once(label)
                        .chain(counts.iter().map(u32::to_string))
                        .collect::<Vec<String>>()
                });
            write_delimited(out, format, &headers, rows)
        }
    }
}

/// Output files rendered in memory and written as one batch.
///
/// [`StagedOutputs::commit`] writes every file to a `.tmp` sibling first and
/// only then renames them into place. If any step fails, the temporary files
/// and every file already moved into place are removed again.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, bytes: Vec<u8>) {
        self.files.push((path, bytes));
    }

    pub fn append(&mut self, other: StagedOutputs) {
        self.files.extend(other.files);
    }

    /// Target paths in staging order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes all staged files. Returns their paths in staging order.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut targets = HashSet::new();
        for (path, _) in &self.files {
            if !targets.insert(path) {
                return Err(PipelineError::Configuration(format!(
                    "{} would be written more than once",
                    path.display()
                )));
            }
        }

        let mut temps = Vec::with_capacity(self.files.len());
        for (path, bytes) in &self.files {
            match write_temp(path, bytes) {
                Ok(tmp) => temps.push(tmp),
                Err(e) => {
                    remove_all(&temps);
                    return Err(e);
                }
            }
        }

        let mut placed: Vec<PathBuf> = Vec::with_capacity(self.files.len());
        for ((path, _), tmp) in self.files.iter().zip(&temps) {
            if let Err(e) = fs::rename(tmp, path) {
                remove_all(&placed);
                remove_all(&temps[placed.len()..]);
                return Err(PipelineError::Io(std::io::Error::new(
                    e.kind(),
                    format!("cannot write {}: {e}", path.display()),
                )));
            }
            placed.push(path.clone());
        }
        Ok(placed)
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        PipelineError::Configuration(format!("{} is not a file path", path.display()))
    })?;
    let mut name = name.to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path)?;
    fs::write(&tmp, bytes)?;
    Ok(tmp)
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefixes_are_neutralized() {
        assert_eq!(csv_safe_cell("=SUM(A1)".into()), "'=SUM(A1)");
        assert_eq!(csv_safe_cell("@risk".into()), "'@risk");
        assert_eq!(csv_safe_cell("+1 555".into()), "'+1 555");
        assert_eq!(csv_safe_cell("-3".into()), "-3");
        assert_eq!(csv_safe_cell("'=already".into()), "'=already");
        assert_eq!(csv_safe_cell("plain".into()), "plain");
    }

    #[test]
    fn timestamped_names_follow_pattern() {
        let stamp = timestamp(Local::now());
        assert_eq!(stamp.len(), 15);
        let path = timestamped_path(Path::new("out"), "incidents", &stamp, "wide", ExportFormat::Tsv);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("incidents_"));
        assert!(name.ends_with("_wide.tsv"));
    }

    #[test]
    fn file_safe_replaces_punctuation() {
        assert_eq!(file_safe("Technology - Issue"), "technology___issue");
    }

    #[test]
    fn commit_writes_every_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedOutputs::new();
        staged.push(dir.path().join("a.csv"), b"a\n".to_vec());
        staged.push(dir.path().join("nested").join("b.csv"), b"b\n".to_vec());

        let written = staged.commit().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "a\n");
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "b\n");
        assert!(!dir.path().join("a.csv.tmp").exists());
    }

    #[test]
    fn failed_commit_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked.csv");
        fs::create_dir(&blocked).unwrap();

        let mut staged = StagedOutputs::new();
        staged.push(dir.path().join("first.csv"), b"1\n".to_vec());
        staged.push(blocked.clone(), b"2\n".to_vec());
        staged.push(dir.path().join("last.csv"), b"3\n".to_vec());
        assert!(staged.commit().is_err());

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left, vec!["blocked.csv"]);
        assert!(blocked.is_dir());
    }

    #[test]
    fn same_target_twice_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.csv");
        let mut staged = StagedOutputs::new();
        staged.push(path.clone(), b"1\n".to_vec());
        staged.push(path.clone(), b"2\n".to_vec());
        assert!(matches!(staged.commit(), Err(PipelineError::Configuration(_))));
        assert!(!path.exists());
    }
}

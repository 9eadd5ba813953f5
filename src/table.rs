//! Loading of the incident table and the wide output table.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::ReaderBuilder;

use crate::encode::FamilyTable;
use crate::error::{PipelineError, Result};
use crate::family::Family;

/// Field delimiter for a path: tab for `.tsv`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Row-oriented input table with all-empty rows removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table, fitting rows to the header width and dropping rows with
    /// no content.
    ///
    /// A row counts as empty when every cell is blank after trimming, so rows
    /// of whitespace-only cells are dropped too. Short rows are padded with
    /// empty cells; longer rows are cut to the header width, which
    /// [`RawTable::from_reader`] only allows for trailing blank cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(String::is_empty) {
            return Err(PipelineError::EmptyInput);
        }
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let overflows = record
                .iter()
                .skip(headers.len())
                .any(|cell| !cell.trim().is_empty());
            if overflows {
                return Err(PipelineError::ExtraFields {
                    line: record.position().map_or(0, |p| p.line()),
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(headers, rows))
    }

    /// Reads a CSV file, or a TSV file when the extension is `.tsv`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            PipelineError::Io(io::Error::new(
                e.kind(),
                format!("cannot open {}: {e}", path.display()),
            ))
        })?;
        Self::from_reader(file, delimiter_for(path))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fails with every missing family column listed.
    pub fn require_families(&self, families: &[Family]) -> Result<()> {
        let missing: Vec<String> = families
            .iter()
            .map(|f| f.source_column())
            .filter(|name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::MissingColumns(missing))
        }
    }
}

/// Passthrough fields followed by the encoded indicator columns of each family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    families: Vec<FamilyTable>,
}

impl WideTable {
    /// Starts with every input column as a passthrough column.
    pub fn from_raw(raw: RawTable) -> Self {
        Self {
            headers: raw.headers,
            rows: raw.rows,
            families: Vec::new(),
        }
    }

    /// Removes a passthrough column and returns its cells in row order.
    /// Blank cells come back as `None`.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<Option<String>>> {
        let index = self.headers.iter().position(|h| h == name)?;
        self.headers.remove(index);
        let cells = self
            .rows
            .iter_mut()
            .map(|row| {
                let cell = row.remove(index);
                if cell.trim().is_empty() {
                    None
                } else {
                    Some(cell)
                }
            })
            .collect();
        Some(cells)
    }

    /// Appends a family's indicator columns after everything already present.
    pub fn push_family(&mut self, table: FamilyTable) {
        debug_assert_eq!(table.rows(), self.rows.len());
        self.families.retain(|t| t.family() != table.family());
        self.families.push(table);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn passthrough_headers(&self) -> &[String] {
        &self.headers
    }

    pub fn family(&self, family: Family) -> Option<&FamilyTable> {
        self.families.iter().find(|t| t.family() == family)
    }

    pub fn families(&self) -> &[FamilyTable] {
        &self.families
    }

    /// All output column names: passthrough first, then indicators per family.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        for table in &self.families {
            headers.extend(table.column_names());
        }
        headers
    }

    /// Passthrough cells of a row followed by its `0`/`1` indicator values.
    pub fn row(&self, index: usize) -> Vec<String> {
        let mut row = self.rows[index].clone();
        for table in &self.families {
            row.extend(
                table
                    .columns()
                    .iter()
                    .map(|column| column.flag(index).to_string()),
            );
        }
        row
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        (0..self.len()).map(|index| self.row(index))
    }
}

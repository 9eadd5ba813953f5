//! Joint-membership counts between the indicator columns of two families.

use std::fmt;
use std::str::FromStr;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::encode::FamilyTable;
use crate::family::Family;
use crate::table::WideTable;

/// Which two families to cross, and the row threshold applied afterwards.
///
/// Written as `rows:columns[:threshold]`, e.g. `technology:issue:80`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSpec {
    pub rows: Family,
    pub columns: Family,
    #[serde(default)]
    pub threshold: Option<u32>,
}

impl PairSpec {
    pub fn new(rows: Family, columns: Family, threshold: Option<u32>) -> Self {
        Self {
            rows,
            columns,
            threshold,
        }
    }

    /// Heatmap title, e.g. `Technology - Issue`.
    pub fn title(&self) -> String {
        format!("{} - {}", self.rows.label(), self.columns.label())
    }
}

impl fmt::Display for PairSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rows, self.columns)?;
        if let Some(threshold) = self.threshold {
            write!(f, ":{threshold}")?;
        }
        Ok(())
    }
}

impl FromStr for PairSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (rows, columns, threshold) = match parts.as_slice() {
            [rows, columns] => (rows, columns, None),
            [rows, columns, threshold] => {
                let threshold = threshold
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("invalid threshold '{threshold}': {e}"))?;
                (rows, columns, Some(threshold))
            }
            _ => return Err(format!("expected rows:columns[:threshold], got '{s}'")),
        };
        Ok(Self::new(rows.parse()?, columns.parse()?, threshold))
    }
}

/// Family pairs and thresholds reported by default.
pub fn default_pairs() -> Vec<PairSpec> {
    use Family::*;
    vec![
        PairSpec::new(Technology, Issue, Some(80)),
        PairSpec::new(Issue, Technology, Some(30)),
        PairSpec::new(Technology, Sector, Some(30)),
        PairSpec::new(Sector, Issue, Some(30)),
        PairSpec::new(Transparency, Issue, Some(30)),
        PairSpec::new(Issue, Transparency, Some(30)),
        PairSpec::new(Sector, Transparency, Some(30)),
    ]
}

/// One cell of a matrix, labelled with exported column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPair {
    pub row: String,
    pub column: String,
    pub count: u32,
}

/// Counts of records where a row indicator and a column indicator are both set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooccurrenceMatrix {
    row_family: Family,
    column_family: Family,
    row_tokens: Vec<String>,
    column_tokens: Vec<String>,
    counts: Vec<Vec<u32>>,
}

impl CooccurrenceMatrix {
    /// Full matrix over every column of both tables. Tables must cover the same records.
    pub fn build(rows: &FamilyTable, columns: &FamilyTable) -> Self {
        debug_assert_eq!(rows.rows(), columns.rows());
        let counts = rows
            .columns()
            .iter()
            .map(|a| {
                columns
                    .columns()
                    .iter()
                    .map(|b| {
                        a.values()
                            .iter()
                            .zip(b.values())
                            .filter(|(x, y)| **x && **y)
                            .count() as u32
                    })
                    .collect()
            })
            .collect();

        Self {
            row_family: rows.family(),
            column_family: columns.family(),
            row_tokens: rows.tokens().map(str::to_string).collect(),
            column_tokens: columns.tokens().map(str::to_string).collect(),
            counts,
        }
    }

    pub fn row_family(&self) -> Family {
        self.row_family
    }

    pub fn column_family(&self) -> Family {
        self.column_family
    }

    pub fn row_tokens(&self) -> &[String] {
        &self.row_tokens
    }

    pub fn column_tokens(&self) -> &[String] {
        &self.column_tokens
    }

    /// Row labels as exported column names.
    pub fn row_labels(&self) -> Vec<String> {
        self.row_tokens
            .iter()
            .map(|t| self.row_family.column_name(t))
            .collect()
    }

    /// Column labels as exported column names.
    pub fn column_labels(&self) -> Vec<String> {
        self.column_tokens
            .iter()
            .map(|t| self.column_family.column_name(t))
            .collect()
    }

    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.row_tokens.is_empty() || self.column_tokens.is_empty()
    }

    /// Count for a pair of tokens, if both are present.
    pub fn get(&self, row_token: &str, column_token: &str) -> Option<u32> {
        let r = self.row_tokens.iter().position(|t| t == row_token)?;
        let c = self.column_tokens.iter().position(|t| t == column_token)?;
        Some(self.counts[r][c])
    }

    /// Keeps only rows whose largest count is strictly above `threshold`.
    pub fn retain_rows_above(mut self, threshold: u32) -> Self {
        let keep: Vec<bool> = self
            .counts
            .iter()
            .map(|row| row.iter().copied().max().unwrap_or(0) > threshold)
            .collect();
        let mut flags = keep.iter();
        self.row_tokens.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.counts.retain(|_| *flags.next().unwrap_or(&false));
        self
    }

    /// Every cell, sorted by count descending. Ties keep row-major order.
    pub fn ranked(&self) -> Vec<RankedPair> {
        let row_labels = self.row_labels();
        let column_labels = self.column_labels();
        let mut pairs: Vec<RankedPair> = row_labels
            .iter()
            .zip(&self.counts)
            .flat_map(|(row, counts)| {
                column_labels
                    .iter()
                    .zip(counts)
                    .map(move |(column, &count)| RankedPair {
                        row: row.clone(),
                        column: column.clone(),
                        count,
                    })
            })
            .collect();
        pairs.sort_by(|a, b| b.count.cmp(&a.count));
        pairs
    }

    /// The `n` highest cells.
    pub fn top(&self, n: usize) -> Vec<RankedPair> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

/// Builds the matrix for one pair, applying the pair's threshold.
///
/// Returns `None` when either family has not been encoded into the table.
pub fn build_pair(wide: &WideTable, pair: &PairSpec) -> Option<CooccurrenceMatrix> {
    let rows = wide.family(pair.rows)?;
    let columns = wide.family(pair.columns)?;
    let matrix = CooccurrenceMatrix::build(rows, columns);
    let matrix = match pair.threshold {
        Some(threshold) => matrix.retain_rows_above(threshold),
        None => matrix,
    };
    debug!(
        "{pair}: {} x {} matrix",
        matrix.row_tokens().len(),
        matrix.column_tokens().len()
    );
    Some(matrix)
}

/// Builds every requested pair, in order. Pairs are independent, so they can
/// be computed on the rayon pool when `parallel` is set.
pub fn build_all(
    wide: &WideTable,
    pairs: &[PairSpec],
    parallel: bool,
) -> Vec<(PairSpec, CooccurrenceMatrix)> {
    let build = |pair: &PairSpec| build_pair(wide, pair).map(|m| (*pair, m));
    if parallel {
        pairs.par_iter().filter_map(build).collect()
    } else {
        pairs.iter().filter_map(build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::IndicatorColumn;

    fn family(family: Family, columns: &[(&str, &[u8])]) -> FamilyTable {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let columns = columns
            .iter()
            .map(|(token, values)| {
                IndicatorColumn::new(*token, values.iter().map(|&v| v == 1).collect())
            })
            .collect();
        FamilyTable::new(family, rows, columns)
    }

    fn tech() -> FamilyTable {
        family(
            Family::Technology,
            &[("nlp", &[1, 1, 0, 1]), ("robotics", &[0, 1, 1, 0])],
        )
    }

    fn issue() -> FamilyTable {
        family(
            Family::Issue,
            &[
                ("privacy", &[1, 1, 0, 0]),
                ("safety", &[0, 1, 1, 1]),
                ("bias", &[0, 0, 0, 0]),
            ],
        )
    }

    #[test]
    fn counts_joint_membership() {
        let m = CooccurrenceMatrix::build(&tech(), &issue());
        assert_eq!(m.counts(), &[vec![2, 2, 0], vec![1, 2, 0]]);
        assert_eq!(m.get("robotics", "safety"), Some(2));
        assert_eq!(m.get("robotics", "unknown"), None);
        assert_eq!(m.row_labels(), vec!["tech_nlp", "tech_robotics"]);
    }

    #[test]
    fn transposed_pairs_agree() {
        let ab = CooccurrenceMatrix::build(&tech(), &issue());
        let ba = CooccurrenceMatrix::build(&issue(), &tech());
        for a in ab.row_tokens() {
            for b in ab.column_tokens() {
                assert_eq!(ab.get(a, b), ba.get(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn threshold_drops_rows_not_above_it() {
        let m = CooccurrenceMatrix::build(&issue(), &tech()).retain_rows_above(1);
        assert_eq!(m.row_tokens(), &["privacy".to_string(), "safety".to_string()]);
        assert_eq!(m.counts().len(), 2);

        let m = CooccurrenceMatrix::build(&issue(), &tech()).retain_rows_above(2);
        assert!(m.row_tokens().is_empty());
        assert!(m.ranked().is_empty());
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let m = CooccurrenceMatrix::build(&tech(), &issue());
        let ranked = m.ranked();
        assert_eq!(ranked.len(), 6);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(
            ranked[0],
            RankedPair {
                row: "tech_nlp".to_string(),
                column: "issue_privacy".to_string(),
                count: 2,
            }
        );
        assert_eq!(ranked[1].column, "issue_safety");
        assert_eq!(m.top(2).len(), 2);
    }

    #[test]
    fn parses_pair_specs() {
        let pair: PairSpec = "technology:issue:80".parse().unwrap();
        assert_eq!(
            pair,
            PairSpec::new(Family::Technology, Family::Issue, Some(80))
        );
        assert_eq!(pair.to_string(), "technology:issue:80");
        let pair: PairSpec = "sector:transp".parse().unwrap();
        assert_eq!(pair.threshold, None);
        assert!("technology".parse::<PairSpec>().is_err());
        assert!("technology:issue:lots".parse::<PairSpec>().is_err());
    }

    #[test]
    fn empty_family_gives_empty_matrix() {
        let empty = FamilyTable::new(Family::Transparency, 4, Vec::new());
        let m = CooccurrenceMatrix::build(&empty, &issue());
        assert!(m.is_empty());
        assert!(m.ranked().is_empty());
    }
}

//! One-hot encoding of a family's multi-value cells.

use std::collections::HashSet;

use crate::family::Family;
use crate::tokenize::tokenize;
use crate::vocabulary::Vocabulary;

/// A 0/1 membership column for one token, aligned with the record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorColumn {
    token: String,
    values: Vec<bool>,
}

impl IndicatorColumn {
    pub fn new(token: impl Into<String>, values: Vec<bool>) -> Self {
        Self {
            token: token.into(),
            values,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Indicator value of a row as `0` or `1`.
    pub fn flag(&self, row: usize) -> u8 {
        u8::from(self.values[row])
    }

    /// Number of records where the indicator is set.
    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }

    pub(crate) fn into_values(self) -> Vec<bool> {
        self.values
    }
}

/// The indicator columns of a single family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTable {
    family: Family,
    rows: usize,
    columns: Vec<IndicatorColumn>,
}

impl FamilyTable {
    /// Builds a table from prepared columns. Every column must have `rows` values.
    pub fn new(family: Family, rows: usize, columns: Vec<IndicatorColumn>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == rows));
        Self {
            family,
            rows,
            columns,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Number of records.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[IndicatorColumn] {
        &self.columns
    }

    pub fn column(&self, token: &str) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|c| c.token == token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(IndicatorColumn::token)
    }

    /// Exported column names, e.g. `issue_privacy - consent`.
    pub fn column_names(&self) -> Vec<String> {
        self.tokens().map(|t| self.family.column_name(t)).collect()
    }

    pub(crate) fn into_columns(self) -> Vec<IndicatorColumn> {
        self.columns
    }
}

/// Encodes one cell per record into an indicator column per vocabulary token.
///
/// Each cell is tokenized once; a token's flag is set when it occurs in that
/// record. Output row `i` always corresponds to input cell `i`.
pub fn one_hot_encode<'a, I>(family: Family, cells: I, vocabulary: &Vocabulary) -> FamilyTable
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut values: Vec<Vec<bool>> = vec![Vec::new(); vocabulary.len()];
    let mut rows = 0;

    for cell in cells {
        let present: HashSet<String> = tokenize(cell).into_iter().collect();
        for (column, token) in values.iter_mut().zip(vocabulary.iter()) {
            column.push(present.contains(token));
        }
        rows += 1;
    }

    let columns = vocabulary
        .iter()
        .zip(values)
        .map(|(token, values)| IndicatorColumn::new(token, values))
        .collect();

    FamilyTable::new(family, rows, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_membership_per_record() {
        let cells = [Some("NLP; Robotics"), None, Some("robotics")];
        let vocab = Vocabulary::build(cells);
        let table = one_hot_encode(Family::Technology, cells, &vocab);

        assert_eq!(table.rows(), 3);
        assert_eq!(table.columns().len(), vocab.len());
        assert_eq!(
            table.column("nlp").unwrap().values(),
            &[true, false, false]
        );
        assert_eq!(
            table.column("robotics").unwrap().values(),
            &[true, false, true]
        );
        assert_eq!(
            table.column_names(),
            vec!["tech_nlp".to_string(), "tech_robotics".to_string()]
        );
    }

    #[test]
    fn repeated_token_in_a_cell_sets_flag_once() {
        let cells = [Some("NLP; nlp ;NLP")];
        let vocab = Vocabulary::build(cells);
        let table = one_hot_encode(Family::Technology, cells, &vocab);
        let column = table.column("nlp").unwrap();
        assert_eq!(column.flag(0), 1);
        assert_eq!(column.active_count(), 1);
    }

    #[test]
    fn empty_vocabulary_keeps_row_count() {
        let cells = [None, Some(""), Some(" , ")];
        let vocab = Vocabulary::build(cells);
        let table = one_hot_encode(Family::Transparency, cells, &vocab);
        assert_eq!(table.rows(), 3);
        assert!(table.columns().is_empty());
    }

    #[test]
    fn tokens_outside_vocabulary_are_ignored() {
        let vocab = Vocabulary::build([Some("chatbot")]);
        let table = one_hot_encode(Family::Technology, [Some("Chatbot; drone")], &vocab);
        assert_eq!(table.column_names(), vec!["tech_chatbot".to_string()]);
        assert_eq!(table.column("chatbot").unwrap().values(), &[true]);
    }
}

use std::collections::BTreeSet;

use crate::tokenize::tokenize;

/// Distinct tokens observed in one family's column.
///
/// Backed by a `BTreeSet`, so iteration is lexicographic and the indicator
/// columns derived from it come out in a reproducible order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: BTreeSet<String>,
}

impl Vocabulary {
    /// Collects every token of every cell. Missing cells contribute nothing.
    pub fn build<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let tokens = cells.into_iter().flat_map(tokenize).collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Tokens in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_sorted_tokens() {
        let cells = [
            Some("Robotics; NLP"),
            None,
            Some("nlp, Chatbot"),
            Some(" robotics "),
        ];
        let vocab = Vocabulary::build(cells);
        assert_eq!(vocab.len(), 3);
        assert_eq!(
            vocab.iter().collect::<Vec<_>>(),
            vec!["chatbot", "nlp", "robotics"]
        );
        assert!(vocab.contains("nlp"));
        assert!(!vocab.contains("NLP"));
    }

    #[test]
    fn all_missing_column_is_empty() {
        let vocab = Vocabulary::build([None, Some(""), Some(" ; ")]);
        assert!(vocab.is_empty());
    }
}

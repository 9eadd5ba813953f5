//! Splitting of raw multi-value cells into normalized tokens.

/// Characters separating the values of a multi-value cell.
pub const DELIMITERS: [char; 2] = [';', ','];

/// Splits a multi-value cell into normalized tokens.
///
/// The cell is split on `;` and `,` (mixed use is fine), each piece is trimmed
/// and lower-cased, and pieces that end up empty are dropped. A missing cell
/// yields no tokens. Duplicates inside one cell are kept; callers treat the
/// result as a membership set.
///
/// # Example
/// ```
/// use incident_onehot::tokenize;
/// let tokens = tokenize(Some("Facial Recognition; voice Synthesis"));
/// assert_eq!(tokens, vec!["facial recognition", "voice synthesis"]);
/// assert!(tokenize(None).is_empty());
/// assert!(tokenize(Some("  ,, ")).is_empty());
/// ```
pub fn tokenize(cell: Option<&str>) -> Vec<String> {
    let Some(cell) = cell else {
        return Vec::new();
    };
    cell.split(&DELIMITERS[..])
        .filter_map(normalize_token)
        .collect()
}

/// Trims and lower-cases a single value. Returns `None` when nothing is left.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(cell: Option<&str>) -> BTreeSet<String> {
        tokenize(cell).into_iter().collect()
    }

    #[test]
    fn splits_on_both_delimiters() {
        let tokens = set(Some("Facial Recognition; voice Synthesis"));
        let expected: BTreeSet<String> = ["facial recognition", "voice synthesis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);

        assert_eq!(
            tokenize(Some("Chatbot, NLP;Deepfake - video")),
            vec!["chatbot", "nlp", "deepfake - video"]
        );
    }

    #[test]
    fn missing_and_blank_cells_have_no_tokens() {
        assert!(tokenize(None).is_empty());
        assert!(tokenize(Some("")).is_empty());
        assert!(tokenize(Some("  ,, ")).is_empty());
        assert!(tokenize(Some(";;;")).is_empty());
    }

    #[test]
    fn stray_whitespace_and_repeated_delimiters_are_absorbed() {
        assert_eq!(
            tokenize(Some("  Robotics ;; ,  Drone  ,")),
            vec!["robotics", "drone"]
        );
    }

    #[test]
    fn duplicates_within_a_cell_are_kept() {
        assert_eq!(tokenize(Some("NLP; nlp")), vec!["nlp", "nlp"]);
    }
}

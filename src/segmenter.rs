//! # Ingredient Segmenter
//!
//! Splits one tagged line into several ingredients when it offers a choice
//! between two fully specified ingredients ("1 cup chickpeas or 2 cups white
//! beans"), then assembles each segment into an [`Ingredient`] skeleton whose
//! words are re-tagged in isolation.

use crate::ingredient_model::{Amount, Node, Token};
use crate::tokenizer::retag;
use log::debug;

/// A segment's amounts and its remaining name words
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub amounts: Vec<Amount>,
    pub words: Vec<Token>,
}

fn is_name_word(node: &Node) -> bool {
    node.as_word()
        .is_some_and(|t| !t.is_punctuation() && !t.is_word("or") && !t.is_word("and"))
}

/// Whether the top-level "or" at `at` separates two complete ingredients
fn splits_at(nodes: &[Node], start: usize, at: usize) -> bool {
    let before = &nodes[start..at];
    let Some(amount_index) = before.iter().position(Node::is_amount) else {
        return false;
    };
    if !before[amount_index + 1..].iter().any(is_name_word) {
        return false;
    }

    let after = &nodes[at + 1..];
    let Some(first) = after
        .iter()
        .position(|n| n.as_word().map_or(true, |t| !t.is_punctuation()))
    else {
        return false;
    };
    after[first].is_amount() && after[first + 1..].iter().any(is_name_word)
}

/// Split a tagged stream on top-level "or" between complete ingredients
///
/// An "or" splits only when an amount and at least one name word precede it
/// and the next non-punctuation node after it is an amount followed by a name.
/// "Or" inside parentheses never splits.
pub fn split_alternatives(nodes: Vec<Node>) -> Vec<Vec<Node>> {
    let mut cuts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, node) in nodes.iter().enumerate() {
        match node.as_word().map(|t| t.text.as_str()) {
            Some("(") => depth += 1,
            Some(")") => depth = depth.saturating_sub(1),
            _ if depth == 0 && node.is_word("or") && splits_at(&nodes, start, i) => {
                cuts.push(i);
                start = i + 1;
            }
            _ => {}
        }
    }

    if cuts.is_empty() {
        return vec![nodes];
    }
    debug!("Line split into {} alternative ingredients", cuts.len() + 1);

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut current = Vec::new();
    for (i, node) in nodes.into_iter().enumerate() {
        if cuts.contains(&i) {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(node);
        }
    }
    segments.push(current);
    segments
}

/// Move the first amount of a segment to its front
pub fn relocate_leading_amount(mut segment: Vec<Node>) -> Vec<Node> {
    if let Some(index) = segment.iter().position(Node::is_amount) {
        if index > 0 {
            let amount = segment.remove(index);
            segment.insert(0, amount);
        }
    }
    segment
}

/// Separate a segment's amounts from its words and re-tag the words on their own
pub fn assemble(segment: Vec<Node>) -> Segment {
    let mut amounts = Vec::new();
    let mut words = Vec::new();
    for node in relocate_leading_amount(segment) {
        match node {
            Node::Amount(amount) | Node::Qualifier(amount) => amounts.push(amount),
            Node::Word(token) => words.push(token),
        }
    }
    Segment {
        amounts,
        words: retag(&words),
    }
}

/// Split and assemble in one step
pub fn segment(nodes: Vec<Node>) -> Vec<Segment> {
    split_alternatives(nodes).into_iter().map(assemble).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount_tagger::tag_amounts;
    use crate::ingredient_model::PartOfSpeech;
    use crate::measurement_types::UnitId;
    use crate::text_processing::normalize;
    use crate::tokenizer::tokenize;

    fn segments_of(line: &str) -> Vec<Segment> {
        segment(tag_amounts(&tokenize(&normalize(line).text)))
    }

    fn texts(words: &[Token]) -> Vec<&str> {
        words.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_split_between_complete_ingredients() {
        let segments = segments_of("1 cup chickpeas or 2 cups white beans");
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].amounts[0].quantity, segments[0].amounts[0].unit), (1.0, UnitId::Cup));
        assert_eq!(texts(&segments[0].words), vec!["chickpeas"]);
        assert_eq!((segments[1].amounts[0].quantity, segments[1].amounts[0].unit), (2.0, UnitId::Cup));
        assert_eq!(texts(&segments[1].words), vec!["white", "beans"]);
    }

    #[test]
    fn test_no_split_for_name_alternatives() {
        let cases = vec![
            "2 (6-ounce) cans Italian tuna in water or oil, drained",
            "1 cup grape or cherry tomatoes",
            "1 cup or 2 tablespoons sugar",
            "salt or pepper",
        ];
        for line in cases {
            assert_eq!(segments_of(line).len(), 1, "'{}' should stay one ingredient", line);
        }
    }

    #[test]
    fn test_no_split_inside_parentheses() {
        let segments = segments_of("2 eggs (1 cup whites or 2 cups yolks)");
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_relocate_leading_amount() {
        let segments = segments_of("salt, 1 pinch");
        assert_eq!(segments[0].amounts[0].unit, UnitId::Pinch);
        assert_eq!(texts(&segments[0].words), vec!["salt", ","]);
    }

    #[test]
    fn test_words_are_retagged_in_isolation() {
        let segments = segments_of("1 cup chickpeas or 2 cups Navy beans");
        // Capitalized first word of a segment is not a proper noun
        assert_eq!(segments[1].words[0].pos, PartOfSpeech::Noun);
    }
}

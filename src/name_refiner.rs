//! # Name Refiner
//!
//! Turns the words left over after amount extraction into a clean candidate
//! name, a list of preparation modifiers and a list of stripped words.
//!
//! Refinement runs in two stages:
//!
//! - **Focus** prunes whole phrases until nothing changes: parenthetical
//!   asides, trailing punctuation, trailing comma phrases that open with a
//!   participle, preposition or determiner, the inner run of the lede phrase
//!   that starts at such a word, and leading cruft before the first noun
//! - **Unstop** makes one linear pass that drops stopwords, moves preparation
//!   modifiers to `mods`, singularizes nouns and tidies separators
//!
//! Preparation modifiers found in any pruned span are kept as mods.

use crate::ingredient_model::{PartOfSpeech, Token};
use crate::measurement_patterns::{is_prep_mod, is_stopword, IRREGULAR_PLURALS, NO_SINGULAR};
use log::{trace, warn};

/// Upper bound on focus passes; every productive pass removes at least one token
const MAX_FOCUS_PASSES: usize = 16;

/// Tokens that separate alternative name phrases
const SEPARATORS: &[&str] = &[",", "/", "or"];

/// Connectives trimmed from both ends of a name
const DANGLING: &[&str] = &[",", "/", "or", "and", "&", "nor", "but", "plus", "to"];

/// Result of refining a segment's words
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefinedName {
    pub name_tokens: Vec<String>,
    pub mods: Vec<String>,
    pub stripped_words: Vec<String>,
}

/// Refine a segment's words into a name, mods and stripped words
///
/// # Examples
///
/// ```rust
/// use ghgi::name_refiner::refine;
/// use ghgi::tokenizer::tokenize;
///
/// let refined = refine(&tokenize("Italian tuna in water or oil , drained"));
/// assert_eq!(refined.name_tokens, vec!["italian", "tuna"]);
/// assert_eq!(refined.mods, vec!["drained"]);
/// ```
pub fn refine(words: &[Token]) -> RefinedName {
    let mut mods = Vec::new();
    let focused = focus(words.to_vec(), &mut mods);
    unstop(focused, mods)
}

fn keep_mods(removed: &[Token], mods: &mut Vec<String>) {
    for token in removed {
        let lower = token.lower();
        if is_prep_mod(&lower) {
            mods.push(lower);
        }
    }
}

fn first_noun(tokens: &[Token]) -> Option<usize> {
    tokens.iter().position(|t| t.pos.is_noun())
}

/// Prune phrases until a pass leaves the tokens unchanged
pub fn focus(mut tokens: Vec<Token>, mods: &mut Vec<String>) -> Vec<Token> {
    for pass in 0..MAX_FOCUS_PASSES {
        let before = tokens.len();
        tokens = remove_parentheticals(tokens, mods);
        tokens = strip_trailing_punctuation(tokens);
        if !drop_trailing_phrase(&mut tokens, mods) {
            drop_lede_run(&mut tokens, mods);
        }
        drop_leading_cruft(&mut tokens, mods);

        if tokens.len() == before {
            trace!("Focus settled after {} passes", pass + 1);
            return tokens;
        }
    }
    warn!("Focus did not settle after {} passes", MAX_FOCUS_PASSES);
    tokens
}

/// Remove parenthesized asides
fn remove_parentheticals(tokens: Vec<Token>, mods: &mut Vec<String>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    let mut aside = Vec::new();

    for token in tokens {
        match token.text.as_str() {
            "(" => depth += 1,
            ")" if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    keep_mods(&aside, mods);
                    aside.clear();
                }
            }
            _ if depth > 0 => aside.push(token),
            _ => out.push(token),
        }
    }
    // An unclosed aside runs to the end of the line
    keep_mods(&aside, mods);
    out
}

fn strip_trailing_punctuation(mut tokens: Vec<Token>) -> Vec<Token> {
    while tokens
        .last()
        .is_some_and(|t| matches!(t.text.as_str(), "," | ";" | "."))
    {
        tokens.pop();
    }
    tokens
}

/// The token that decides whether a phrase is a distractor: its first word
/// after any adverbs and conjunctions
fn boundary(phrase: &[Token]) -> Option<&Token> {
    phrase
        .iter()
        .find(|t| !matches!(t.pos, PartOfSpeech::Adverb | PartOfSpeech::Conjunction))
}

/// Drop the last comma phrase after the first noun when it opens with a distractor
fn drop_trailing_phrase(tokens: &mut Vec<Token>, mods: &mut Vec<String>) -> bool {
    let Some(noun) = first_noun(tokens) else {
        return false;
    };
    let Some(comma) = tokens.iter().rposition(|t| t.text == ",") else {
        return false;
    };
    if comma < noun {
        return false;
    }

    let phrase = &tokens[comma + 1..];
    if !boundary(phrase).is_some_and(|t| t.pos.is_distractor()) {
        return false;
    }

    let removed = tokens.split_off(comma);
    trace!("Dropped trailing phrase {:?}", removed.iter().map(|t| &t.text).collect::<Vec<_>>());
    keep_mods(&removed, mods);
    true
}

/// Drop the run inside the lede phrase that starts at a distractor after the first noun
fn drop_lede_run(tokens: &mut Vec<Token>, mods: &mut Vec<String>) -> bool {
    let lede_end = tokens.iter().position(|t| t.text == ",").unwrap_or(tokens.len());
    let Some(noun) = first_noun(&tokens[..lede_end]) else {
        return false;
    };
    let Some(start) = tokens[noun + 1..lede_end]
        .iter()
        .position(|t| t.pos.is_distractor() || t.is_word("in"))
        .map(|offset| noun + 1 + offset)
    else {
        return false;
    };

    let removed: Vec<Token> = tokens.drain(start..lede_end).collect();
    trace!("Dropped lede run {:?}", removed.iter().map(|t| &t.text).collect::<Vec<_>>());
    keep_mods(&removed, mods);
    true
}

/// Drop words before the first noun when they open with a distractor or are
/// a single verb, gerund or number
fn drop_leading_cruft(tokens: &mut Vec<Token>, mods: &mut Vec<String>) -> bool {
    let Some(noun) = first_noun(tokens) else {
        return false;
    };
    if noun == 0 {
        return false;
    }

    let lead = &tokens[..noun];
    let lone_filler = lead.len() == 1
        && matches!(
            lead[0].pos,
            PartOfSpeech::Verb | PartOfSpeech::Gerund | PartOfSpeech::Number
        );
    if !lead[0].pos.is_distractor() && !lone_filler {
        return false;
    }

    let removed: Vec<Token> = tokens.drain(..noun).collect();
    trace!("Dropped leading cruft {:?}", removed.iter().map(|t| &t.text).collect::<Vec<_>>());
    keep_mods(&removed, mods);
    true
}

/// Reduce a plural noun to its singular form
///
/// # Examples
///
/// ```rust
/// use ghgi::name_refiner::singularize;
///
/// assert_eq!(singularize("tomatoes"), "tomato");
/// assert_eq!(singularize("berries"), "berry");
/// assert_eq!(singularize("asparagus"), "asparagus");
/// ```
pub fn singularize(word: &str) -> String {
    if let Some(singular) = IRREGULAR_PLURALS.get(word) {
        return singular.to_string();
    }
    if NO_SINGULAR.contains(word) || ["ss", "us", "is"].iter().any(|end| word.ends_with(end)) {
        return word.to_string();
    }
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{}o", stem);
    }
    if ["ches", "shes", "xes", "zes", "sses"].iter().any(|end| word.ends_with(end)) {
        return word[..word.len() - 2].to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if stem.len() > 1 => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Final linear pass over focused tokens
pub fn unstop(tokens: Vec<Token>, mut mods: Vec<String>) -> RefinedName {
    let mut name: Vec<String> = Vec::with_capacity(tokens.len());
    let mut stripped_words = Vec::new();

    for token in tokens {
        let lower = token.lower();
        if token.is_punctuation() && lower != "," && lower != "/" {
            continue;
        }
        if is_stopword(&lower) {
            stripped_words.push(lower);
            continue;
        }
        if is_prep_mod(&lower) {
            mods.push(lower);
            continue;
        }

        let separator = SEPARATORS.contains(&lower.as_str());
        if separator && name.last().is_some_and(|prev| SEPARATORS.contains(&prev.as_str())) {
            continue;
        }
        if token.pos.is_noun() {
            name.push(singularize(&lower));
        } else {
            name.push(lower);
        }
    }

    while name.first().is_some_and(|w| DANGLING.contains(&w.as_str())) {
        name.remove(0);
    }
    while name.last().is_some_and(|w| DANGLING.contains(&w.as_str())) {
        name.pop();
    }

    RefinedName {
        name_tokens: name,
        mods,
        stripped_words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn refined(words: &str) -> RefinedName {
        refine(&tokenize(words))
    }

    #[test]
    fn test_trailing_distractor_phrase() {
        let cases = vec![
            ("eggs , beaten", vec!["egg"], vec!["beaten"]),
            ("onion , finely chopped", vec!["onion"], vec!["chopped"]),
            ("salmon about , boned and butterflied", vec!["salmon"], vec!["boned"]),
            ("Italian tuna in water or oil , drained", vec!["italian", "tuna"], vec!["drained"]),
        ];
        for (input, name, mods) in cases {
            let result = refined(input);
            assert_eq!(result.name_tokens, name, "name of '{}'", input);
            assert_eq!(result.mods, mods, "mods of '{}'", input);
        }
    }

    #[test]
    fn test_stopwords_are_stripped() {
        let result = refined("mild honey");
        assert_eq!(result.name_tokens, vec!["honey"]);
        assert_eq!(result.stripped_words, vec!["mild"]);

        let result = refined("salt , to taste");
        assert_eq!(result.name_tokens, vec!["salt"]);
        assert_eq!(result.stripped_words, vec!["taste"]);
    }

    #[test]
    fn test_leading_cruft() {
        let result = refined("chopped yada yada");
        assert_eq!(result.name_tokens, vec!["yada", "yada"]);
        assert_eq!(result.mods, vec!["chopped"]);

        let result = refined("white beans");
        assert_eq!(result.name_tokens, vec!["white", "bean"]);
    }

    #[test]
    fn test_parenthetical_asides() {
        let result = refined("walnuts ( toasted ) , optional");
        assert_eq!(result.name_tokens, vec!["walnut"]);
        assert_eq!(result.mods, vec!["toasted"]);
        assert_eq!(result.stripped_words, vec!["optional"]);
    }

    #[test]
    fn test_name_alternatives_are_kept() {
        let result = refined("grape or cherry tomatoes");
        assert_eq!(result.name_tokens, vec!["grape", "or", "cherry", "tomato"]);
    }

    #[test]
    fn test_separators_collapse() {
        let result = refined("salt , , pepper ,");
        assert_eq!(result.name_tokens, vec!["salt", ",", "pepper"]);
    }

    #[test]
    fn test_singularize() {
        let cases = vec![
            ("chickpeas", "chickpea"),
            ("tomatoes", "tomato"),
            ("berries", "berry"),
            ("pies", "pie"),
            ("peaches", "peach"),
            ("radishes", "radish"),
            ("glasses", "glass"),
            ("cheeses", "cheese"),
            ("leaves", "leaf"),
            ("molasses", "molasses"),
            ("hummus", "hummus"),
            ("bitters", "bitters"),
            ("flour", "flour"),
        ];
        for (plural, singular) in cases {
            assert_eq!(singularize(plural), singular, "singularize('{}')", plural);
        }
    }
}

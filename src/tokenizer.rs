//! # Tokenizer and Part-of-Speech Tagger
//!
//! Splits normalized ingredient text into tokens, labels each token with a
//! part of speech and marks quantities and units with their semantic tags.
//!
//! ## Features
//!
//! - Punctuation splitting that keeps decimals, fractions and common abbreviations intact
//! - Slash splitting only for unit alternation ("cup/80"), never for fractions ("1/4")
//! - Qualifier dash preservation ("6-ounce" → "6-", "ounce")
//! - Lexicon and suffix based tagging tuned for ingredient phrases
//! - Context-gated unit recognition for single letters and homographs ("1 c" but not "vitamin c")

use crate::ingredient_model::{PartOfSpeech, SemanticTag, Token};
use crate::measurement_types::{canonical, is_context_gated};
use crate::text_processing::parse_number;
use lazy_static::lazy_static;
use log::trace;
use std::collections::HashSet;

lazy_static! {
    static ref DETERMINERS: HashSet<&'static str> = [
        "a", "an", "the", "this", "that", "these", "those", "some", "any", "each", "every",
        "another", "no", "all", "both", "either", "neither", "several", "its", "their",
        "your", "our", "my", "his", "her",
    ]
    .into_iter()
    .collect();

    static ref PREPOSITIONS: HashSet<&'static str> = [
        "in", "on", "at", "for", "with", "without", "from", "of", "by", "into", "onto",
        "about", "like", "than", "over", "under", "through", "after", "before", "between",
        "per", "during", "until", "around", "across", "inside", "outside", "near", "along",
        "as", "off", "out", "up", "down", "upon", "within",
    ]
    .into_iter()
    .collect();

    static ref CONJUNCTIONS: HashSet<&'static str> =
        ["and", "or", "but", "nor", "plus", "yet", "&"].into_iter().collect();

    static ref PRONOUNS: HashSet<&'static str> =
        ["it", "they", "them", "you", "we", "i", "he", "she", "one", "ones"].into_iter().collect();

    static ref VERBS: HashSet<&'static str> = [
        "can", "will", "should", "may", "might", "must", "could", "would", "is", "are", "be",
        "see", "use", "add", "remove", "reserve", "serve", "discard", "keep", "make", "let",
        "do", "does", "need",
    ]
    .into_iter()
    .collect();

    static ref ADJECTIVES: HashSet<&'static str> = [
        "large", "small", "medium", "big", "little", "extra", "fresh", "whole", "white",
        "black", "red", "green", "yellow", "purple", "brown", "golden", "dark", "light",
        "sweet", "sour", "bitter", "hot", "cold", "warm", "dry", "raw", "ripe", "mild",
        "firm", "soft", "hard", "fine", "coarse", "thin", "thick", "lean", "plain", "pure",
        "sharp", "strong", "virgin", "kosher", "flaky", "crisp", "crusty", "tender", "young",
        "new", "old", "heavy", "double", "single", "good", "best", "other", "same", "equal",
        "long", "short", "wide", "round", "creamy", "crunchy", "salty", "spicy", "leafy",
        "starchy", "waxy", "juicy", "curly", "oily", "early", "daily", "smooth", "optional",
        "low-sodium", "low-fat", "nonfat", "organic", "wild", "grey", "gray", "blue",
        "italian", "french", "greek", "mexican", "chinese", "japanese", "thai", "indian",
        "spanish", "english",
    ]
    .into_iter()
    .collect();

    static ref ADVERBS: HashSet<&'static str> = [
        "well", "very", "too", "also", "just", "then", "now", "not", "so", "again", "only",
        "roughly", "approx", "approx.", "appr.", "approximately", "preferably", "ideally",
    ]
    .into_iter()
    .collect();

    static ref IRREGULAR_PARTICIPLES: HashSet<&'static str> = [
        "cut", "torn", "ground", "frozen", "beaten", "left", "broken", "split", "made",
        "kept", "bought", "grown", "shaken", "spread", "set", "hung", "shorn", "sewn",
    ]
    .into_iter()
    .collect();

    /// Food words whose suffix looks like a verb or adverb form
    static ref SUFFIX_NOUNS: HashSet<&'static str> = [
        "dumpling", "pudding", "icing", "stuffing", "filling", "frosting", "seasoning",
        "topping", "dressing", "herring", "whiting", "sweetening", "shortening", "string",
        "spring", "wing", "ring", "jelly", "belly", "lily", "holly", "bread", "seed", "red",
        "shed", "bed", "ling", "king", "sprinkling", "nutmeg", "oatmeal", "couscous",
    ]
    .into_iter()
    .collect();

    /// Abbreviations that keep their trailing period
    static ref ABBREVIATIONS: HashSet<&'static str> = [
        "approx.", "appr.", "oz.", "lb.", "lbs.", "tbsp.", "tsp.", "pkg.", "qt.", "pt.",
        "gal.", "fl.", "no.", "c.",
    ]
    .into_iter()
    .collect();
}

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "less"];

/// Split text into raw word strings
///
/// Leading open parentheses and trailing closers, commas, semicolons, colons
/// and periods become their own tokens.
///
/// # Examples
///
/// ```rust
/// use ghgi::tokenizer::split_words;
///
/// assert_eq!(split_words("1/4 cup/80 grams"), vec!["1/4", "cup", "/", "80", "grams"]);
/// assert_eq!(split_words("2 (6-ounce) cans,"), vec!["2", "(", "6-", "ounce", ")", "cans", ","]);
/// ```
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in text.split_whitespace() {
        let mut core = chunk;
        while let Some(rest) = core.strip_prefix('(') {
            words.push("(".to_string());
            core = rest;
        }

        let mut trailing = Vec::new();
        loop {
            let lower = core.to_lowercase();
            let Some(last) = core.chars().last() else { break };
            let keeps_period = last == '.' && (ABBREVIATIONS.contains(lower.as_str()) || core.len() == 1);
            if matches!(last, ')' | ',' | ';' | ':' | '!' | '?' | '.') && !keeps_period && core.len() > 1 {
                trailing.push(last.to_string());
                core = &core[..core.len() - last.len_utf8()];
            } else {
                break;
            }
        }

        split_core(core, &mut words);
        words.extend(trailing.into_iter().rev());
    }
    words
}

fn split_core(core: &str, words: &mut Vec<String>) {
    if core.is_empty() {
        return;
    }

    if core.contains('/') && core != "/" {
        let numeric_everywhere = core.split('/').all(|part| {
            part.starts_with(|c: char| c.is_ascii_digit()) || part.trim_end_matches('-').ends_with(|c: char| c.is_ascii_digit())
        });
        if !numeric_everywhere {
            for (i, part) in core.split('/').enumerate() {
                if i > 0 {
                    words.push("/".to_string());
                }
                split_core(part, words);
            }
            return;
        }
    }

    if let Some((head, tail)) = core.split_once('-') {
        if !head.is_empty() && parse_number(head).is_some() && canonical(tail).is_some() {
            words.push(format!("{}-", head));
            words.push(tail.to_string());
            return;
        }
    }

    words.push(core.to_string());
}

/// Part of speech for a word without context
fn classify(word: &str, first: bool) -> PartOfSpeech {
    if !word.chars().any(char::is_alphanumeric) {
        return PartOfSpeech::Punctuation;
    }
    if parse_number(word).is_some() || word.starts_with(|c: char| c.is_ascii_digit()) {
        return PartOfSpeech::Number;
    }

    let lower = word.to_lowercase();
    let lower = lower.as_str();
    if lower == "to" {
        return PartOfSpeech::To;
    }
    if DETERMINERS.contains(lower) {
        return PartOfSpeech::Determiner;
    }
    if PREPOSITIONS.contains(lower) {
        return PartOfSpeech::Preposition;
    }
    if CONJUNCTIONS.contains(lower) {
        return PartOfSpeech::Conjunction;
    }
    if PRONOUNS.contains(lower) {
        return PartOfSpeech::Pronoun;
    }
    if VERBS.contains(lower) {
        return PartOfSpeech::Verb;
    }
    if ADJECTIVES.contains(lower) {
        return PartOfSpeech::Adjective;
    }
    if SUFFIX_NOUNS.contains(lower) {
        return PartOfSpeech::Noun;
    }
    if ADVERBS.contains(lower) || (lower.ends_with("ly") && lower.len() > 4) {
        return PartOfSpeech::Adverb;
    }
    if IRREGULAR_PARTICIPLES.contains(lower)
        || (lower.ends_with("ed") && !lower.ends_with("eed") && lower.len() >= 5)
    {
        return PartOfSpeech::PastParticiple;
    }
    if lower.ends_with("ing") && lower.len() >= 5 {
        return PartOfSpeech::Gerund;
    }
    if ADJECTIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len() + 2) {
        return PartOfSpeech::Adjective;
    }
    if !first && word.starts_with(|c: char| c.is_uppercase()) {
        return PartOfSpeech::ProperNoun;
    }
    PartOfSpeech::Noun
}

/// Tag a word sequence with parts of speech
///
/// Each word is classified from a lexicon and suffix rules, then a context
/// pass turns a participle right after a determiner into an adjective
/// ("the chopped nuts").
pub fn tag_parts_of_speech<S: AsRef<str>>(words: &[S]) -> Vec<PartOfSpeech> {
    let mut tags: Vec<PartOfSpeech> = words
        .iter()
        .enumerate()
        .map(|(i, w)| classify(w.as_ref(), i == 0))
        .collect();

    for i in 1..tags.len() {
        if tags[i] == PartOfSpeech::PastParticiple && tags[i - 1] == PartOfSpeech::Determiner {
            tags[i] = PartOfSpeech::Adjective;
        }
    }
    tags
}

/// Tokenize normalized text and assign part-of-speech and semantic tags
///
/// # Arguments
///
/// * `text` - Output of the lexical normalizer
///
/// # Returns
///
/// One token per word. Numbers are tagged `Quantity` (or `EaQuantity` when
/// they end in a dash) and known unit spellings are tagged `Unit`.
pub fn tokenize(text: &str) -> Vec<Token> {
    let words = split_words(text);
    let tags = tag_parts_of_speech(&words);
    let mut tokens: Vec<Token> = Vec::with_capacity(words.len());

    for (word, pos) in words.iter().zip(tags) {
        let mut token = Token::new(word, pos);

        if pos == PartOfSpeech::Number {
            if let Some(number) = parse_number(word) {
                token.tag = if number.dashed {
                    SemanticTag::EaQuantity
                } else {
                    SemanticTag::Quantity
                };
            }
        } else if canonical(word).is_some() {
            let after_quantity = tokens
                .last()
                .is_some_and(|prev| prev.is_quantity() || prev.text == ")");
            if !is_context_gated(word) || after_quantity {
                token.tag = SemanticTag::Unit;
            }
        }

        trace!("Token '{}' pos={:?} tag={:?}", token.text, token.pos, token.tag);
        tokens.push(token);
    }

    tokens
}

/// Re-run part-of-speech tagging over tokens in isolation, keeping semantic tags
pub fn retag(tokens: &[Token]) -> Vec<Token> {
    let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    tokens
        .iter()
        .zip(tag_parts_of_speech(&words))
        .map(|(token, pos)| Token {
            pos,
            ..token.clone()
        })
        .collect()
}

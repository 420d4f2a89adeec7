//! # Measurement Patterns Module
//!
//! This module contains the regex patterns and word lists shared by the
//! normalizer, the amount tagger and the name refiner.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

// Inline markup that may appear in scraped ingredient lines
pub const MARKUP_PATTERN: &str = r"(?i)</?(?:a|b|i|em|strong|span)\b[^>]*>";

// Spelled-out range connector glued between words ("six-to-eight-pound")
pub const HYPHEN_RANGE_PATTERN: &str = r"(?i)-to-";

// A digit directly followed by letters ("6c", "350g", "1.5c")
pub const GLUED_UNIT_PATTERN: &str = r"(\d)([A-Za-z]+)\b";

// A digit joined to a word by a hyphen ("4-pound", "1/4-inch")
pub const DIGIT_HYPHEN_WORD_PATTERN: &str = r"(\d)-([A-Za-z]+)";

lazy_static! {
    pub static ref MARKUP_REGEX: Regex =
        Regex::new(MARKUP_PATTERN).expect("Markup pattern should be valid");
    pub static ref HYPHEN_RANGE_REGEX: Regex =
        Regex::new(HYPHEN_RANGE_PATTERN).expect("Hyphen range pattern should be valid");
    pub static ref GLUED_UNIT_REGEX: Regex =
        Regex::new(GLUED_UNIT_PATTERN).expect("Glued unit pattern should be valid");
    pub static ref DIGIT_HYPHEN_WORD_REGEX: Regex =
        Regex::new(DIGIT_HYPHEN_WORD_PATTERN).expect("Digit hyphen pattern should be valid");

    // Slash and comma padding; a digit on both sides (fractions, thousands) is left alone
    pub static ref SLASH_LEFT_REGEX: Regex =
        Regex::new(r"(\D)/(\w)").expect("Slash pattern should be valid");
    pub static ref SLASH_RIGHT_REGEX: Regex =
        Regex::new(r"(\w)/(\D)").expect("Slash pattern should be valid");
    pub static ref COMMA_LEFT_REGEX: Regex =
        Regex::new(r"(\D),(\w)").expect("Comma pattern should be valid");
    pub static ref COMMA_RIGHT_REGEX: Regex =
        Regex::new(r"(\w),([^\d\s])").expect("Comma pattern should be valid");

    // Numbers as they appear once text is normalized
    pub static ref DECIMAL_REGEX: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)(-?)$").expect("Decimal pattern should be valid");
    pub static ref FRACTION_REGEX: Regex =
        Regex::new(r"^(\d+)/(\d+)(-?)$").expect("Fraction pattern should be valid");
    pub static ref HYPHEN_MIXED_REGEX: Regex =
        Regex::new(r"^(\d+)-(\d+)/(\d+)(-?)$").expect("Mixed number pattern should be valid");
    pub static ref HYPHEN_SPAN_REGEX: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)(-?)$").expect("Span pattern should be valid");

    /// Single-glyph vulgar fractions and their ascii expansion
    pub static ref VULGAR_FRACTIONS: HashMap<char, &'static str> = [
        ('¼', "1/4"), ('½', "1/2"), ('¾', "3/4"), ('⅐', "1/7"), ('⅑', "1/9"),
        ('⅒', "1/10"), ('⅓', "1/3"), ('⅔', "2/3"), ('⅕', "1/5"), ('⅖', "2/5"),
        ('⅗', "3/5"), ('⅘', "4/5"), ('⅙', "1/6"), ('⅚', "5/6"), ('⅛', "1/8"),
        ('⅜', "3/8"), ('⅝', "5/8"), ('⅞', "7/8"), ('⅟', ""), ('↉', ""),
    ]
    .into_iter()
    .collect();

    /// Spelled-out numbers converted to digits when context allows
    pub static ref TEXT_NUMBERS: HashMap<&'static str, &'static str> = [
        ("one", "1"), ("two", "2"), ("three", "3"), ("four", "4"), ("five", "5"),
        ("six", "6"), ("seven", "7"), ("eight", "8"), ("nine", "9"), ("ten", "10"),
        ("eleven", "11"), ("twelve", "12"), ("dozen", "12"),
    ]
    .into_iter()
    .collect();

    /// Multi-word counts that are unambiguous wherever they appear
    pub static ref HALF_DOZEN_REGEX: Regex =
        Regex::new(r"(?i)\bhalf(?:-|\s+a\s+|\s+)dozen\b").expect("Half dozen pattern should be valid");

    /// Words that mark the following amount as an alternative measurement
    pub static ref APPROXIMATORS: HashSet<&'static str> =
        ["about", "approx", "approx.", "appr.", "approximately", "~", "around", "roughly"]
            .into_iter()
            .collect();

    /// Size or preparation words allowed between a quantity and its unit ("1 packed cup")
    pub static ref UNIT_INTERPOSERS: HashSet<&'static str> = [
        "heaping", "heaped", "level", "scant", "generous", "packed", "large", "small",
        "medium", "big", "good", "rounded", "loosely", "lightly", "firmly",
    ]
    .into_iter()
    .collect();

    /// Preparation modifiers kept on the ingredient instead of being discarded
    pub static ref PREP_MODS: HashSet<&'static str> = [
        "beaten", "boned", "boneless", "canned", "chopped", "cleaned", "creamed", "crosswise",
        "crumbled", "crushed", "cubed", "dice", "diced", "dissolved", "drained", "freeze-dried",
        "grated", "ground", "gutted", "heaping", "jarred", "julienned", "lengthwise", "melted",
        "minced", "packed", "pressed", "puree", "pureed", "rinsed", "roasted", "sauteed",
        "scaled", "shelled", "shredded", "sifted", "skin-on", "skinless", "skinned", "sliced",
        "smashed", "smoked", "squeezed", "steamed", "toasted", "torn", "well", "whipped",
        "whisked", "zested",
    ]
    .into_iter()
    .collect();

    /// Low-information words dropped from names and reported as stripped
    pub static ref STOPWORDS: HashSet<&'static str> = [
        // English function words
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
        "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
        "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
        "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
        "did", "doing", "a", "an", "the", "and", "but", "if", "because", "as", "until",
        "while", "of", "at", "by", "for", "about", "against", "between", "into", "through",
        "during", "before", "after", "above", "below", "from", "up", "down", "in", "out",
        "on", "off", "over", "under", "again", "further", "then", "once", "here", "there",
        "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most",
        "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
        "too", "very", "s", "can", "will", "just", "don", "should", "now",
        // Cooking filler
        "~", "amount", "approx", "approximately", "approx.", "appr.", "assorted", "baby",
        "coarse", "coarsely", "cold", "cooled", "cored", "cut", "desired", "drizzling",
        "equal", "fillet", "fine", "firm", "finely", "flaky", "fresh", "freshly", "frozen",
        "garnish", "gently", "halved", "halves", "hulled", "interval", "kitchen", "like",
        "twine", "large", "least", "leftover", "low-sodium", "medium", "mild", "optional",
        "peeled", "picked", "pitted", "plain", "preferably", "pure", "quartered", "ripe",
        "room", "salted", "scrubbed", "seeded", "serving", "small", "softened", "stemmed",
        "taste", "temperature", "thawed", "thinly", "trimmed", "unsalted", "unsweetened",
        "washed", "needed", "divided",
    ]
    .into_iter()
    .collect();

    /// Nouns whose trailing "s" is not a plural
    pub static ref NO_SINGULAR: HashSet<&'static str> = [
        "across", "asparagus", "bitters", "brussels", "couscous", "dice", "haas", "hummus",
        "molasses", "plus", "schnapps", "slice", "swiss", "grits", "oats", "greens", "series",
    ]
    .into_iter()
    .collect();

    /// Plurals that regular suffix rules get wrong
    pub static ref IRREGULAR_PLURALS: HashMap<&'static str, &'static str> = [
        ("leaves", "leaf"), ("halves", "half"), ("loaves", "loaf"), ("knives", "knife"),
        ("cookies", "cookie"), ("brownies", "brownie"), ("veggies", "veggie"),
        ("smoothies", "smoothie"), ("calories", "calorie"), ("geese", "goose"),
    ]
    .into_iter()
    .collect();

    /// Header words naming sections that hold no ingredients
    pub static ref NON_INGREDIENT_HEADERS: HashSet<&'static str> = [
        "equipment", "tools", "utensils", "instructions", "directions", "method",
        "preparation", "notes", "note", "steps",
    ]
    .into_iter()
    .collect();
}

/// Whether `word` (lowercase) is a known preparation modifier
pub fn is_prep_mod(word: &str) -> bool {
    PREP_MODS.contains(word)
}

/// Whether `word` (lowercase) is a stopword
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Whether `word` (lowercase) marks an approximate alternative amount
pub fn is_approximator(word: &str) -> bool {
    APPROXIMATORS.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regexes_compile() {
        assert!(MARKUP_REGEX.is_match("<a href=\"x\">"));
        assert!(MARKUP_REGEX.is_match("</A>"));
        assert!(!MARKUP_REGEX.is_match("<div>"));
        assert!(GLUED_UNIT_REGEX.is_match("350g"));
        assert!(DIGIT_HYPHEN_WORD_REGEX.is_match("4-pound"));
    }

    #[test]
    fn test_number_shapes() {
        assert!(DECIMAL_REGEX.is_match("12"));
        assert!(DECIMAL_REGEX.is_match("1.5"));
        assert!(DECIMAL_REGEX.is_match("6-"));
        assert!(FRACTION_REGEX.is_match("1/2-"));
        assert!(HYPHEN_MIXED_REGEX.is_match("1-1/2"));
        assert!(HYPHEN_SPAN_REGEX.is_match("2-3"));
        assert!(!DECIMAL_REGEX.is_match("1/2"));
    }

    #[test]
    fn test_vocabularies() {
        assert!(is_prep_mod("drained"));
        assert!(is_stopword("mild"));
        assert!(!is_stopword("or"));
        assert!(!is_stopword("to"));
        assert!(!is_stopword("with"));
        assert!(is_approximator("approx."));
        assert_eq!(VULGAR_FRACTIONS.get(&'¼'), Some(&"1/4"));
    }
}

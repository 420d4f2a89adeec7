//! # Text Processing Module
//!
//! This module implements the lexical normalizer that runs before tokenization.
//! Raw ingredient lines are scraped from recipe pages and are rarely tidy, so
//! each step below rewrites one kind of noise into a predictable shape.
//!
//! ## Features
//!
//! - Markup stripping for the inline tags recipe sites leave behind
//! - Context-gated conversion of spelled-out numbers ("two cups" but not "five-spice")
//! - Vulgar fraction expansion ("1¼" → "1 1/4")
//! - Separation of glued quantities and units ("350g" → "350 g")
//! - Qualifier dash preservation ("4-pound" → "4- pound")
//! - Slash, comma and parenthesis padding that leaves numeric fractions intact
//! - Folding of mixed numbers and ranges to a single decimal ("5 to 7" → "6")
//! - Section header detection ("Equipment:", "For the filling:")

use crate::measurement_patterns::{
    COMMA_LEFT_REGEX, COMMA_RIGHT_REGEX, DECIMAL_REGEX, DIGIT_HYPHEN_WORD_REGEX, FRACTION_REGEX,
    GLUED_UNIT_REGEX, HALF_DOZEN_REGEX, HYPHEN_MIXED_REGEX, HYPHEN_RANGE_REGEX, HYPHEN_SPAN_REGEX,
    MARKUP_REGEX, NON_INGREDIENT_HEADERS, SLASH_LEFT_REGEX, SLASH_RIGHT_REGEX, TEXT_NUMBERS,
    VULGAR_FRACTIONS,
};
use crate::measurement_types::canonical;
use log::{debug, trace};
use regex::Captures;

/// A normalized ingredient line with its disregard signals
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    /// The rewritten text, single-space separated
    pub text: String,
    /// Whether the line holds no ingredient content and should be skipped
    pub disregard: bool,
    /// The line is a section header; the disregard may carry over to following lines
    pub sustain_disregard: bool,
    /// The header opens an ingredient section, ending any carried-over disregard
    pub unsustain_disregard: bool,
}

/// Shape of a numeric token once text is normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberKind {
    /// Integer that may be followed by a fraction ("1" in "1 1/2")
    Whole,
    Decimal,
    Fraction,
    /// Already a complete value ("1-1/2", "2-3")
    Compound,
}

/// A parsed numeric token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNumber {
    pub value: f64,
    /// The token ended in a dash ("4-"), marking a qualifier quantity
    pub dashed: bool,
    pub kind: NumberKind,
}

/// Run every normalization step over a raw ingredient line
///
/// # Arguments
///
/// * `raw` - One ingredient line as scraped, possibly with markup and glyphs
///
/// # Returns
///
/// The normalized line with its header flags. Header and blank lines come back
/// with `disregard` set and an empty `text`.
///
/// # Examples
///
/// ```rust
/// use ghgi::text_processing::normalize;
///
/// let line = normalize("1¼ cups flour");
/// assert_eq!(line.text, "1.25 cups flour");
/// assert!(!line.disregard);
/// ```
pub fn normalize(raw: &str) -> NormalizedLine {
    let text = strip_markup(raw);
    let trimmed = text.trim();

    if trimmed.is_empty() {
        trace!("Blank line disregarded");
        return NormalizedLine {
            text: String::new(),
            disregard: true,
            sustain_disregard: false,
            unsustain_disregard: false,
        };
    }

    if let Some(unsustain) = header_unsustains(trimmed) {
        debug!("Header line '{}' disregarded (unsustain={})", trimmed, unsustain);
        return NormalizedLine {
            text: String::new(),
            disregard: true,
            sustain_disregard: true,
            unsustain_disregard: unsustain,
        };
    }

    let text = pad_ranges(trimmed);
    let text = numerify(&text);
    let text = devulgarize(&text);
    let text = separate_glued_units(&text);
    let text = split_unit_hyphens(&text);
    let text = pad_parentheses(&text);
    let text = pad_punctuation(&text);
    let text = collapse_quantities(&text);

    debug!("Normalized '{}' -> '{}'", raw, text);
    NormalizedLine {
        text,
        disregard: false,
        sustain_disregard: false,
        unsustain_disregard: false,
    }
}

/// Remove whitelisted inline markup tags, keeping their text
pub fn strip_markup(text: &str) -> String {
    MARKUP_REGEX.replace_all(text, "").into_owned()
}

/// For a header line (ending in ':') returns whether it opens an ingredient
/// section; `None` when the line is not a header.
fn header_unsustains(line: &str) -> Option<bool> {
    let body = line.strip_suffix(':')?;
    let names_tool_section = body
        .split(|c: char| !c.is_alphabetic())
        .map(str::to_lowercase)
        .any(|word| NON_INGREDIENT_HEADERS.contains(word.as_str()));
    Some(!names_tool_section)
}

/// Turn hyphen-glued range connectors into spaced ones ("six-to-eight" → "six to eight")
pub fn pad_ranges(text: &str) -> String {
    HYPHEN_RANGE_REGEX.replace_all(text, " to ").into_owned()
}

fn split_trailing_punctuation(word: &str) -> (&str, &str) {
    let core = word.trim_end_matches([',', ';', ':', '.', ')']);
    (core, &word[core.len()..])
}

/// Replace spelled-out numbers with digits where the next token makes a
/// quantity reading safe: end of line, a closing parenthesis, a unit, a range
/// connector or another number. Other trailing punctuation defers to the next
/// token. A number word hyphen-joined to a unit ("eight-pound") also converts.
pub fn numerify(text: &str) -> String {
    let text = HALF_DOZEN_REGEX.replace_all(text, "6");
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out = Vec::with_capacity(words.len());

    for (i, word) in words.iter().enumerate() {
        let (core, trail) = split_trailing_punctuation(word);
        let lower = core.to_lowercase();

        if let Some((head, tail)) = lower.split_once('-') {
            match TEXT_NUMBERS.get(head) {
                Some(digits) if canonical(tail).is_some() => {
                    out.push(format!("{}-{}{}", digits, &core[head.len() + 1..], trail));
                }
                _ => out.push(word.to_string()),
            }
            continue;
        }

        let Some(digits) = TEXT_NUMBERS.get(lower.as_str()) else {
            out.push(word.to_string());
            continue;
        };

        let gated_in = trail.contains(')')
            || match words.get(i + 1) {
                None => true,
                Some(next) => {
                    let (next_core, _) = split_trailing_punctuation(next);
                    let next_lower = next_core.to_lowercase();
                    next_lower == "to"
                        || next_lower == "or"
                        || canonical(next_core).is_some()
                        || next.starts_with(|c: char| c.is_ascii_digit() || c == '(')
                }
            };

        if gated_in {
            trace!("Numerified '{}' -> '{}'", word, digits);
            out.push(format!("{}{}", digits, trail));
        } else {
            out.push(word.to_string());
        }
    }

    out.join(" ")
}

/// Expand vulgar fraction glyphs to " n/d"; the leading space separates them
/// from a preceding whole number ("1¼" → "1 1/4").
pub fn devulgarize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match VULGAR_FRACTIONS.get(&ch) {
            Some(expansion) => {
                out.push(' ');
                out.push_str(expansion);
            }
            None => out.push(ch),
        }
    }
    out
}

/// Insert a space between a digit and a directly following unit ("6c" → "6 c")
pub fn separate_glued_units(text: &str) -> String {
    GLUED_UNIT_REGEX
        .replace_all(text, |caps: &Captures| {
            if canonical(&caps[2]).is_some() {
                format!("{} {}", &caps[1], &caps[2])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Split digit-hyphen-word pairs. Before a unit the dash stays on the number
/// as the qualifier marker ("4-pound" → "4- pound"); elsewhere it is dropped
/// ("1/4-inch" → "1/4 inch").
pub fn split_unit_hyphens(text: &str) -> String {
    DIGIT_HYPHEN_WORD_REGEX
        .replace_all(text, |caps: &Captures| {
            if canonical(&caps[2]).is_some() {
                format!("{}- {}", &caps[1], &caps[2])
            } else {
                format!("{} {}", &caps[1], &caps[2])
            }
        })
        .into_owned()
}

/// Surround parentheses with single spaces ("(hi)" → "( hi )")
pub fn pad_parentheses(text: &str) -> String {
    text.replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pad slashes and commas with spaces unless digits sit on both sides
pub fn pad_punctuation(text: &str) -> String {
    let text = SLASH_LEFT_REGEX.replace_all(text, "${1} / ${2}");
    let text = SLASH_RIGHT_REGEX.replace_all(&text, "${1} / ${2}");
    let text = COMMA_LEFT_REGEX.replace_all(&text, "${1}, ${2}");
    COMMA_RIGHT_REGEX.replace_all(&text, "${1}, ${2}").into_owned()
}

/// Parse one normalized numeric token ("2", "1.5", "1/2-", "1-1/2", "2-3")
pub fn parse_number(token: &str) -> Option<ParsedNumber> {
    if let Some(caps) = HYPHEN_MIXED_REGEX.captures(token) {
        let whole: f64 = caps[1].parse().ok()?;
        let numerator: f64 = caps[2].parse().ok()?;
        let denominator: f64 = caps[3].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(ParsedNumber {
            value: whole + numerator / denominator,
            dashed: !caps[4].is_empty(),
            kind: NumberKind::Compound,
        });
    }
    if let Some(caps) = FRACTION_REGEX.captures(token) {
        let numerator: f64 = caps[1].parse().ok()?;
        let denominator: f64 = caps[2].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(ParsedNumber {
            value: numerator / denominator,
            dashed: !caps[3].is_empty(),
            kind: NumberKind::Fraction,
        });
    }
    if let Some(caps) = DECIMAL_REGEX.captures(token) {
        let value: f64 = caps[1].parse().ok()?;
        let kind = if caps[1].contains('.') {
            NumberKind::Decimal
        } else {
            NumberKind::Whole
        };
        return Some(ParsedNumber {
            value,
            dashed: !caps[2].is_empty(),
            kind,
        });
    }
    if let Some(caps) = HYPHEN_SPAN_REGEX.captures(token) {
        let low: f64 = caps[1].parse().ok()?;
        let high: f64 = caps[2].parse().ok()?;
        return Some(ParsedNumber {
            value: (low + high) / 2.0,
            dashed: !caps[3].is_empty(),
            kind: NumberKind::Compound,
        });
    }
    None
}

/// Read a quantity from the head of `pieces`, joining a whole number with a
/// following fraction. Returns the value, its dash marker and pieces consumed.
fn read_quantity(pieces: &[String]) -> Option<(f64, bool, usize)> {
    let first = parse_number(pieces.first()?)?;
    if first.kind == NumberKind::Whole && !first.dashed {
        if let Some(next) = pieces.get(1).and_then(|p| parse_number(p)) {
            if next.kind == NumberKind::Fraction {
                return Some((first.value + next.value, next.dashed, 2));
            }
        }
    }
    Some((first.value, first.dashed, 1))
}

fn is_range_connector(piece: &str) -> bool {
    matches!(piece.to_lowercase().as_str(), "to" | "or" | "-" | "–")
}

/// Render a folded quantity so that it parses back to the same value
pub fn format_quantity(value: f64, dashed: bool) -> String {
    if dashed {
        format!("{}-", value)
    } else {
        format!("{}", value)
    }
}

/// Fold mixed numbers to decimals and ranges to their midpoint
///
/// "1 1/2 cup" → "1.5 cup", "5 to 7 handful" → "6 handful",
/// "10- to 14- pound" → "12- pound". Trailing commas, semicolons and colons are
/// split off into their own pieces first.
pub fn collapse_quantities(text: &str) -> String {
    let mut pieces: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let core = word.trim_end_matches([',', ';', ':']);
        if !core.is_empty() {
            pieces.push(core.to_string());
        }
        for punct in word[core.len()..].chars() {
            pieces.push(punct.to_string());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(pieces.len());
    let mut i = 0;
    while i < pieces.len() {
        let Some((mut value, mut dashed, consumed)) = read_quantity(&pieces[i..]) else {
            out.push(pieces[i].clone());
            i += 1;
            continue;
        };
        let mut next = i + consumed;

        if next + 1 < pieces.len() && is_range_connector(&pieces[next]) {
            if let Some((upper, upper_dashed, upper_consumed)) = read_quantity(&pieces[next + 1..]) {
                trace!("Range {} .. {} folded to midpoint", value, upper);
                value = (value + upper) / 2.0;
                dashed = dashed || upper_dashed;
                next += 1 + upper_consumed;
            }
        }

        out.push(format_quantity(value, dashed));
        i = next;
    }

    out.join(" ")
}

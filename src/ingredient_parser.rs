//! # Ingredient Parser
//!
//! This module runs the full parsing pipeline over recipe ingredient lines and
//! turns them into structured [`Ingredient`] values.
//!
//! ## Pipeline
//!
//! 1. Lexical normalization and header detection ([`crate::text_processing`])
//! 2. Tokenization and tagging ([`crate::tokenizer`])
//! 3. Amount tagging ([`crate::amount_tagger`])
//! 4. Segmentation into alternative ingredients ([`crate::segmenter`])
//! 5. Name refinement ([`crate::name_refiner`])
//!
//! Every stage is a pure function of its input, so lines can be parsed in
//! parallel without shared state.
//!
//! ## Usage
//!
//! ```rust
//! use ghgi::ingredient_parser::parse_ingredient_list;
//!
//! let text = "For the dressing:\n3 tablespoons olive oil\n1 tsp salt";
//! let parsed = parse_ingredient_list(text);
//!
//! assert_eq!(parsed.parsed_count(), 2);
//! for ingredient in &parsed.ingredients {
//!     println!("{}", ingredient);
//! }
//! ```

use crate::amount_tagger::tag_amounts;
use crate::ingredient_model::{DisregardSignal, Ingredient, ParseOutcome, RecipeParse};
use crate::name_refiner::refine;
use crate::segmenter::{segment, Segment};
use crate::text_processing::normalize;
use crate::tokenizer::tokenize;
use log::{debug, info};

/// Parse a full ingredient list, one ingredient line per text line
///
/// Section headers that name a non-ingredient section ("Equipment:") switch
/// off parsing for the lines that follow until a header opening an
/// ingredient section ("For the filling:") switches it back on. Lines read
/// while parsing is off are reported as disregarded.
pub fn parse_ingredient_list(text: &str) -> RecipeParse {
    let mut parsed = RecipeParse::default();
    let mut disregarding = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_ingredient_line(line) {
            ParseOutcome::Disregarded(signal) => {
                disregarding = signal.disregard_following(disregarding);
                parsed.disregarded_lines.push(line.trim().to_string());
            }
            ParseOutcome::Parsed(_) if disregarding => {
                debug!("Line '{}' falls in a non-ingredient section", line.trim());
                parsed.disregarded_lines.push(line.trim().to_string());
            }
            ParseOutcome::Parsed(ingredients) => parsed.ingredients.extend(ingredients),
        }
    }

    info!(
        "Parsed {} ingredients, disregarded {} lines",
        parsed.parsed_count(),
        parsed.disregarded_count()
    );
    parsed
}

/// Parse a single ingredient line
///
/// # Returns
///
/// [`ParseOutcome::Parsed`] with one ingredient per alternative on the line,
/// or [`ParseOutcome::Disregarded`] carrying the header flags for blank and
/// header lines. Parsing never fails: unknown units degrade to `ea` and a
/// line without any amount gets an implicit `1 ea`.
///
/// # Examples
///
/// ```rust
/// use ghgi::ingredient_parser::parse_ingredient_line;
///
/// let outcome = parse_ingredient_line("1 cup flour");
/// let flour = &outcome.ingredients()[0];
/// assert_eq!(flour.names(), vec!["flour".to_string()]);
/// assert_eq!(flour.amounts[0].quantity, 1.0);
/// ```
pub fn parse_ingredient_line(line: &str) -> ParseOutcome {
    let normalized = normalize(line);
    if normalized.disregard {
        return ParseOutcome::Disregarded(DisregardSignal {
            sustain: normalized.sustain_disregard,
            unsustain: normalized.unsustain_disregard,
        });
    }

    let tokens = tokenize(&normalized.text);
    let nodes = tag_amounts(&tokens);
    let ingredients: Vec<Ingredient> = segment(nodes).into_iter().map(build_ingredient).collect();

    debug!(
        "Line '{}' -> {}",
        line.trim(),
        ingredients.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ; ")
    );
    ParseOutcome::Parsed(ingredients)
}

fn build_ingredient(segment: Segment) -> Ingredient {
    let refined = refine(&segment.words);
    Ingredient {
        amounts: segment.amounts,
        name_tokens: refined.name_tokens,
        mods: refined.mods,
        stripped_words: refined.stripped_words,
        ..Ingredient::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement_types::UnitId;

    fn single(line: &str) -> Ingredient {
        let outcome = parse_ingredient_line(line);
        assert_eq!(outcome.ingredients().len(), 1, "'{}' should yield one ingredient", line);
        outcome.ingredients()[0].clone()
    }

    #[test]
    fn test_parse_simple_ingredient() {
        let flour = single("1 cup flour");
        let record = flour.to_record();
        assert_eq!(record.qtys.len(), 1);
        assert_eq!(record.qtys[0].qty, 1.0);
        assert_eq!(record.qtys[0].unit, "cup");
        assert_eq!(record.names, vec!["flour"]);
        assert!(record.mods.is_empty());
    }

    #[test]
    fn test_parse_alternate_units() {
        let honey = single("1/4 cup/80 grams mild honey");
        let record = honey.to_record();
        let qtys: Vec<(f64, &str)> = record.qtys.iter().map(|q| (q.qty, q.unit.as_str())).collect();
        assert_eq!(qtys, vec![(0.25, "cup"), (80.0, "g")]);
        assert_eq!(record.names, vec!["honey"]);
        assert_eq!(record.stripped_words, vec!["mild"]);
    }

    #[test]
    fn test_parse_canned_qualifier() {
        let tuna = single("2 (6-ounce) cans Italian tuna in water or oil, drained");
        assert_eq!(tuna.amounts.len(), 1);
        assert_eq!((tuna.amounts[0].quantity, tuna.amounts[0].unit), (2.0, UnitId::Pkg));
        let qualifier = &tuna.amounts[0].qualifiers[0];
        assert_eq!((qualifier.quantity, qualifier.unit, qualifier.per_each), (6.0, UnitId::Ounce, true));
        assert_eq!(tuna.names(), vec!["italian tuna"]);
        assert_eq!(tuna.mods, vec!["drained"]);
    }

    #[test]
    fn test_parse_range() {
        let handful = single("5 to 7 handful");
        assert_eq!((handful.amounts[0].quantity, handful.amounts[0].unit), (6.0, UnitId::Handful));
    }

    #[test]
    fn test_parse_header() {
        let outcome = parse_ingredient_line("For the filling:");
        assert!(outcome.is_disregarded());
        assert!(outcome.ingredients().is_empty());
        assert_eq!(
            outcome,
            ParseOutcome::Disregarded(DisregardSignal { sustain: true, unsustain: true })
        );
    }

    #[test]
    fn test_parse_alternative_ingredients() {
        let outcome = parse_ingredient_line("1 cup chickpeas or 2 cups white beans");
        let names: Vec<Vec<String>> = outcome.ingredients().iter().map(|i| i.names()).collect();
        assert_eq!(names, vec![vec!["chickpea".to_string()], vec!["white bean".to_string()]]);
    }

    #[test]
    fn test_parse_no_quantity() {
        let line = single("yada yada");
        let record = line.to_record();
        assert_eq!((record.qtys[0].qty, record.qtys[0].unit.as_str()), (1.0, "ea"));
        assert_eq!(record.names, vec!["yada yada"]);
    }

    #[test]
    fn test_parse_plus_amount() {
        let sugar = single("1 cup plus 2 tablespoons sugar");
        let record = sugar.to_record();
        let qtys: Vec<(f64, &str, bool)> =
            record.qtys.iter().map(|q| (q.qty, q.unit.as_str(), q.plus)).collect();
        assert_eq!(qtys, vec![(1.0, "cup", false), (2.0, "tablespoon", true)]);
        assert_eq!(record.names, vec!["sugar"]);
    }

    #[test]
    fn test_parse_approximate_weight() {
        let salmon = single("1 salmon, about 4 1/2 pounds, boned and butterflied");
        let record = salmon.to_record();
        let qtys: Vec<(f64, &str)> = record.qtys.iter().map(|q| (q.qty, q.unit.as_str())).collect();
        assert_eq!(qtys, vec![(1.0, "ea"), (4.5, "pound")]);
        assert_eq!(record.names, vec!["salmon"]);
        assert_eq!(record.mods, vec!["boned"]);
    }

    #[test]
    fn test_parse_ingredient_list() {
        let text = "Ingredients:\n2 cups flour\n1 tbsp salt\n\nEquipment:\n1 stand mixer\nFor the glaze:\n1/2 tsp pepper";
        let parsed = parse_ingredient_list(text);

        assert_eq!(parsed.parsed_count(), 3);
        assert_eq!(parsed.ingredients[0].names(), vec!["flour"]);
        assert_eq!(parsed.ingredients[1].names(), vec!["salt"]);
        assert_eq!(parsed.ingredients[2].names(), vec!["pepper"]);
        assert_eq!(
            parsed.disregarded_lines,
            vec!["Ingredients:", "Equipment:", "1 stand mixer", "For the glaze:"]
        );
    }
}

//! # Amount Tagger
//!
//! Folds quantity and unit tokens into [`Amount`] nodes. The work is split into
//! passes that each consume one node sequence and build a new one:
//!
//! 1. [`pair_amounts`]: quantity + unit pairs, "each" clarifications,
//!    parenthesized qualifiers ("2 (6-ounce) cans") and orphan completion
//! 2. [`attach_qualifiers`]: dashed quantities ("4-pound") become qualifiers
//!    of the closest preceding count
//! 3. [`link_alternates`]: "/", "or", parentheses and approximators create
//!    alternate measurements; "plus" chains additive amounts
//! 4. [`complete`]: a line without any amount gets an implicit `1 ea`

use crate::ingredient_model::{Amount, Node, SemanticTag, Token};
use crate::measurement_patterns::{is_approximator, UNIT_INTERPOSERS};
use crate::measurement_types::UnitId;
use log::{debug, trace};

/// Run every amount pass over a token stream
pub fn tag_amounts(tokens: &[Token]) -> Vec<Node> {
    let nodes = pair_amounts(tokens);
    let nodes = attach_qualifiers(nodes);
    let nodes = link_alternates(nodes);
    let nodes = complete(nodes);
    debug!(
        "Tagged {} tokens into {} nodes ({} amounts)",
        tokens.len(),
        nodes.len(),
        nodes.iter().filter(|n| n.is_amount()).count()
    );
    nodes
}

fn wrap(amount: Amount, is_qualifier: bool) -> Node {
    if is_qualifier {
        Node::Qualifier(amount)
    } else {
        Node::Amount(amount)
    }
}

/// Consume a following "each", marking the amount as a per-item measurement.
/// Returns the number of tokens consumed.
fn take_each(amount: &mut Amount, rest: &[Token]) -> usize {
    match rest.first() {
        Some(next) if next.is_word("each") => {
            amount.per_each = true;
            amount.retag(SemanticTag::Quantity, SemanticTag::EaUnit);
            amount.tokens.push(next.clone().with_tag(SemanticTag::EaUnit));
            1
        }
        _ => 0,
    }
}

/// Index of the ")" closing the "(" at `open`, if it closes before the end
fn find_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token.text.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pair quantities with units
///
/// Recognized shapes, tried in order for every quantity:
///
/// - `Q Unit` ("2 cups")
/// - `Q interposer Unit` ("1 packed cup"); the interposed word is kept after the amount
/// - `Q ( amounts ) Unit` ("2 (6-ounce) cans"); inner amounts become per-each qualifiers
/// - a lone quantity, completed with `ea`
///
/// A unit without a quantity is completed with quantity 1 ("pinch of salt").
/// Quantities ending in a dash produce [`Node::Qualifier`] nodes.
pub fn pair_amounts(tokens: &[Token]) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.is_unit() {
            if let Some(unit) = token.unit() {
                let mut amount = Amount::new(1.0, unit).with_tokens(vec![token.clone()]);
                let used = take_each(&mut amount, &tokens[i + 1..]);
                trace!("Orphan unit '{}' completed as {}", token.text, amount);
                nodes.push(Node::Amount(amount));
                i += 1 + used;
                continue;
            }
        }

        let number = match token.number() {
            Some(number) if token.is_quantity() => number,
            _ => {
                nodes.push(Node::Word(token.clone()));
                i += 1;
                continue;
            }
        };
        let is_qualifier = token.tag == SemanticTag::EaQuantity;

        // Q Unit
        if let Some(unit_token) = tokens.get(i + 1).filter(|t| t.is_unit()) {
            if let Some(unit) = unit_token.unit() {
                let mut amount =
                    Amount::new(number.value, unit).with_tokens(vec![token.clone(), unit_token.clone()]);
                let used = take_each(&mut amount, &tokens[i + 2..]);
                nodes.push(wrap(amount, is_qualifier));
                i += 2 + used;
                continue;
            }
        }

        // Q interposer Unit
        if let (Some(word), Some(unit_token)) = (tokens.get(i + 1), tokens.get(i + 2)) {
            if unit_token.is_unit() && UNIT_INTERPOSERS.contains(word.lower().as_str()) {
                if let Some(unit) = unit_token.unit() {
                    let mut amount =
                        Amount::new(number.value, unit).with_tokens(vec![token.clone(), unit_token.clone()]);
                    let used = take_each(&mut amount, &tokens[i + 3..]);
                    nodes.push(wrap(amount, is_qualifier));
                    nodes.push(Node::Word(word.clone()));
                    i += 3 + used;
                    continue;
                }
            }
        }

        // Q ( amounts ) Unit
        if tokens.get(i + 1).is_some_and(|t| t.text == "(") {
            if let Some(close) = find_close(tokens, i + 1) {
                let unit_token = tokens.get(close + 1).filter(|t| t.is_unit());
                if let Some((unit_token, unit)) = unit_token.and_then(|t| t.unit().map(|u| (t, u))) {
                    let mut amount =
                        Amount::new(number.value, unit).with_tokens(vec![token.clone(), unit_token.clone()]);
                    let mut asides = Vec::new();
                    for inner in pair_amounts(&tokens[i + 2..close]) {
                        match inner {
                            Node::Amount(q) | Node::Qualifier(q) => amount.qualifiers.push(q.per_each()),
                            Node::Word(w) if w.text != "/" => asides.push(Node::Word(w)),
                            Node::Word(_) => {}
                        }
                    }
                    let used = take_each(&mut amount, &tokens[close + 2..]);
                    trace!("Parenthesized qualifiers folded into {}", amount);
                    nodes.push(wrap(amount, is_qualifier));
                    nodes.extend(asides);
                    i = close + 2 + used;
                    continue;
                }
            }
        }

        let amount = Amount::new(number.value, UnitId::Each).with_tokens(vec![token.clone()]);
        trace!("Orphan quantity '{}' completed as {}", token.text, amount);
        nodes.push(wrap(amount, is_qualifier));
        i += 1;
    }

    nodes
}

/// Attach qualifier nodes to the most recent count-style amount
///
/// A qualifier with no count before it stands on its own as a plain amount
/// ("8-ounce package" read without a leading count).
pub fn attach_qualifiers(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut host: Option<usize> = None;

    for node in nodes {
        match node {
            Node::Amount(amount) => {
                let is_count = amount.unit.is_count();
                out.push(Node::Amount(amount));
                if is_count {
                    host = Some(out.len() - 1);
                }
            }
            Node::Qualifier(qualifier) => match host.and_then(|index| out.get_mut(index)) {
                Some(Node::Amount(count)) => {
                    trace!("Qualifier {} attached to {}", qualifier, count);
                    count.qualifiers.push(qualifier.per_each());
                }
                _ => out.push(Node::Amount(qualifier)),
            },
            word => out.push(word),
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Link {
    Alternate,
    Plus,
}

/// Link alternate and additive amounts to the amount they belong to
///
/// - `A / B`, `A or B`: B is an alternate of A
/// - `A ( B ... )`: every amount in the parenthetical group is an alternate of A
/// - `A ... about B`: B is an alternate of A; the approximator word is kept
/// - `A plus B`: B is added to A
///
/// Linked amounts are removed from the stream and live on as children of A.
pub fn link_alternates(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut anchor: Option<usize> = None;
    let mut pending: Option<Link> = None;
    let mut alt_group = false;
    let mut iter = nodes.into_iter().peekable();

    while let Some(node) = iter.next() {
        let next_is_amount = matches!(iter.peek(), Some(Node::Amount(_)) | Some(Node::Qualifier(_)));
        let last_is_amount = matches!(out.last(), Some(Node::Amount(_)));

        match node {
            Node::Amount(mut amount) | Node::Qualifier(mut amount) => {
                let link = pending.take().or(if alt_group { Some(Link::Alternate) } else { None });
                match (link, anchor) {
                    (Some(link), Some(index)) => {
                        if let Some(Node::Amount(host)) = out.get_mut(index) {
                            let tail = host.tail_mut();
                            if link == Link::Plus {
                                amount.retag(SemanticTag::PlusAmount, SemanticTag::PlusAmount);
                                amount.is_plus = true;
                                trace!("Plus amount {} added to {}", amount, tail);
                                tail.plus = Some(Box::new(amount));
                            } else {
                                amount.retag(SemanticTag::AltQuantity, SemanticTag::AltUnit);
                                trace!("Alternate amount {} linked to {}", amount, tail);
                                tail.alternates.push(amount);
                            }
                        }
                    }
                    _ => {
                        out.push(Node::Amount(amount));
                        anchor = Some(out.len() - 1);
                    }
                }
            }
            Node::Word(token) => {
                let lower = token.lower();
                match lower.as_str() {
                    "/" | "or" if last_is_amount && next_is_amount => pending = Some(Link::Alternate),
                    "plus" if last_is_amount && next_is_amount => pending = Some(Link::Plus),
                    "(" => {
                        alt_group = last_is_amount;
                        out.push(Node::Word(token));
                    }
                    ")" => {
                        alt_group = false;
                        out.push(Node::Word(token));
                    }
                    word if is_approximator(word) && anchor.is_some() && next_is_amount => {
                        pending = Some(Link::Alternate);
                        out.push(Node::Word(token));
                    }
                    _ => out.push(Node::Word(token)),
                }
            }
        }
    }

    out
}

/// Insert an implicit `1 ea` when a stream holds no amount at all
pub fn complete(mut nodes: Vec<Node>) -> Vec<Node> {
    if !nodes.iter().any(Node::is_amount) {
        trace!("No amount found; assuming 1 ea");
        nodes.insert(0, Node::Amount(Amount::new(1.0, UnitId::Each)));
    }
    nodes
}

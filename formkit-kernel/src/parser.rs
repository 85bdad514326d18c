//! Action grammar.
//!
//! Single actions use the unified `type { body }` form; the body is kept
//! verbatim and lexed by the handler that owns it. Ordered sequences wrap
//! comma-separated actions in `[` `]`. Text without a leading `word:` is a
//! plain `command` action. The old `type: value` form is rejected.

use std::sync::OnceLock;

use regex::Regex;

use crate::action::{Action, ActionDefinition, BlockBody};
use crate::error::ParseError;

/// Type used for text that names no action type.
pub const DEFAULT_TYPE: &str = "command";

fn unified_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^\s*(\w+)\s*\{(.*)\}\s*$").expect("unified action pattern is valid")
    })
}

fn legacy_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*\w+\s*:").expect("legacy action pattern is valid"))
}

/// Split `type { inner }` into its type and the text between the braces.
pub fn split_unified(text: &str) -> Option<(&str, &str)> {
    let caps = unified_pattern().captures(text)?;
    let action_type = caps.get(1)?.as_str();
    let inner = caps.get(2)?.as_str();
    Some((action_type, inner))
}

/// Whether `text` is written in the retired `type: value` form.
pub fn is_legacy(text: &str) -> bool {
    split_unified(text).is_none() && legacy_pattern().is_match(text)
}

/// Parse one action.
pub fn parse(text: &str) -> Result<ActionDefinition, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some((action_type, inner)) = split_unified(text) {
        if BlockBody::lex(inner).is_empty() {
            return Err(ParseError::NoOperands(action_type.to_lowercase()));
        }
        return Ok(ActionDefinition::new().with(action_type, text));
    }

    if legacy_pattern().is_match(trimmed) {
        return Err(ParseError::LegacySyntax(trimmed.to_string()));
    }

    Ok(ActionDefinition::new().with(DEFAULT_TYPE, trimmed))
}

/// A click payload after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedClick {
    /// Runs with per-type short-circuit.
    Single(ActionDefinition),
    /// Runs with critical-gated continuation.
    Sequence(Vec<Action>),
}

/// Parse a click payload: either one action or a bracketed list.
///
/// A parse failure in any list element fails the whole payload.
pub fn parse_click(text: &str) -> Result<ParsedClick, ParseError> {
    let trimmed = text.trim();
    let Some(list) = trimmed.strip_prefix('[') else {
        return parse(trimmed).map(ParsedClick::Single);
    };
    let Some(inner) = list.strip_suffix(']') else {
        return Err(ParseError::UnterminatedList(trimmed.to_string()));
    };

    let actions = split_list(inner)
        .iter()
        .map(|item| parse(item).map(Action::new))
        .collect::<Result<Vec<_>, _>>()?;
    if actions.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(ParsedClick::Sequence(actions))
}

/// Split on commas that are outside quotes, braces and brackets.
/// Blank elements are dropped.
pub fn split_list(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for c in inner.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '{' | '[' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            '}' | ']' if !in_quotes => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if !in_quotes && depth == 0 => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// `{` count minus `}` count.
pub fn brace_balance(text: &str) -> i64 {
    text.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

//! Action definitions and the block bodies handlers read their arguments from.

use std::fmt;

use indexmap::IndexMap;

use crate::parser;

/// Reserved type name for branching actions.
pub const CONDITIONAL: &str = "conditional";

/// Raw value attached to one action type.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Text(String),
    Number(f64),
    Block(BlockBody),
}

impl ActionValue {
    /// Normalize any value into a block body.
    ///
    /// `type { ... }` text is lexed, other text becomes a single operand.
    pub fn body(&self) -> BlockBody {
        match self {
            ActionValue::Text(text) => match parser::split_unified(text) {
                Some((_, inner)) => BlockBody::lex(inner),
                None => {
                    let trimmed = text.trim();
                    let mut body = BlockBody::default();
                    if !trimmed.is_empty() {
                        body.operands.push(trimmed.to_string());
                    }
                    body
                }
            },
            ActionValue::Number(n) => BlockBody {
                operands: vec![format_number(*n)],
                ..BlockBody::default()
            },
            ActionValue::Block(body) => body.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ActionValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ActionValue {
    fn from(text: &str) -> Self {
        ActionValue::Text(text.to_string())
    }
}

impl From<String> for ActionValue {
    fn from(text: String) -> Self {
        ActionValue::Text(text)
    }
}

impl From<f64> for ActionValue {
    fn from(n: f64) -> Self {
        ActionValue::Number(n)
    }
}

impl fmt::Display for ActionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionValue::Text(text) => f.write_str(text),
            ActionValue::Number(n) => f.write_str(&format_number(*n)),
            ActionValue::Block(body) => write!(f, "{body}"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Structured contents of a `{ ... }` block.
///
/// ```text
/// conditional {
///     check: "permission:vip"
///     true:
///     - "message { Welcome back }"
///     false:
///     - "message { Members only }"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockBody {
    /// `- "..."` entries outside any section, in order.
    pub operands: Vec<String>,
    /// `key: "value"` entries.
    pub fields: IndexMap<String, String>,
    /// `name:` headers and the entries listed under them.
    pub sections: IndexMap<String, Vec<String>>,
}

impl BlockBody {
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty() && self.fields.is_empty() && self.sections.is_empty()
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn section(&self, name: &str) -> &[String] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lex the text between the outer braces.
    ///
    /// Only `key: "quoted"` is a field and only a bare `key:` opens a
    /// section. Every other line is an operand verbatim, so
    /// `message { Score: 10 }` has the operand `Score: 10`.
    pub fn lex(inner: &str) -> Self {
        let mut body = BlockBody::default();
        let mut section: Option<String> = None;
        let mut rest = inner.trim_start();

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('-') {
                let (item, tail) = take_item(after.trim_start_matches([' ', '\t']));
                match &section {
                    Some(name) => body.sections.entry(name.clone()).or_default().push(item),
                    None => body.operands.push(item),
                }
                rest = tail;
            } else if let Some((key, after)) = split_key(rest)
                .map(|(key, after)| (key, after.trim_start_matches([' ', '\t'])))
                .filter(|(_, after)| {
                    after.is_empty() || after.starts_with(['"', '\n', '\r', '-'])
                })
            {
                if after.starts_with('"') {
                    let (value, tail) = take_quoted(after);
                    body.fields.insert(key, value);
                    section = None;
                    rest = tail;
                } else {
                    body.sections.entry(key.clone()).or_default();
                    section = Some(key);
                    rest = after;
                }
            } else {
                let (line, tail) = take_line(rest);
                if !line.is_empty() {
                    match &section {
                        Some(name) => body.sections.entry(name.clone()).or_default().push(line),
                        None => body.operands.push(line),
                    }
                }
                rest = tail;
            }
            rest = rest.trim_start();
        }

        body
    }
}

impl fmt::Display for BlockBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (key, value) in &self.fields {
            write!(f, " {key}: {}", quote(value))?;
        }
        for operand in &self.operands {
            write!(f, " - {}", quote(operand))?;
        }
        for (name, items) in &self.sections {
            write!(f, " {name}:")?;
            for item in items {
                write!(f, " - {}", quote(item))?;
            }
        }
        f.write_str(" }")
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `word:` at the start of `text`, returning the lower-cased word and the
/// text after the colon.
fn split_key(text: &str) -> Option<(String, &str)> {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    let after = text[end..].trim_start_matches([' ', '\t']);
    let after = after.strip_prefix(':')?;
    // `https://` and friends are text, not keys.
    if after.starts_with("//") {
        return None;
    }
    Some((text[..end].to_lowercase(), after))
}

fn take_item(text: &str) -> (String, &str) {
    if text.starts_with('"') {
        take_quoted(text)
    } else {
        take_line(text)
    }
}

fn take_line(text: &str) -> (String, &str) {
    let end = text.find(['\n', '\r']).unwrap_or(text.len());
    (text[..end].trim().to_string(), &text[end..])
}

/// Read a double-quoted string starting at `text[0]`. Backslash escapes the
/// next character. An unterminated string runs to the end of input.
fn take_quoted(text: &str) -> (String, &str) {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (value, &text[i + 1..]);
        } else {
            value.push(c);
        }
    }
    (value, "")
}

/// Ordered, case-insensitive mapping of action type to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionDefinition {
    actions: IndexMap<String, ActionValue>,
}

impl ActionDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, action_type: &str, value: impl Into<ActionValue>) -> Self {
        self.add(action_type, value);
        self
    }

    /// Add or replace one type. A replaced type keeps its original position.
    pub fn add(&mut self, action_type: &str, value: impl Into<ActionValue>) {
        self.actions
            .insert(action_type.trim().to_lowercase(), value.into());
    }

    pub fn get(&self, action_type: &str) -> Option<&ActionValue> {
        self.actions.get(&action_type.trim().to_lowercase())
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionValue)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_conditional(&self) -> bool {
        self.actions.contains_key(CONDITIONAL)
    }

    pub fn is_multi_action(&self) -> bool {
        self.actions.len() > 1 || (self.actions.len() == 1 && !self.is_conditional())
    }

    /// One `type: value` line per entry.
    pub fn to_text(&self) -> String {
        self.actions
            .iter()
            .map(|(action_type, value)| format!("{action_type}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let def = ActionDefinition::new().with(" Message ", "hi");
        assert!(def.get("MESSAGE").is_some());
        assert_eq!(def.types().collect::<Vec<_>>(), vec!["message"]);
    }

    #[test]
    fn test_replacing_keeps_position() {
        let mut def = ActionDefinition::new().with("a", "1").with("b", "2");
        def.add("A", "3");
        assert_eq!(def.types().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(def.get("a"), Some(&ActionValue::from("3")));
    }

    #[test]
    fn test_multi_action_classification() {
        let single = ActionDefinition::new().with("command", "x");
        assert!(single.is_multi_action());
        assert!(!single.is_conditional());

        let cond = ActionDefinition::new().with(CONDITIONAL, "x");
        assert!(cond.is_conditional());
        assert!(!cond.is_multi_action());

        let both = cond.with("message", "y");
        assert!(both.is_multi_action());
        assert!(!ActionDefinition::new().is_multi_action());
    }

    #[test]
    fn test_lex_inline_body() {
        let body = BlockBody::lex(" give @s diamond 1 ");
        assert_eq!(body.operands, vec!["give @s diamond 1"]);
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_lex_quoted_operands() {
        let body = BlockBody::lex("\n  - \"say \\\"hi\\\"\"\n  - \"say bye\"\n");
        assert_eq!(body.operands, vec!["say \"hi\"", "say bye"]);
    }

    #[test]
    fn test_lex_fields_and_sections() {
        let body = BlockBody::lex(
            "check: \"permission:vip\"\ntrue:\n- \"message { yes }\"\nfalse:\n- \"message { no }\"",
        );
        assert_eq!(body.field("check"), Some("permission:vip"));
        assert_eq!(body.section("true"), ["message { yes }"]);
        assert_eq!(body.section("false"), ["message { no }"]);
        assert!(body.operands.is_empty());
    }

    #[test]
    fn test_lex_single_line_sections() {
        let body = BlockBody::lex("check: \"plugin:Vault\" true: - \"a\" - \"b\" false: - \"c\"");
        assert_eq!(body.section("true"), ["a", "b"]);
        assert_eq!(body.section("false"), ["c"]);
    }

    #[test]
    fn test_lex_unquoted_colon_is_text() {
        let body = BlockBody::lex("Score: 10");
        assert_eq!(body.operands, vec!["Score: 10"]);
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_lex_urls_are_not_keys() {
        let body = BlockBody::lex("https://example.com/page");
        assert_eq!(body.operands, vec!["https://example.com/page"]);
    }

    #[test]
    fn test_body_of_unified_text() {
        let value = ActionValue::from("message { - \"a\" - \"b\" }");
        assert_eq!(value.body().operands, vec!["a", "b"]);
        assert_eq!(ActionValue::Number(1500.0).body().operands, vec!["1500"]);
    }

    #[test]
    fn test_to_text() {
        let def = ActionDefinition::new()
            .with("command", "command { say hi }")
            .with("delay", 20.0);
        assert_eq!(def.to_text(), "command: command { say hi }\ndelay: 20");
    }
}

//! Condition expressions.
//!
//! Grammar: `[not:]type:operand[,operand...]` where `type` is one of
//! `permission`, `placeholder`, `plugin`, `bedrock_player`, `java_player`.
//!
//! - `permission:a,b` holds when the identity has every listed permission.
//! - `plugin:a,b` holds when every listed extension is enabled.
//! - `placeholder:<name>:<operator>:<expected>` compares rendered text.
//!   Everything after the operator is the expected value, colons included.
//!
//! Evaluation faults yield `false` after negation, so `not:` never turns a
//! broken condition into `true`.

use formkit_api::{ClientPlatform, ExtensionPresenceRef, IdentityRef, PlaceholderExpanderRef};
use regex::Regex;

use crate::action::ActionContext;
use crate::error::ConditionError;

const NEGATION: &str = "not";

/// Evaluates condition expressions for an identity.
#[derive(Default, Clone)]
pub struct ConditionEvaluator {
    extensions: Option<ExtensionPresenceRef>,
    expander: Option<PlaceholderExpanderRef>,
}

/// Comparison operators accepted by `placeholder` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Regex,
    Empty,
    NotEmpty,
}

impl Operator {
    fn parse(text: &str) -> Option<Self> {
        Some(match text.trim().to_lowercase().as_str() {
            "equals" | "==" => Operator::Equals,
            "not_equals" | "!=" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            ">" | "greater_than" => Operator::Greater,
            ">=" | "greater_equal" => Operator::GreaterEqual,
            "<" | "less_than" => Operator::Less,
            "<=" | "less_equal" => Operator::LessEqual,
            "regex" => Operator::Regex,
            "empty" => Operator::Empty,
            "not_empty" => Operator::NotEmpty,
            _ => return None,
        })
    }

    /// Whether the operator reads an expected value.
    fn takes_operand(self) -> bool {
        !matches!(self, Operator::Empty | Operator::NotEmpty)
    }

    fn apply(self, actual: &str, expected: &str) -> Result<bool, ConditionError> {
        let numeric = |f: fn(f64, f64) -> bool| -> Result<bool, ConditionError> {
            Ok(f(parse_number(actual)?, parse_number(expected)?))
        };
        match self {
            Operator::Equals => Ok(actual == expected),
            Operator::NotEquals => Ok(actual != expected),
            Operator::Contains => Ok(actual.contains(expected)),
            Operator::StartsWith => Ok(actual.starts_with(expected)),
            Operator::EndsWith => Ok(actual.ends_with(expected)),
            Operator::Greater => numeric(|a, b| a > b),
            Operator::GreaterEqual => numeric(|a, b| a >= b),
            Operator::Less => numeric(|a, b| a < b),
            Operator::LessEqual => numeric(|a, b| a <= b),
            // Whole-string match.
            Operator::Regex => Ok(Regex::new(&format!("^(?:{expected})$"))?.is_match(actual)),
            Operator::Empty => Ok(actual.trim().is_empty()),
            Operator::NotEmpty => Ok(!actual.trim().is_empty()),
        }
    }
}

fn parse_number(text: &str) -> Result<f64, ConditionError> {
    text.trim()
        .parse()
        .map_err(|_| ConditionError::NotANumber(text.to_string()))
}

/// Split off a leading `not:`.
fn strip_negation(expression: &str) -> (bool, &str) {
    match expression.split_once(':') {
        Some((head, rest)) if head.trim().eq_ignore_ascii_case(NEGATION) => (true, rest),
        _ => (false, expression),
    }
}

fn list(operand: &str) -> impl Iterator<Item = &str> {
    operand.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl ConditionEvaluator {
    pub fn new(
        extensions: Option<ExtensionPresenceRef>,
        expander: Option<PlaceholderExpanderRef>,
    ) -> Self {
        Self {
            extensions,
            expander,
        }
    }

    /// Evaluate `expression`. Blank expressions hold; faults do not.
    pub fn evaluate(&self, identity: &IdentityRef, expression: &str, context: &ActionContext) -> bool {
        if expression.trim().is_empty() {
            return true;
        }
        let (negate, body) = strip_negation(expression.trim());
        match self.try_evaluate(identity, body, context) {
            Ok(met) => met != negate,
            Err(e) => {
                tracing::warn!(
                    "Condition '{}' failed for {}: {}",
                    expression,
                    identity.name(),
                    e
                );
                false
            }
        }
    }

    /// Evaluate a condition without its `not:` prefix.
    pub fn try_evaluate(
        &self,
        identity: &IdentityRef,
        expression: &str,
        context: &ActionContext,
    ) -> Result<bool, ConditionError> {
        let (kind, operand) = match expression.split_once(':') {
            Some((kind, operand)) => (kind.trim().to_lowercase(), operand),
            None => (expression.trim().to_lowercase(), ""),
        };

        match kind.as_str() {
            "permission" => {
                let mut permissions = list(operand).peekable();
                if permissions.peek().is_none() {
                    return Err(ConditionError::MissingOperand(expression.to_string()));
                }
                Ok(permissions.all(|p| identity.has_permission(p)))
            }
            "plugin" => {
                let mut names = list(operand).peekable();
                if names.peek().is_none() {
                    return Err(ConditionError::MissingOperand(expression.to_string()));
                }
                match &self.extensions {
                    Some(extensions) => Ok(names.all(|name| extensions.is_enabled(name))),
                    None => {
                        tracing::warn!("No extension presence configured, plugin conditions are false");
                        Ok(false)
                    }
                }
            }
            "placeholder" => self.placeholder(identity, expression, operand, context),
            "bedrock_player" => Ok(identity.platform() == ClientPlatform::Bedrock),
            "java_player" => Ok(identity.platform() == ClientPlatform::Java),
            _ => Err(ConditionError::UnknownType(kind)),
        }
    }

    fn placeholder(
        &self,
        identity: &IdentityRef,
        expression: &str,
        operand: &str,
        context: &ActionContext,
    ) -> Result<bool, ConditionError> {
        let mut parts = operand.splitn(3, ':');
        let name = parts.next().unwrap_or_default();
        let operator = parts.next().unwrap_or_default();
        let expected = parts.next();

        if name.trim().is_empty() || operator.trim().is_empty() {
            return Err(ConditionError::MissingOperand(expression.to_string()));
        }
        let operator = Operator::parse(operator)
            .ok_or_else(|| ConditionError::UnknownOperator(operator.to_string()))?;
        let expected = match expected {
            Some(expected) => expected,
            None if operator.takes_operand() => {
                return Err(ConditionError::MissingOperand(expression.to_string()));
            }
            None => "",
        };

        let actual = self.resolve(identity, name, context);
        let expected = self.resolve(identity, expected, context);
        operator.apply(&actual, &expected)
    }

    fn resolve(&self, identity: &IdentityRef, text: &str, context: &ActionContext) -> String {
        let rendered = context.render(text);
        match &self.expander {
            Some(expander) => expander.expand(identity, &rendered),
            None => rendered,
        }
    }

    /// Structural check only: known type and enough operands.
    pub fn is_valid_condition(expression: &str) -> bool {
        let expression = expression.trim();
        if expression.is_empty() {
            return true;
        }
        let (_, body) = strip_negation(expression);
        let (kind, operand) = match body.split_once(':') {
            Some((kind, operand)) => (kind.trim().to_lowercase(), operand),
            None => (body.trim().to_lowercase(), ""),
        };
        match kind.as_str() {
            "permission" | "plugin" => list(operand).next().is_some(),
            "placeholder" => {
                let parts: Vec<&str> = operand.splitn(3, ':').collect();
                match (parts.first(), parts.get(1).and_then(|op| Operator::parse(op))) {
                    (Some(name), Some(op)) if !name.trim().is_empty() => {
                        !op.takes_operand() || parts.len() == 3
                    }
                    _ => false,
                }
            }
            "bedrock_player" | "java_player" => true,
            _ => false,
        }
    }
}

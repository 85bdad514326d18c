//! Per-invocation context: placeholders, form results and metadata.

use std::collections::HashMap;

use chrono::{Local, Timelike};
use formkit_api::IdentityRef;
use serde_json::Value;

use crate::menu::MenuType;

/// Immutable bag of values visible to handlers and conditions.
///
/// Build one with [`ActionContext::builder`]; derive a changed copy with
/// [`ActionContext::to_builder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionContext {
    placeholders: HashMap<String, String>,
    form_results: HashMap<String, Value>,
    metadata: HashMap<String, Value>,
    menu_name: Option<String>,
    form_type: Option<MenuType>,
}

impl ActionContext {
    pub fn builder() -> ActionContextBuilder {
        ActionContextBuilder::default()
    }

    pub fn to_builder(&self) -> ActionContextBuilder {
        ActionContextBuilder {
            inner: self.clone(),
        }
    }

    pub fn placeholders(&self) -> &HashMap<String, String> {
        &self.placeholders
    }

    pub fn placeholder(&self, key: &str) -> Option<&str> {
        self.placeholders.get(key).map(String::as_str)
    }

    pub fn form_results(&self) -> &HashMap<String, Value> {
        &self.form_results
    }

    pub fn form_result(&self, key: &str) -> Option<&Value> {
        self.form_results.get(key)
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn menu_name(&self) -> Option<&str> {
        self.menu_name.as_deref()
    }

    pub fn form_type(&self) -> Option<MenuType> {
        self.form_type
    }

    /// A copy with `player`, `uuid` and the clock placeholders added.
    ///
    /// `time` is the wall clock mapped onto a 24000-tick day.
    pub fn with_builtins(&self, identity: &IdentityRef) -> Self {
        let now = Local::now();
        let (hour, minute) = (now.hour(), now.minute());
        let ticks = (hour * 60 + minute) * 24000 / (24 * 60);

        self.to_builder()
            .placeholder("player", identity.name())
            .placeholder("uuid", identity.id().to_string())
            .placeholder("time", ticks.to_string())
            .placeholder("hour", hour.to_string())
            .placeholder("minute", minute.to_string())
            .placeholder("timestamp", now.timestamp_millis().to_string())
            .build()
    }

    /// Replace `$key` and `{key}` tokens from placeholders, then form results.
    ///
    /// Longer keys are replaced first so `$10` is not read as `$1` + `0`.
    pub fn render(&self, text: &str) -> String {
        self.render_with(text, &|_, _| false)
    }

    /// [`render`](Self::render) for a click payload. A `{key}` that follows
    /// an action type name is that action's block, as in `open {shop}`,
    /// and is left as written.
    pub fn render_payload(&self, text: &str, is_action_type: impl Fn(&str) -> bool) -> String {
        self.render_with(text, &|text, at| opens_block(text, at, &is_action_type))
    }

    fn render_with(&self, text: &str, keep_brace: &dyn Fn(&str, usize) -> bool) -> String {
        if !text.contains('$') && !text.contains('{') {
            return text.to_string();
        }
        let mut result = substitute(
            text,
            self.placeholders.iter().map(|(k, v)| (k, v.clone())),
            keep_brace,
        );
        result = substitute(
            &result,
            self.form_results.iter().map(|(k, v)| (k, value_text(v))),
            keep_brace,
        );
        result
    }
}

fn substitute<'a>(
    text: &str,
    pairs: impl Iterator<Item = (&'a String, String)>,
    keep_brace: &dyn Fn(&str, usize) -> bool,
) -> String {
    let mut pairs: Vec<_> = pairs.collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut result = text.to_string();
    for (key, value) in pairs {
        result = result.replace(&format!("${key}"), &value);
        result = replace_braces(&result, &format!("{{{key}}}"), &value, keep_brace);
    }
    result
}

fn replace_braces(
    text: &str,
    token: &str,
    value: &str,
    keep: &dyn Fn(&str, usize) -> bool,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (at, _) in text.match_indices(token) {
        if keep(text, at) {
            continue;
        }
        out.push_str(&text[copied..at]);
        out.push_str(value);
        copied = at + token.len();
    }
    out.push_str(&text[copied..]);
    out
}

/// Whether the brace at `at` opens the block of a preceding action type.
fn opens_block(text: &str, at: usize, is_action_type: &dyn Fn(&str) -> bool) -> bool {
    let before = text[..at].trim_end();
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map_or(before.len(), |(i, _)| i);
    let word = &before[start..];
    !word.is_empty() && is_action_type(word)
}

/// Display form of a form result: strings unquoted, everything else as JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionContextBuilder {
    inner: ActionContext,
}

impl ActionContextBuilder {
    pub fn placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.placeholders.insert(key.into(), value.into());
        self
    }

    pub fn placeholders<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner
            .placeholders
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn form_result(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.form_results.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.metadata.insert(key.into(), value.into());
        self
    }

    pub fn menu_name(mut self, name: impl Into<String>) -> Self {
        self.inner.menu_name = Some(name.into());
        self
    }

    pub fn form_type(mut self, form_type: MenuType) -> Self {
        self.inner.form_type = Some(form_type);
        self
    }

    pub fn build(self) -> ActionContext {
        self.inner
    }
}

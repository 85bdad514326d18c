//! Loaded menu model.
//!
//! Built from [`MenuConfig`] on every reload. Buttons come in three shapes:
//! plain, conditional (per-property overrides and a show condition) and
//! prioritized (an ordering and a view requirement around another button).

use formkit_api::IdentityRef;
use indexmap::IndexMap;

use super::MenuType;
use crate::action::ActionContext;
use crate::condition::ConditionEvaluator;
use crate::config::{ButtonConfig, ComponentConfig, MenuConfig};
use crate::error::MenuError;
use crate::priority::Prioritized;

/// What a button looks like and does once all conditions are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonFace {
    pub text: String,
    pub image: Option<String>,
    pub on_click: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    Image,
    OnClick,
}

impl PropertyKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(PropertyKind::Text),
            "image" => Some(PropertyKind::Image),
            "onclick" | "on_click" => Some(PropertyKind::OnClick),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalProperty {
    pub condition: String,
    pub property: PropertyKind,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalButton {
    pub base: ButtonFace,
    pub show_condition: Option<String>,
    pub alternative_text: Option<String>,
    pub alternative_image: Option<String>,
    pub alternative_on_click: Option<String>,
    /// In declaration order; the first holding entry of a kind wins.
    pub properties: Vec<ConditionalProperty>,
}

impl ConditionalButton {
    /// Resolve each property: first holding override, then the
    /// alternative value, then the base value.
    pub fn effective(
        &self,
        evaluator: &ConditionEvaluator,
        identity: &IdentityRef,
        context: &ActionContext,
    ) -> ButtonFace {
        let pick = |kind| self.matched(kind, evaluator, identity, context);
        ButtonFace {
            text: pick(PropertyKind::Text)
                .or_else(|| self.alternative_text.clone())
                .unwrap_or_else(|| self.base.text.clone()),
            image: pick(PropertyKind::Image)
                .or_else(|| self.alternative_image.clone())
                .or_else(|| self.base.image.clone()),
            on_click: pick(PropertyKind::OnClick)
                .or_else(|| self.alternative_on_click.clone())
                .or_else(|| self.base.on_click.clone()),
        }
    }

    fn matched(
        &self,
        kind: PropertyKind,
        evaluator: &ConditionEvaluator,
        identity: &IdentityRef,
        context: &ActionContext,
    ) -> Option<String> {
        self.properties
            .iter()
            .filter(|p| p.property == kind)
            .find(|p| evaluator.evaluate(identity, &p.condition, context))
            .map(|p| p.value.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityItem {
    pub priority: i32,
    pub view_requirement: Option<String>,
    pub button: Box<Button>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Button {
    Plain(ButtonFace),
    Conditional(ConditionalButton),
    Prioritized(PriorityItem),
}

impl Button {
    pub fn from_config(key: &str, config: &ButtonConfig) -> Self {
        let base = ButtonFace {
            text: config.text.clone().unwrap_or_default(),
            image: config.image.clone(),
            on_click: config.on_click.clone(),
        };

        let button = if config.is_conditional() {
            let properties = config
                .conditions
                .iter()
                .filter_map(|(entry_key, entry)| {
                    let Some(property) = PropertyKind::parse(&entry.property) else {
                        tracing::warn!(
                            "Button '{}' condition '{}' has unknown property '{}'",
                            key,
                            entry_key,
                            entry.property
                        );
                        return None;
                    };
                    Some(ConditionalProperty {
                        condition: entry.condition.clone().unwrap_or_else(|| entry_key.clone()),
                        property,
                        value: entry.value.clone(),
                    })
                })
                .collect();
            Button::Conditional(ConditionalButton {
                base,
                show_condition: config.show_condition.clone(),
                alternative_text: config.alternative_text.clone(),
                alternative_image: config.alternative_image.clone(),
                alternative_on_click: config.alternative_on_click.clone(),
                properties,
            })
        } else {
            Button::Plain(base)
        };

        if config.is_prioritized() {
            Button::Prioritized(PriorityItem {
                priority: config.priority.unwrap_or(0),
                view_requirement: config.view_requirement.clone(),
                button: Box::new(button),
            })
        } else {
            button
        }
    }

    pub fn show_condition(&self) -> Option<&str> {
        match self {
            Button::Plain(_) => None,
            Button::Conditional(c) => c.show_condition.as_deref(),
            Button::Prioritized(p) => p.button.show_condition(),
        }
    }

    /// Whether the show condition (if any) holds.
    pub fn is_shown(
        &self,
        evaluator: &ConditionEvaluator,
        identity: &IdentityRef,
        context: &ActionContext,
    ) -> bool {
        match self.show_condition() {
            Some(condition) => evaluator.evaluate(identity, condition, context),
            None => true,
        }
    }

    pub fn effective(
        &self,
        evaluator: &ConditionEvaluator,
        identity: &IdentityRef,
        context: &ActionContext,
    ) -> ButtonFace {
        match self {
            Button::Plain(face) => face.clone(),
            Button::Conditional(c) => c.effective(evaluator, identity, context),
            Button::Prioritized(p) => p.button.effective(evaluator, identity, context),
        }
    }
}

impl Prioritized for Button {
    fn priority(&self) -> i32 {
        match self {
            Button::Prioritized(p) => p.priority,
            _ => 0,
        }
    }

    fn view_requirement(&self) -> Option<&str> {
        match self {
            Button::Prioritized(p) => p.view_requirement.as_deref(),
            _ => None,
        }
    }
}

/// A menu ready to be opened.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub name: String,
    pub kind: MenuType,
    pub command: Option<String>,
    pub intercept: Option<String>,
    pub permission: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub buttons: Vec<Button>,
    pub components: IndexMap<String, ComponentConfig>,
    pub global_actions: Vec<String>,
}

impl Menu {
    pub fn from_config(name: &str, config: &MenuConfig) -> Result<Self, MenuError> {
        let kind = MenuType::parse(&config.kind)
            .ok_or_else(|| MenuError::UnknownType(config.kind.clone()))?;
        if kind == MenuType::Modal && config.buttons.len() != 2 {
            return Err(MenuError::ModalButtons(config.buttons.len()));
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            command: non_blank(&config.command),
            intercept: non_blank(&config.intercept),
            permission: non_blank(&config.permission),
            title: config
                .title
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            content: config.content.clone(),
            buttons: config
                .buttons
                .iter()
                .map(|(key, button)| Button::from_config(key, button))
                .collect(),
            components: config.components.clone(),
            global_actions: config.global_actions.clone(),
        })
    }

    /// Arguments the trigger command declares as `$1`, `$2`, ...
    pub fn required_args(&self) -> usize {
        self.command
            .as_deref()
            .map(count_numbered_placeholders)
            .unwrap_or(0)
    }

    /// Whether `word` is this menu's trigger command or intercept name.
    pub fn is_triggered_by(&self, word: &str) -> bool {
        let word = word.trim_start_matches('/');
        let matches = |source: &Option<String>| {
            source
                .as_deref()
                .and_then(|s| s.split_whitespace().next())
                .map(|first| first.trim_start_matches('/').eq_ignore_ascii_case(word))
                .unwrap_or(false)
        };
        !word.is_empty() && (matches(&self.command) || matches(&self.intercept))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Count `$1`, `$2`, ... present in `text`, stopping at the first gap.
pub fn count_numbered_placeholders(text: &str) -> usize {
    let mut count = 0;
    while text.contains(&format!("${}", count + 1)) {
        count += 1;
    }
    count
}

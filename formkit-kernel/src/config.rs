//! The configuration document.
//!
//! A JSON object with a `menus` table plus optional `messages`, `executor`
//! and `delivery` sections. Maps are `IndexMap`s so declaration order of
//! menus, buttons, conditional entries and components survives loading.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub menus: IndexMap<String, MenuConfig>,
    pub messages: Messages,
    pub executor: ExecutorSettings,
    pub delivery: DeliverySettings,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn default_menu_type() -> String {
    "simple".to_string()
}

/// One menu as written in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(rename = "type", default = "default_menu_type")]
    pub kind: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub intercept: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "description")]
    pub content: Option<String>,
    #[serde(default)]
    pub buttons: IndexMap<String, ButtonConfig>,
    #[serde(default)]
    pub components: IndexMap<String, ComponentConfig>,
    #[serde(default)]
    pub global_actions: Vec<String>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            kind: default_menu_type(),
            command: None,
            intercept: None,
            permission: None,
            title: None,
            content: None,
            buttons: IndexMap::new(),
            components: IndexMap::new(),
            global_actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub text: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "onClick", alias = "on_click")]
    pub on_click: Option<String>,
    pub show_condition: Option<String>,
    pub alternative_text: Option<String>,
    pub alternative_image: Option<String>,
    #[serde(rename = "alternative_onClick", alias = "alternative_on_click")]
    pub alternative_on_click: Option<String>,
    pub conditions: IndexMap<String, ConditionEntry>,
    pub priority: Option<i32>,
    pub view_requirement: Option<String>,
}

impl ButtonConfig {
    /// Whether any conditional display setting is present.
    pub fn is_conditional(&self) -> bool {
        self.show_condition.is_some()
            || self.alternative_text.is_some()
            || self.alternative_image.is_some()
            || self.alternative_on_click.is_some()
            || !self.conditions.is_empty()
    }

    pub fn is_prioritized(&self) -> bool {
        self.priority.is_some() || self.view_requirement.is_some()
    }
}

/// A per-property override: when `condition` holds, `property` shows `value`.
///
/// A missing `condition` falls back to the entry's key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionEntry {
    pub condition: Option<String>,
    pub property: String,
    pub value: String,
}

/// One input control of a custom menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentConfig {
    Input {
        text: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        default: String,
        #[serde(default)]
        action: Option<String>,
    },
    Slider {
        text: String,
        #[serde(default)]
        min: f64,
        #[serde(default = "default_slider_max")]
        max: f64,
        #[serde(default = "default_slider_step")]
        step: f64,
        #[serde(default)]
        default: f64,
        #[serde(default)]
        action: Option<String>,
    },
    Dropdown {
        text: String,
        #[serde(default)]
        options: Vec<String>,
        #[serde(default)]
        default: usize,
        #[serde(default)]
        action: Option<String>,
    },
    Toggle {
        text: String,
        #[serde(default)]
        default: bool,
        #[serde(default)]
        action: Option<String>,
    },
}

fn default_slider_max() -> f64 {
    100.0
}

fn default_slider_step() -> f64 {
    1.0
}

impl ComponentConfig {
    pub fn text(&self) -> &str {
        match self {
            ComponentConfig::Input { text, .. }
            | ComponentConfig::Slider { text, .. }
            | ComponentConfig::Dropdown { text, .. }
            | ComponentConfig::Toggle { text, .. } => text,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            ComponentConfig::Input { action, .. }
            | ComponentConfig::Slider { action, .. }
            | ComponentConfig::Dropdown { action, .. }
            | ComponentConfig::Toggle { action, .. } => action.as_deref(),
        }
    }
}

/// User-facing feedback templates.
///
/// `$menu`, `$args` and `$message` are filled in where they apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub menu_not_found: String,
    pub no_permission: String,
    pub usage: String,
    pub unsupported_client: String,
    pub invalid_action: String,
    pub action_failed: String,
    pub delivery_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            menu_not_found: "Menu '$menu' not found".to_string(),
            no_permission: "You don't have permission to open this menu".to_string(),
            usage: "This menu needs $args argument(s)".to_string(),
            unsupported_client: "Menus are only available on Bedrock clients".to_string(),
            invalid_action: "Invalid action: $message".to_string(),
            action_failed: "Action failed: $message".to_string(),
            delivery_failed: "Could not open menu '$menu', please try again".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// How long an idle async worker lingers before exiting.
    pub keep_alive_ms: u64,
    /// Upper bound accepted by the delay handler.
    pub max_delay_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            keep_alive_ms: 60_000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    pub attempts: u32,
    /// First retry delay, doubled after every failed attempt.
    pub backoff_ms: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 50,
        }
    }
}

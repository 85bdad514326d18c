//! Static checks over a loaded configuration document.
//!
//! The validator never blocks a load. It collects errors (things that will
//! not work) and warnings (things that probably will not do what the
//! author meant) for the operator to read.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::action::{ActionDefinition, CONDITIONAL};
use crate::condition::ConditionEvaluator;
use crate::config::{ButtonConfig, ComponentConfig, EngineConfig, MenuConfig};
use crate::error::ParseError;
use crate::handlers::{ActionRegistry, OPEN_TYPES, open_target};
use crate::menu::{MenuType, PropertyKind};
use crate::parser::{self, ParsedClick};

const MAX_NAME_LEN: usize = 100;
const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = -1000..=1000;
const IMAGE_PREFIXES: [&str; 4] = ["textures/", "pack://", "http://", "https://"];

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("identifier pattern is valid"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn log(&self) {
        for error in &self.errors {
            tracing::error!("Config error: {}", error);
        }
        for warning in &self.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        if self.is_valid() {
            tracing::info!("Configuration valid ({} warnings)", self.warnings.len());
        } else {
            tracing::info!(
                "Configuration has {} errors and {} warnings",
                self.errors.len(),
                self.warnings.len()
            );
        }
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

pub struct ConfigValidator<'a> {
    registry: &'a ActionRegistry,
}

impl<'a> ConfigValidator<'a> {
    pub fn new(registry: &'a ActionRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, config: &EngineConfig) -> ValidationReport {
        let mut report = ValidationReport::default();
        if config.menus.is_empty() {
            report.error("No menus configured".to_string());
            return report;
        }
        for (name, menu) in &config.menus {
            self.check_menu(&mut report, name, menu);
        }
        check_cycles(&mut report, config);
        report
    }

    fn check_menu(&self, report: &mut ValidationReport, name: &str, menu: &MenuConfig) {
        if name.len() > MAX_NAME_LEN || !identifier_re().is_match(name) {
            report.error(format!("Invalid menu name: '{name}'"));
        }

        let kind = MenuType::parse(&menu.kind);
        if kind.is_none() {
            report.error(format!("Invalid menu type '{}' in menu '{name}'", menu.kind));
        }

        if menu.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            report.warn(format!("Menu '{name}' has no title"));
        }

        if let Some(command) = menu.command.as_deref().filter(|c| !c.trim().is_empty()) {
            let command = command.trim();
            if command.starts_with('/') {
                report.warn(format!("Command in menu '{name}' should not start with '/'"));
            }
            let first = command.trim_start_matches('/').split_whitespace().next().unwrap_or("");
            if !identifier_re().is_match(first) {
                report.error(format!("Invalid command format in menu '{name}': '{command}'"));
            }
        }

        match kind {
            Some(MenuType::Modal) if menu.buttons.len() != 2 => {
                report.error(format!(
                    "Modal menu '{name}' must have exactly 2 buttons, found {}",
                    menu.buttons.len()
                ));
            }
            Some(MenuType::Custom) if menu.components.is_empty() && menu.buttons.is_empty() => {
                report.warn(format!("Custom menu '{name}' has no components"));
            }
            Some(MenuType::Simple) | Some(MenuType::Modal) if menu.buttons.is_empty() => {
                report.warn(format!("Menu '{name}' has no buttons"));
            }
            _ => {}
        }

        for (key, button) in &menu.buttons {
            self.check_button(report, name, key, button);
        }
        for (key, component) in &menu.components {
            self.check_component(report, name, key, component);
        }
        for (i, action) in menu.global_actions.iter().enumerate() {
            let location = format!("menu '{name}' global action {i}");
            self.check_payload(report, &location, action);
        }
    }

    fn check_button(&self, report: &mut ValidationReport, menu: &str, key: &str, button: &ButtonConfig) {
        let location = format!("menu '{menu}' button '{key}'");

        if button.text.as_deref().is_none_or(|t| t.trim().is_empty()) {
            report.warn(format!("Button '{key}' in menu '{menu}' has no text"));
        }
        for image in [&button.image, &button.alternative_image].into_iter().flatten() {
            check_image(report, &location, image);
        }

        match button.on_click.as_deref() {
            Some(payload) => self.check_payload(report, &location, payload),
            None if button.alternative_on_click.is_none() => {
                report.warn(format!("Button '{key}' in menu '{menu}' has no onClick action"));
            }
            None => {}
        }
        if let Some(payload) = &button.alternative_on_click {
            self.check_payload(report, &format!("{location} alternative action"), payload);
        }

        if let Some(condition) = &button.show_condition {
            check_condition(report, &location, condition);
        }
        if let Some(requirement) = &button.view_requirement {
            check_condition(report, &location, requirement);
        }
        for (entry_key, entry) in &button.conditions {
            let entry_location = format!("{location} condition '{entry_key}'");
            check_condition(report, &entry_location, entry.condition.as_deref().unwrap_or(entry_key));
            match PropertyKind::parse(&entry.property) {
                Some(PropertyKind::OnClick) => {
                    self.check_payload(report, &entry_location, &entry.value)
                }
                Some(PropertyKind::Image) => check_image(report, &entry_location, &entry.value),
                Some(PropertyKind::Text) => {}
                None => report.warn(format!(
                    "Unknown property '{}' in {entry_location}",
                    entry.property
                )),
            }
        }

        if let Some(priority) = button.priority {
            if !PRIORITY_RANGE.contains(&priority) {
                report.warn(format!(
                    "Priority {priority} of {location} is outside {}..={}",
                    PRIORITY_RANGE.start(),
                    PRIORITY_RANGE.end()
                ));
            }
        }
    }

    fn check_component(
        &self,
        report: &mut ValidationReport,
        menu: &str,
        key: &str,
        component: &ComponentConfig,
    ) {
        let location = format!("menu '{menu}' component '{key}'");
        if component.text().trim().is_empty() {
            report.warn(format!("Component '{key}' in menu '{menu}' has no text"));
        }
        match component {
            ComponentConfig::Slider { min, max, step, .. } if min >= max || *step <= 0.0 => {
                report.warn(format!("Slider range of {location} is empty"));
            }
            ComponentConfig::Dropdown { options, default, .. } => {
                if options.is_empty() {
                    report.warn(format!("Dropdown {location} has no options"));
                } else if *default >= options.len() {
                    report.warn(format!("Default option of {location} is out of range"));
                }
            }
            _ => {}
        }
        if let Some(action) = component.action() {
            self.check_payload(report, &location, action);
        }
    }

    /// Check one click payload: a single action or a bracketed list.
    fn check_payload(&self, report: &mut ValidationReport, location: &str, payload: &str) {
        if payload.trim().is_empty() {
            report.warn(format!("Empty action in {location}"));
            return;
        }
        let definitions = match parser::parse_click(payload) {
            Ok(parsed) => definitions(parsed),
            Err(ParseError::LegacySyntax(text)) => {
                report.error(format!(
                    "Action '{text}' in {location} uses legacy syntax, write it as 'type {{ ... }}'"
                ));
                return;
            }
            Err(e) => {
                report.error(format!("Invalid action in {location}: {e}"));
                return;
            }
        };

        for definition in &definitions {
            for (action_type, value) in definition.iter() {
                let Some(handler) = self.registry.get(action_type) else {
                    report.error(format!("Unknown action type '{action_type}' in {location}"));
                    continue;
                };
                if parser::brace_balance(&value.to_string()) != 0 {
                    report.warn(format!("Unbalanced braces in '{action_type}' action in {location}"));
                }
                if !handler.validate(value) {
                    report.warn(format!("Invalid value for '{action_type}' action in {location}"));
                }
            }
        }
    }
}

fn definitions(parsed: ParsedClick) -> Vec<ActionDefinition> {
    match parsed {
        ParsedClick::Single(definition) => vec![definition],
        ParsedClick::Sequence(actions) => actions.into_iter().map(|a| a.definition).collect(),
    }
}

fn check_image(report: &mut ValidationReport, location: &str, image: &str) {
    let image = image.trim();
    if image.contains('$') || image.contains('%') {
        return;
    }
    if !IMAGE_PREFIXES.iter().any(|prefix| image.starts_with(prefix)) {
        report.warn(format!("Invalid image source '{image}' in {location}"));
    }
}

fn check_condition(report: &mut ValidationReport, location: &str, condition: &str) {
    if !ConditionEvaluator::is_valid_condition(condition) {
        report.warn(format!("Invalid condition '{condition}' in {location}"));
    }
}

/// Every menu an action string can open, including through nested
/// conditional, random and delay actions.
fn open_targets(payload: &str, targets: &mut Vec<String>) {
    let Ok(parsed) = parser::parse_click(payload) else {
        return;
    };
    for definition in definitions(parsed) {
        for (action_type, value) in definition.iter() {
            if OPEN_TYPES.contains(&action_type) {
                targets.extend(open_target(value));
                continue;
            }
            let body = value.body();
            let nested: Vec<&String> = match action_type {
                CONDITIONAL => body.section("true").iter().chain(body.section("false")).collect(),
                "random" => body.operands.iter().collect(),
                "delay" => body.operands.iter().skip(1).collect(),
                _ => continue,
            };
            for source in nested {
                open_targets(source, targets);
            }
        }
    }
}

fn menu_edges(menu: &MenuConfig) -> Vec<String> {
    let mut targets = Vec::new();
    for button in menu.buttons.values() {
        let payloads = button
            .on_click
            .iter()
            .chain(button.alternative_on_click.iter())
            .chain(
                button
                    .conditions
                    .values()
                    .filter(|entry| PropertyKind::parse(&entry.property) == Some(PropertyKind::OnClick))
                    .map(|entry| &entry.value),
            );
        for payload in payloads {
            open_targets(payload, &mut targets);
        }
    }
    for payload in menu.components.values().filter_map(|c| c.action()) {
        open_targets(payload, &mut targets);
    }
    for payload in &menu.global_actions {
        open_targets(payload, &mut targets);
    }
    targets.into_iter().map(|t| t.to_lowercase()).collect()
}

fn check_cycles(report: &mut ValidationReport, config: &EngineConfig) {
    let edges: HashMap<String, Vec<String>> = config
        .menus
        .iter()
        .map(|(name, menu)| (name.to_lowercase(), menu_edges(menu)))
        .collect();

    let mut marks = HashMap::new();
    for name in config.menus.keys() {
        if reaches_cycle(&name.to_lowercase(), &edges, &mut marks) {
            report.warn(format!(
                "Potential circular reference detected starting from menu '{name}'"
            ));
        }
    }
}

#[derive(Clone, Copy)]
enum Mark {
    OnPath,
    Done { reaches_cycle: bool },
}

/// Depth-first walk with grey/black marks shared across start menus, so
/// every menu is expanded once.
fn reaches_cycle(
    menu: &str,
    edges: &HashMap<String, Vec<String>>,
    marks: &mut HashMap<String, Mark>,
) -> bool {
    match marks.get(menu) {
        Some(Mark::OnPath) => return true,
        Some(Mark::Done { reaches_cycle }) => return *reaches_cycle,
        None => {}
    }
    marks.insert(menu.to_string(), Mark::OnPath);
    let found = edges
        .get(menu)
        .is_some_and(|targets| targets.iter().any(|t| reaches_cycle(t, edges, marks)));
    marks.insert(menu.to_string(), Mark::Done { reaches_cycle: found });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{RecordingHandler, TestExecutor};

    fn validate(json: &str) -> ValidationReport {
        let harness = TestExecutor::new();
        for name in OPEN_TYPES {
            harness.registry.register(RecordingHandler::ok(name)).unwrap();
        }
        ConfigValidator::new(&harness.registry).validate(&EngineConfig::from_json(json).unwrap())
    }

    fn has(messages: &[String], needle: &str) -> bool {
        messages.iter().any(|m| m.contains(needle))
    }

    #[test]
    fn test_empty_config_is_an_error() {
        let report = validate("{}");
        assert!(!report.is_valid());
        assert!(has(&report.errors, "No menus"));
    }

    #[test]
    fn test_clean_menu_passes() {
        let report = validate(
            r#"{"menus": {"main": {
                "command": "menu",
                "title": "Main",
                "buttons": {"a": {"text": "A", "image": "textures/ui/a", "onClick": "command { give @s diamond 1 }"}}
            }}}"#,
        );
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn test_legacy_syntax_is_an_error() {
        let report = validate(
            r#"{"menus": {"main": {"title": "T", "buttons": {
                "a": {"text": "A", "onClick": "command: give @s diamond 1"}
            }}}}"#,
        );
        assert!(has(&report.errors, "legacy syntax"));
    }

    #[test]
    fn test_unknown_type_and_bad_values() {
        let report = validate(
            r#"{"menus": {"main": {"title": "T", "buttons": {
                "a": {"text": "A", "onClick": "teleport { spawn }"},
                "b": {"text": "B", "onClick": "delay { - \"soon\" - \"message { x }\" }"},
                "c": {"text": "C", "onClick": "message { a { b }"}
            }}}}"#,
        );
        assert!(has(&report.errors, "Unknown action type 'teleport'"));
        assert!(has(&report.warnings, "Invalid value for 'delay'"));
        assert!(has(&report.warnings, "Unbalanced braces"));
    }

    #[test]
    fn test_menu_level_checks() {
        let report = validate(
            r#"{"menus": {
                "bad name": {"title": "T", "buttons": {"a": {"text": "A", "onClick": "message { hi }"}}},
                "pick": {"type": "modal", "title": "T", "buttons": {"a": {"text": "A", "onClick": "message { hi }"}}},
                "grid": {"type": "grid", "title": "T"},
                "form": {"type": "custom", "title": "T"},
                "cmd": {"command": "/shop", "buttons": {"a": {"onClick": "message { hi }", "image": "ftp://x"}}}
            }}"#,
        );
        assert!(has(&report.errors, "Invalid menu name: 'bad name'"));
        assert!(has(&report.errors, "Modal menu 'pick' must have exactly 2 buttons"));
        assert!(has(&report.errors, "Invalid menu type 'grid'"));
        assert!(has(&report.warnings, "Custom menu 'form' has no components"));
        assert!(has(&report.warnings, "should not start with '/'"));
        assert!(has(&report.warnings, "Menu 'cmd' has no title"));
        assert!(has(&report.warnings, "Button 'a' in menu 'cmd' has no text"));
        assert!(has(&report.warnings, "Invalid image source 'ftp://x'"));
    }

    #[test]
    fn test_conditional_button_checks() {
        let report = validate(
            r#"{"menus": {"main": {"title": "T", "buttons": {
                "a": {
                    "text": "A",
                    "onClick": "message { hi }",
                    "show_condition": "weather:rain",
                    "alternative_onClick": "fly { up }",
                    "priority": 5000,
                    "conditions": {
                        "permission:vip": {"property": "onClick", "value": "command: legacy"}
                    }
                }
            }}}}"#,
        );
        assert!(has(&report.warnings, "Invalid condition 'weather:rain'"));
        assert!(has(&report.errors, "Unknown action type 'fly'"));
        assert!(has(&report.errors, "legacy syntax"));
        assert!(has(&report.warnings, "Priority 5000"));
    }

    #[test]
    fn test_circular_reference_is_a_warning() {
        let report = validate(
            r#"{"menus": {
                "a": {"title": "A", "buttons": {"x": {"text": "B", "onClick": "open { b }"}}},
                "b": {"title": "B", "buttons": {"x": {"text": "A", "onClick": "openform { A }"}}},
                "c": {"title": "C", "buttons": {"x": {"text": "B", "onClick": "open { b }"}}},
                "d": {"title": "D", "buttons": {"x": {"text": "E", "onClick": "message { hi }"}}}
            }}"#,
        );
        assert!(report.is_valid());
        assert!(has(&report.warnings, "starting from menu 'a'"));
        assert!(has(&report.warnings, "starting from menu 'b'"));
        assert!(has(&report.warnings, "starting from menu 'c'"));
        assert!(!has(&report.warnings, "starting from menu 'd'"));
    }

    #[test]
    fn test_dense_acyclic_graph_validates_quickly() {
        let count = 120;
        let menus: Vec<String> = (0..count)
            .map(|i| {
                let buttons: Vec<String> = (i + 1..count)
                    .map(|j| format!(r#""to{j}": {{"text": "M{j}", "onClick": "open {{ m{j} }}"}}"#))
                    .collect();
                format!(r#""m{i}": {{"title": "M{i}", "buttons": {{{}}}}}"#, buttons.join(","))
            })
            .collect();
        let json = format!(r#"{{"menus": {{{}}}}}"#, menus.join(","));

        let started = std::time::Instant::now();
        let report = validate(&json);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert!(!has(&report.warnings, "circular"), "{:?}", report.warnings);
    }

    #[test]
    fn test_cycle_through_nested_conditional() {
        let report = validate(
            r#"{"menus": {
                "a": {"title": "A", "buttons": {"x": {"text": "X",
                    "onClick": "conditional { check: \"permission:vip\" true: - \"open { a }\" }"}}}
            }}"#,
        );
        assert!(has(&report.warnings, "starting from menu 'a'"));
    }
}

//! Menu orchestrator.
//!
//! Owns the menu table, the handler registry and the executor. Opening a
//! menu walks a fixed ladder of checks, renders a surface for the
//! identity and hands it to the surface sender together with a responder
//! that turns the client's answer back into actions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread;
use std::time::Duration;

use formkit_api::{
    Control, ControlValue, CustomSurface, IdentityRef, ModalSurface, Responder, SimpleSurface,
    Surface, SurfaceButton, SurfaceImage, SurfaceResponse,
};
use indexmap::IndexMap;
use serde_json::Value;

use super::model::{ButtonFace, Menu};
use super::{Collaborators, MenuType, OpenOutcome};
use crate::action::{ActionContext, ActionResult};
use crate::condition::ConditionEvaluator;
use crate::config::{ComponentConfig, EngineConfig, Messages};
use crate::error::RegistryError;
use crate::executor::ActionExecutor;
use crate::handlers::{self, ActionHandler, ActionRegistry, HandlerDeps, MenuOpener};
use crate::parser::{self, ParsedClick};
use crate::priority::resolve_items;
use crate::validator::{ConfigValidator, ValidationReport};

/// One loaded generation of menus. Replaced wholesale on reload.
struct MenuTable {
    config: Arc<EngineConfig>,
    menus: HashMap<String, Arc<Menu>>,
}

impl MenuTable {
    fn empty() -> Self {
        Self {
            config: Arc::new(EngineConfig::default()),
            menus: HashMap::new(),
        }
    }

    fn build(config: EngineConfig) -> Self {
        let mut menus = HashMap::new();
        for (name, menu_config) in &config.menus {
            match Menu::from_config(name, menu_config) {
                Ok(menu) => {
                    menus.insert(name.to_lowercase(), Arc::new(menu));
                }
                Err(e) => tracing::warn!("Skipping menu '{}': {}", name, e),
            }
        }
        Self {
            config: Arc::new(config),
            menus,
        }
    }
}

pub struct MenuOrchestrator {
    table: RwLock<Arc<MenuTable>>,
    registry: Arc<ActionRegistry>,
    executor: ActionExecutor,
    evaluator: Arc<ConditionEvaluator>,
    collaborators: Collaborators,
    extra_handlers: Mutex<Vec<Arc<dyn ActionHandler>>>,
    self_ref: Weak<MenuOrchestrator>,
}

impl MenuOrchestrator {
    /// Build the engine and load `config`.
    ///
    /// The worker keep-alive is read once here; later reloads only pick up
    /// the other executor settings.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Arc<Self> {
        let registry = Arc::new(ActionRegistry::new());
        let evaluator = Arc::new(ConditionEvaluator::new(
            collaborators.extensions.clone(),
            collaborators.placeholders.clone(),
        ));
        let mut builder = ActionExecutor::builder(Arc::clone(&registry))
            .expander(collaborators.placeholders.clone())
            .keep_alive(Duration::from_millis(config.executor.keep_alive_ms));
        if let Some(scheduler) = &collaborators.scheduler {
            builder = builder.scheduler(Arc::clone(scheduler));
        }
        let executor = builder.build();

        let orchestrator = Arc::new_cyclic(|self_ref| Self {
            table: RwLock::new(Arc::new(MenuTable::empty())),
            registry,
            executor,
            evaluator,
            collaborators,
            extra_handlers: Mutex::new(Vec::new()),
            self_ref: self_ref.clone(),
        });
        orchestrator.reload(config);
        orchestrator
    }

    /// Replace the menu table and rebuild the handler registry.
    pub fn reload(&self, config: EngineConfig) -> ValidationReport {
        self.registry.clear();
        let opener: Weak<dyn MenuOpener> = self.self_ref.clone();
        handlers::register_defaults(
            &self.registry,
            HandlerDeps {
                collaborators: &self.collaborators,
                evaluator: Arc::clone(&self.evaluator),
                opener,
                max_delay: Duration::from_millis(config.executor.max_delay_ms),
            },
        );
        for handler in self.extra_handlers().iter() {
            if let Err(e) = self.registry.register(Arc::clone(handler)) {
                tracing::error!("Failed to register extension handler: {}", e);
            }
        }

        let table = Arc::new(MenuTable::build(config));
        let loaded = table.menus.len();
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
        tracing::info!(
            "Loaded {} menus with {} action handlers",
            loaded,
            self.registry.len()
        );

        let report = self.validate();
        report.log();
        report
    }

    /// Validate the currently loaded document.
    pub fn validate(&self) -> ValidationReport {
        ConfigValidator::new(&self.registry).validate(&self.snapshot().config)
    }

    fn snapshot(&self) -> Arc<MenuTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn extra_handlers(&self) -> MutexGuard<'_, Vec<Arc<dyn ActionHandler>>> {
        self.extra_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Add a host handler. It survives reloads.
    pub fn register_handler(&self, handler: Arc<dyn ActionHandler>) -> Result<(), RegistryError> {
        self.registry.register(Arc::clone(&handler))?;
        let action_type = handler.action_type().trim().to_lowercase();
        let mut extras = self.extra_handlers();
        extras.retain(|h| h.action_type().trim().to_lowercase() != action_type);
        extras.push(handler);
        Ok(())
    }

    pub fn unregister_handler(&self, action_type: &str) -> bool {
        let key = action_type.trim().to_lowercase();
        self.extra_handlers()
            .retain(|h| h.action_type().trim().to_lowercase() != key);
        self.registry.unregister(action_type)
    }

    pub fn has_menu(&self, name: &str) -> bool {
        self.snapshot().menus.contains_key(&name.to_lowercase())
    }

    /// Loaded menu keys, sorted.
    pub fn menu_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().menus.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn menu(&self, name: &str) -> Option<Arc<Menu>> {
        self.snapshot().menus.get(&name.to_lowercase()).cloned()
    }

    pub fn shutdown(&self) {
        self.executor.shutdown();
    }

    /// Open the menu whose trigger command or intercept name is the first
    /// word of `line`. Returns whether a menu claimed the line.
    pub fn dispatch_command(&self, identity: &IdentityRef, line: &str) -> bool {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return false;
        };
        let table = self.snapshot();
        let Some(menu) = table.menus.values().find(|m| m.is_triggered_by(first)) else {
            return false;
        };
        let args: Vec<String> = words.map(str::to_string).collect();
        let outcome = self.open_menu(identity, &menu.name, &args);
        tracing::debug!("Command '{}' opened '{}': {}", first, menu.name, outcome);
        true
    }

    /// Open `name` for `identity`.
    ///
    /// Checks run in order: lookup, permission, argument count, client
    /// support. Every rejection also messages the identity.
    pub fn open_menu(&self, identity: &IdentityRef, name: &str, args: &[String]) -> OpenOutcome {
        let table = self.snapshot();
        let messages = &table.config.messages;

        let Some(menu) = table.menus.get(&name.to_lowercase()).cloned() else {
            tracing::debug!("Menu '{}' not found for {}", name, identity.name());
            identity.send_message(&messages.menu_not_found.replace("$menu", name));
            return OpenOutcome::NotFound;
        };

        if let Some(permission) = &menu.permission {
            if !identity.has_permission(permission) {
                identity.send_message(&messages.no_permission.replace("$menu", &menu.name));
                return OpenOutcome::NoPermission;
            }
        }

        let required = menu.required_args();
        if args.len() < required {
            identity.send_message(&messages.usage.replace("$args", &required.to_string()));
            return OpenOutcome::Usage { required };
        }

        let supported = self
            .collaborators
            .surfaces
            .as_ref()
            .is_some_and(|s| s.is_available() && s.is_target_of_required_kind(identity));
        if !supported {
            identity.send_message(&messages.unsupported_client);
            return OpenOutcome::Unsupported;
        }

        let context = ActionContext::builder()
            .placeholders(
                args.iter()
                    .enumerate()
                    .map(|(i, arg)| ((i + 1).to_string(), arg.clone())),
            )
            .menu_name(menu.name.clone())
            .form_type(menu.kind)
            .build()
            .with_builtins(identity);

        let (surface, responder) = match menu.kind {
            MenuType::Simple => self.render_simple(&menu, identity, context),
            MenuType::Modal => self.render_modal(&menu, identity, context),
            MenuType::Custom => self.render_custom(&menu, identity, context),
        };
        self.deliver(identity, &table.config, &menu.name, surface, responder)
    }

    fn render(&self, identity: &IdentityRef, text: &str, context: &ActionContext) -> String {
        let rendered = context.render(text);
        match self.executor.expander() {
            Some(expander) => expander.expand(identity, &rendered),
            None => rendered,
        }
    }

    fn surface_button(
        &self,
        identity: &IdentityRef,
        face: &ButtonFace,
        context: &ActionContext,
    ) -> SurfaceButton {
        SurfaceButton {
            text: self.render(identity, &face.text, context),
            image: face
                .image
                .as_deref()
                .map(|image| SurfaceImage::from_source(&self.render(identity, image, context))),
        }
    }

    fn render_simple(
        &self,
        menu: &Menu,
        identity: &IdentityRef,
        context: ActionContext,
    ) -> (Surface, Responder) {
        let mut buttons = Vec::new();
        let mut payloads = Vec::new();
        for button in resolve_items(&menu.buttons, &self.evaluator, identity, &context) {
            if !button.is_shown(&self.evaluator, identity, &context) {
                continue;
            }
            let face = button.effective(&self.evaluator, identity, &context);
            buttons.push(self.surface_button(identity, &face, &context));
            payloads.push(face.on_click);
        }

        let surface = Surface::Simple(SimpleSurface {
            title: self.render(identity, &menu.title, &context),
            content: menu
                .content
                .as_deref()
                .map(|c| self.render(identity, c, &context)),
            buttons,
        });
        let responder = self.responder(identity, context, move |this, identity, context, response| {
            match response {
                SurfaceResponse::Simple { clicked } => match payloads.get(clicked) {
                    Some(Some(payload)) => {
                        this.click(identity, payload, context);
                    }
                    Some(None) => {}
                    None => tracing::warn!("Click on unknown button {}", clicked),
                },
                other => tracing::warn!("Unexpected response to a simple menu: {:?}", other),
            }
        });
        (surface, responder)
    }

    fn render_modal(
        &self,
        menu: &Menu,
        identity: &IdentityRef,
        context: ActionContext,
    ) -> (Surface, Responder) {
        let mut faces = Vec::with_capacity(2);
        for button in menu.buttons.iter().take(2) {
            if !button.is_shown(&self.evaluator, identity, &context) {
                tracing::warn!(
                    "Modal '{}' button hidden by its show condition is displayed anyway",
                    menu.name
                );
            }
            faces.push(button.effective(&self.evaluator, identity, &context));
        }
        faces.resize_with(2, ButtonFace::default);

        let surface = Surface::Modal(ModalSurface {
            title: self.render(identity, &menu.title, &context),
            content: menu
                .content
                .as_deref()
                .map(|c| self.render(identity, c, &context)),
            first: self.surface_button(identity, &faces[0], &context),
            second: self.surface_button(identity, &faces[1], &context),
        });
        let payloads: Vec<Option<String>> = faces.into_iter().map(|f| f.on_click).collect();
        let responder = self.responder(identity, context, move |this, identity, context, response| {
            match response {
                SurfaceResponse::Modal { first } => {
                    if let Some(payload) = &payloads[if first { 0 } else { 1 }] {
                        this.click(identity, payload, context);
                    }
                }
                other => tracing::warn!("Unexpected response to a modal menu: {:?}", other),
            }
        });
        (surface, responder)
    }

    fn render_custom(
        &self,
        menu: &Menu,
        identity: &IdentityRef,
        context: ActionContext,
    ) -> (Surface, Responder) {
        let controls = menu
            .components
            .values()
            .map(|component| {
                let label = self.render(identity, component.text(), &context);
                match component {
                    ComponentConfig::Input {
                        placeholder,
                        default,
                        ..
                    } => Control::Input {
                        label,
                        placeholder: self.render(identity, placeholder, &context),
                        default: self.render(identity, default, &context),
                    },
                    ComponentConfig::Slider {
                        min,
                        max,
                        step,
                        default,
                        ..
                    } => Control::Slider {
                        label,
                        min: *min,
                        max: *max,
                        step: *step,
                        default: *default,
                    },
                    ComponentConfig::Dropdown {
                        options, default, ..
                    } => Control::Dropdown {
                        label,
                        options: options
                            .iter()
                            .map(|o| self.render(identity, o, &context))
                            .collect(),
                        default: *default,
                    },
                    ComponentConfig::Toggle { default, .. } => Control::Toggle {
                        label,
                        default: *default,
                    },
                }
            })
            .collect();

        let surface = Surface::Custom(CustomSurface {
            title: self.render(identity, &menu.title, &context),
            controls,
        });
        let components = menu.components.clone();
        let global_actions = menu.global_actions.clone();
        let responder = self.responder(identity, context, move |this, identity, context, response| {
            match response {
                SurfaceResponse::Custom { values } => {
                    this.submit_custom(identity, &components, &global_actions, &values, context)
                }
                other => tracing::warn!("Unexpected response to a custom menu: {:?}", other),
            }
        });
        (surface, responder)
    }

    /// Run component actions, then global actions, for one custom submit.
    fn submit_custom(
        &self,
        identity: &IdentityRef,
        components: &IndexMap<String, ComponentConfig>,
        global_actions: &[String],
        values: &[ControlValue],
        context: &ActionContext,
    ) {
        if values.len() != components.len() {
            tracing::warn!(
                "Custom menu answered {} values for {} components",
                values.len(),
                components.len()
            );
        }
        let results: Vec<(&String, &ComponentConfig, String, Value)> = components
            .iter()
            .zip(values)
            .map(|((key, component), value)| {
                let (text, json) = component_result(component, value);
                (key, component, text, json)
            })
            .collect();

        let mut builder = context.to_builder();
        for (key, _, text, json) in &results {
            builder = builder
                .placeholder((*key).clone(), text.clone())
                .form_result((*key).clone(), json.clone());
        }
        let submitted = builder.build();

        for (_, component, text, _) in &results {
            let Some(action) = component.action() else {
                continue;
            };
            let component_context = submitted
                .to_builder()
                .placeholder("value", text.clone())
                .placeholder("1", text.clone())
                .build();
            self.click(identity, action, &component_context);
        }
        for action in global_actions {
            self.click(identity, action, &submitted);
        }
    }

    /// Render a stored payload for this answer and run it.
    fn click(&self, identity: &IdentityRef, payload: &str, context: &ActionContext) {
        let rendered = context.render_payload(payload, |t| self.registry.contains(t));
        let rendered = match self.executor.expander() {
            Some(expander) => expander.expand(identity, &rendered),
            None => rendered,
        };
        self.handle_on_click(identity, &rendered, context);
    }

    fn responder<F>(&self, identity: &IdentityRef, context: ActionContext, on_answer: F) -> Responder
    where
        F: Fn(&MenuOrchestrator, &IdentityRef, &ActionContext, SurfaceResponse)
            + Send
            + Sync
            + 'static,
    {
        let engine = self.self_ref.clone();
        let identity = Arc::clone(identity);
        Arc::new(move |response: SurfaceResponse| {
            if response == SurfaceResponse::Closed {
                tracing::debug!("{} closed the menu", identity.name());
                return;
            }
            let Some(engine) = engine.upgrade() else {
                tracing::debug!("Menu engine dropped before the answer arrived");
                return;
            };
            on_answer(&engine, &identity, &context, response);
        })
    }

    fn deliver(
        &self,
        identity: &IdentityRef,
        config: &EngineConfig,
        menu: &str,
        surface: Surface,
        responder: Responder,
    ) -> OpenOutcome {
        let Some(sender) = &self.collaborators.surfaces else {
            return OpenOutcome::Unsupported;
        };
        let attempts = config.delivery.attempts.max(1);
        let mut backoff = Duration::from_millis(config.delivery.backoff_ms);
        for attempt in 1..=attempts {
            match sender.send(identity, surface.clone(), Arc::clone(&responder)) {
                Ok(()) => {
                    tracing::debug!("Sent menu '{}' to {}", menu, identity.name());
                    return OpenOutcome::Sent;
                }
                Err(e) => {
                    tracing::warn!(
                        "Sending menu '{}' to {} failed (attempt {}/{}): {}",
                        menu,
                        identity.name(),
                        attempt,
                        attempts,
                        e
                    );
                    if attempt < attempts {
                        thread::sleep(backoff);
                        backoff *= 2;
                    }
                }
            }
        }
        identity.send_message(&config.messages.delivery_failed.replace("$menu", menu));
        OpenOutcome::DeliveryFailed
    }

    /// Parse and run one click payload, reporting failures to the identity.
    ///
    /// `payload` is expected to be rendered already.
    pub fn handle_on_click(
        &self,
        identity: &IdentityRef,
        payload: &str,
        context: &ActionContext,
    ) -> Vec<ActionResult> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Vec::new();
        }
        let table = self.snapshot();
        let messages = &table.config.messages;

        let results = match parser::parse_click(payload) {
            Ok(ParsedClick::Single(definition)) => {
                vec![self.executor.execute_action(identity, &definition, context)]
            }
            Ok(ParsedClick::Sequence(actions)) => {
                self.executor.execute_actions(identity, &actions, context)
            }
            Err(e) => {
                tracing::warn!("Invalid click payload '{}': {}", payload, e);
                identity.send_message(&messages.invalid_action.replace("$message", &e.to_string()));
                return vec![ActionResult::failure(e.to_string())];
            }
        };

        for result in &results {
            report(identity, messages, result);
        }
        results
    }
}

fn report(identity: &IdentityRef, messages: &Messages, result: &ActionResult) {
    if result.is_failure() {
        tracing::debug!("Action failed for {}: {}", identity.name(), result.message());
        if !result.message().is_empty() {
            identity.send_message(&messages.action_failed.replace("$message", result.message()));
        }
    } else {
        tracing::debug!("Action {:?} for {}", result.status, identity.name());
    }
}

/// Text and JSON form of one control answer.
fn component_result(component: &ComponentConfig, value: &ControlValue) -> (String, Value) {
    match component {
        ComponentConfig::Input { .. } => {
            let text = match value {
                ControlValue::Text(s) => s.clone(),
                ControlValue::Number(n) => n.to_string(),
                ControlValue::Index(i) => i.to_string(),
                ControlValue::Bool(b) => b.to_string(),
            };
            (text.clone(), Value::String(text))
        }
        ComponentConfig::Slider { .. } => {
            let number = match value {
                ControlValue::Number(n) => *n as i64,
                ControlValue::Index(i) => *i as i64,
                ControlValue::Text(s) => s.trim().parse::<f64>().map(|n| n as i64).unwrap_or(0),
                ControlValue::Bool(b) => i64::from(*b),
            };
            (number.to_string(), Value::from(number))
        }
        ComponentConfig::Dropdown { options, .. } => {
            let index = match value {
                ControlValue::Index(i) => Some(*i),
                ControlValue::Number(n) if *n >= 0.0 => Some(*n as usize),
                _ => None,
            };
            let text = match (index, value) {
                (Some(i), _) => options.get(i).cloned().unwrap_or_default(),
                (None, ControlValue::Text(s)) => s.clone(),
                _ => String::new(),
            };
            (text.clone(), Value::String(text))
        }
        ComponentConfig::Toggle { .. } => {
            let on = match value {
                ControlValue::Bool(b) => *b,
                ControlValue::Text(s) => s.eq_ignore_ascii_case("true"),
                ControlValue::Index(i) => *i != 0,
                ControlValue::Number(n) => *n != 0.0,
            };
            (on.to_string(), Value::Bool(on))
        }
    }
}

impl MenuOpener for MenuOrchestrator {
    fn open_menu(&self, identity: &IdentityRef, menu: &str, args: &[String]) -> OpenOutcome {
        MenuOrchestrator::open_menu(self, identity, menu, args)
    }
}

//! Pluggable action handlers.
//!
//! Each action type is one [`ActionHandler`]. Handlers are thin adapters
//! over the platform collaborators and are rebuilt on every reload.

mod actionbar;
mod broadcast;
mod command;
mod conditional;
mod delay;
mod economy;
mod message;
mod open;
mod random;
mod registry;
mod server;
mod sound;
mod title;
mod url;

pub use actionbar::ActionBarHandler;
pub use broadcast::BroadcastHandler;
pub use command::CommandHandler;
pub use conditional::ConditionalHandler;
pub use delay::DelayHandler;
pub use economy::EconomyHandler;
pub use message::MessageHandler;
pub use open::{MenuOpener, OPEN_TYPES, OpenHandler};
pub(crate) use open::open_target;
pub use random::RandomHandler;
pub use registry::ActionRegistry;
pub use server::ServerHandler;
pub use sound::SoundHandler;
pub use title::TitleHandler;
pub use url::UrlHandler;

use std::sync::{Arc, Weak};
use std::time::Duration;

use formkit_api::IdentityRef;

use crate::action::{Action, ActionContext, ActionResult, ActionValue};
use crate::condition::ConditionEvaluator;
use crate::executor::ActionExecutor;
use crate::menu::Collaborators;
use crate::parser;

/// Context passed to handlers during execution.
pub struct HandlerContext<'a> {
    pub context: &'a ActionContext,
    /// The executor running this action, for handlers that run nested actions.
    pub executor: &'a ActionExecutor,
}

impl HandlerContext<'_> {
    /// Substitute context placeholders, then host placeholders.
    pub fn render(&self, identity: &IdentityRef, text: &str) -> String {
        let rendered = self.context.render(text);
        match self.executor.expander() {
            Some(expander) => expander.expand(identity, &rendered),
            None => rendered,
        }
    }

    /// Operands of `value`, each rendered. Blank results are dropped.
    pub fn operands(&self, identity: &IdentityRef, value: &ActionValue) -> Vec<String> {
        value
            .body()
            .operands
            .iter()
            .map(|op| self.render(identity, op))
            .filter(|op| !op.trim().is_empty())
            .collect()
    }

    /// Parse and run nested action strings as a non-critical sequence.
    pub fn run_nested(&self, identity: &IdentityRef, sources: &[String]) -> ActionResult {
        let mut actions = Vec::with_capacity(sources.len());
        for source in sources {
            match parser::parse(source) {
                Ok(definition) => actions.push(Action::new(definition)),
                Err(e) => return ActionResult::failure(format!("Invalid nested action: {e}")),
            }
        }
        let results = self.executor.execute_actions(identity, &actions, self.context);
        summarize(&results)
    }
}

/// Collapse a sequence into one result.
pub(crate) fn summarize(results: &[ActionResult]) -> ActionResult {
    let failed = results.iter().filter(|r| r.is_failure()).count();
    match failed {
        0 => ActionResult::success_with(format!("Executed {} actions", results.len())),
        n if n == results.len() => results
            .iter()
            .rev()
            .find(|r| r.is_failure())
            .cloned()
            .unwrap_or_else(|| ActionResult::failure("All actions failed")),
        n => ActionResult::partial(format!("{n} of {} actions failed", results.len())),
    }
}

/// Implementation of one action type.
pub trait ActionHandler: Send + Sync {
    /// The type name this handler is registered under.
    fn action_type(&self) -> &str;

    /// Run the action for `identity`.
    ///
    /// Errors are turned into failure results by the executor.
    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult>;

    /// Cheap structural check of `value` before execution.
    fn validate(&self, value: &ActionValue) -> bool {
        !value.body().is_empty()
    }

    fn describe(&self) -> &str;

    fn usage_examples(&self) -> &[&str] {
        &[]
    }
}

/// Everything the default handlers are built from.
pub struct HandlerDeps<'a> {
    pub collaborators: &'a Collaborators,
    pub evaluator: Arc<ConditionEvaluator>,
    pub opener: Weak<dyn MenuOpener>,
    pub max_delay: Duration,
}

/// Register the built-in handlers. Handlers whose collaborator is missing
/// are skipped.
pub fn register_defaults(registry: &ActionRegistry, deps: HandlerDeps<'_>) {
    let c = deps.collaborators;
    let mut handlers: Vec<Arc<dyn ActionHandler>> = vec![
        Arc::new(CommandHandler),
        Arc::new(MessageHandler),
        Arc::new(DelayHandler::new(deps.max_delay)),
        Arc::new(ConditionalHandler::new(deps.evaluator)),
        Arc::new(RandomHandler),
        Arc::new(UrlHandler),
    ];
    for name in OPEN_TYPES {
        handlers.push(Arc::new(OpenHandler::new(name, deps.opener.clone())));
    }
    if let Some(dispatcher) = &c.commands {
        handlers.push(Arc::new(ServerHandler::new(Arc::clone(dispatcher))));
        handlers.push(Arc::new(BroadcastHandler::new(Arc::clone(dispatcher))));
    }
    if let Some(sounds) = &c.sounds {
        handlers.push(Arc::new(SoundHandler::new(Arc::clone(sounds))));
    }
    if let Some(economy) = &c.economy {
        handlers.push(Arc::new(EconomyHandler::new(
            Arc::clone(economy),
            c.directory.clone(),
        )));
    }
    if let Some(titles) = &c.titles {
        handlers.push(Arc::new(TitleHandler::new(Arc::clone(titles))));
        handlers.push(Arc::new(ActionBarHandler::new(Arc::clone(titles))));
    }

    for handler in handlers {
        if let Err(e) = registry.register(handler) {
            tracing::error!("Failed to register built-in handler: {}", e);
        }
    }
}

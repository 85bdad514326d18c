//! Formkit Kernel - The menu engine core.
//!
//! This crate contains everything between a loaded configuration and the
//! side effects a click produces:
//! - Action model (definitions, context, results)
//! - Handler registry and the default handlers
//! - Action parser
//! - Executor (sync, async worker pool, delayed continuations)
//! - Condition evaluator and priority resolver
//! - Menu orchestrator and configuration validator

pub mod action;
pub mod condition;
pub mod config;
pub mod executor;
pub mod handlers;
pub mod menu;
pub mod parser;
pub mod priority;
pub mod validator;

mod error;

#[cfg(test)]
mod test_utils;

pub use action::{
    Action, ActionContext, ActionContextBuilder, ActionDefinition, ActionResult, ActionStatus,
    ActionValue, BlockBody,
};
pub use condition::ConditionEvaluator;
pub use config::EngineConfig;
pub use error::{
    ConditionError, ConfigError, ExecutorError, MenuError, ParseError, RegistryError,
};
pub use executor::{ActionExecutor, Pending};
pub use handlers::{ActionHandler, ActionRegistry, HandlerContext};
pub use menu::{Collaborators, MenuOrchestrator, MenuType, OpenOutcome};
pub use parser::{ParsedClick, parse, parse_click};
pub use priority::{Prioritized, resolve_items};
pub use validator::{ConfigValidator, ValidationReport};

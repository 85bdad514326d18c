//! Action data model.
//!
//! Pure value types shared by the parser, the executor and the handlers.

mod context;
mod definition;
mod result;

pub use context::{ActionContext, ActionContextBuilder};
pub use definition::{ActionDefinition, ActionValue, BlockBody, CONDITIONAL};
pub use result::{ActionResult, ActionStatus};

/// One definition plus the flag that decides whether its failure aborts
/// the surrounding sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub definition: ActionDefinition,
    pub critical: bool,
}

impl Action {
    pub fn new(definition: ActionDefinition) -> Self {
        Self {
            definition,
            critical: false,
        }
    }

    pub fn critical(definition: ActionDefinition) -> Self {
        Self {
            definition,
            critical: true,
        }
    }
}

impl From<ActionDefinition> for Action {
    fn from(definition: ActionDefinition) -> Self {
        Self::new(definition)
    }
}

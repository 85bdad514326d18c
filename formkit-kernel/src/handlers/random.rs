//! `random` - run one of the listed actions, chosen uniformly.

use formkit_api::IdentityRef;
use rand::seq::SliceRandom;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct RandomHandler;

impl ActionHandler for RandomHandler {
    fn action_type(&self) -> &str {
        "random"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let body = value.body();
        let Some(choice) = body.operands.choose(&mut rand::thread_rng()) else {
            return Ok(ActionResult::failure("No actions to choose from"));
        };
        tracing::debug!("Random action picked '{}' for {}", choice, identity.name());
        Ok(cx.run_nested(identity, std::slice::from_ref(choice)))
    }

    fn describe(&self) -> &str {
        "Runs one randomly chosen action from the list"
    }

    fn usage_examples(&self) -> &[&str] {
        &["random {\n  - \"message { Heads }\"\n  - \"message { Tails }\"\n}"]
    }
}

//! `conditional` - branch on a condition.
//!
//! ```text
//! conditional {
//!     check: "placeholder:$balance:>=:100"
//!     true:
//!     - "message { You can afford it }"
//!     false:
//!     - "message { Not enough money }"
//! }
//! ```

use std::sync::Arc;

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue, CONDITIONAL};
use crate::condition::ConditionEvaluator;

pub struct ConditionalHandler {
    evaluator: Arc<ConditionEvaluator>,
}

impl ConditionalHandler {
    pub fn new(evaluator: Arc<ConditionEvaluator>) -> Self {
        Self { evaluator }
    }
}

impl ActionHandler for ConditionalHandler {
    fn action_type(&self) -> &str {
        CONDITIONAL
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let body = value.body();
        let Some(check) = body.field("check") else {
            return Ok(ActionResult::failure("Conditional action has no check"));
        };

        let matched = self.evaluator.evaluate(identity, check, cx.context);
        let branch = body.section(if matched { "true" } else { "false" });
        tracing::debug!(
            "Condition '{}' is {} for {}, running {} action(s)",
            check,
            matched,
            identity.name(),
            branch.len()
        );
        if branch.is_empty() {
            return Ok(ActionResult::skipped("No actions for this branch"));
        }
        Ok(cx.run_nested(identity, branch))
    }

    fn validate(&self, value: &ActionValue) -> bool {
        let body = value.body();
        match body.field("check") {
            Some(check) => {
                ConditionEvaluator::is_valid_condition(check)
                    && (!body.section("true").is_empty() || !body.section("false").is_empty())
            }
            None => false,
        }
    }

    fn describe(&self) -> &str {
        "Runs the true or false branch depending on a condition"
    }

    fn usage_examples(&self) -> &[&str] {
        &["conditional {\n  check: \"permission:vip\"\n  true:\n  - \"message { Welcome VIP }\"\n}"]
    }
}

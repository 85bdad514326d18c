//! `delay` - wait, then run the remaining actions.
//!
//! The first operand is the delay in milliseconds. With no further
//! operands the result suspends the surrounding sequence, and the executor
//! hands whatever follows to the scheduler. Further operands are actions
//! scheduled on their own while the sequence carries on. No worker thread
//! sleeps either way.

use std::time::Duration;

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{Action, ActionResult, ActionValue};
use crate::parser;

pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

pub struct DelayHandler {
    max_delay: Duration,
    description: String,
}

impl DelayHandler {
    pub fn new(max_delay: Duration) -> Self {
        Self {
            max_delay,
            description: format!(
                "Pauses the rest of the sequence, or runs the listed actions, after a delay (max {}ms)",
                max_delay.as_millis()
            ),
        }
    }

    fn parse_millis(&self, text: &str) -> Result<u64, String> {
        let millis: i64 = text
            .trim()
            .parse()
            .map_err(|_| format!("Invalid delay time format: {text}"))?;
        if millis < 0 {
            return Err("Delay time cannot be negative".to_string());
        }
        let millis = millis as u64;
        if millis > self.max_delay.as_millis() as u64 {
            return Err(format!(
                "Delay time cannot exceed {}ms",
                self.max_delay.as_millis()
            ));
        }
        Ok(millis)
    }
}

impl Default for DelayHandler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELAY)
    }
}

impl ActionHandler for DelayHandler {
    fn action_type(&self) -> &str {
        "delay"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let body = value.body();
        let Some((first, rest)) = body.operands.split_first() else {
            return Ok(ActionResult::failure("No delay time specified"));
        };
        let millis = match self.parse_millis(&cx.render(identity, first)) {
            Ok(millis) => millis,
            Err(message) => return Ok(ActionResult::failure(message)),
        };

        let mut actions = Vec::with_capacity(rest.len());
        for source in rest {
            match parser::parse(source) {
                Ok(definition) => actions.push(Action::new(definition)),
                Err(e) => return Ok(ActionResult::failure(format!("Invalid delayed action: {e}"))),
            }
        }
        if actions.is_empty() {
            return Ok(ActionResult::suspended(
                Duration::from_millis(millis),
                format!("Delayed for {millis}ms"),
            ));
        }

        let scheduled = cx.executor.schedule_continuation(
            Duration::from_millis(millis),
            identity.clone(),
            actions,
            cx.context.clone(),
        );
        if !scheduled {
            return Ok(ActionResult::skipped("Executor is shut down"));
        }
        tracing::debug!(
            "Scheduled {} action(s) in {}ms for {}",
            rest.len(),
            millis,
            identity.name()
        );
        Ok(ActionResult::success_with(format!(
            "Scheduled {} action(s) in {millis}ms",
            rest.len()
        )))
    }

    fn validate(&self, value: &ActionValue) -> bool {
        match value.body().operands.first() {
            Some(first) if first.contains('$') || first.contains('{') => true,
            Some(first) => self.parse_millis(first).is_ok(),
            None => false,
        }
    }

    fn describe(&self) -> &str {
        &self.description
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "delay { 1000 }",
            "delay {\n  - \"2000\"\n  - \"message { Two seconds later }\"\n}",
        ]
    }
}

//! `message` - chat lines to the identity.

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct MessageHandler;

impl ActionHandler for MessageHandler {
    fn action_type(&self) -> &str {
        "message"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let lines = cx.operands(identity, value);
        if lines.is_empty() {
            return Ok(ActionResult::failure("Message cannot be empty"));
        }
        for line in &lines {
            identity.send_message(line);
        }
        Ok(ActionResult::success_with(format!("Sent {} line(s)", lines.len())))
    }

    fn describe(&self) -> &str {
        "Sends chat messages to the identity"
    }

    fn usage_examples(&self) -> &[&str] {
        &["message { Hello $player! }"]
    }
}

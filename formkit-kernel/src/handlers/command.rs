//! `command` - run commands as the identity.

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct CommandHandler;

impl ActionHandler for CommandHandler {
    fn action_type(&self) -> &str {
        "command"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let commands = cx.operands(identity, value);
        if commands.is_empty() {
            return Ok(ActionResult::failure("Command cannot be empty"));
        }

        for command in &commands {
            let command = command.trim().trim_start_matches('/');
            if command.is_empty() {
                return Ok(ActionResult::failure("Processed command is empty"));
            }
            if !identity.execute_command(&format!("/{command}")) {
                tracing::warn!(
                    "Failed to execute command '{}' for {}",
                    command,
                    identity.name()
                );
                return Ok(ActionResult::failure(format!("Command failed: {command}")));
            }
            tracing::debug!("Executed command '{}' for {}", command, identity.name());
        }
        Ok(ActionResult::success_with(format!(
            "Executed {} command(s)",
            commands.len()
        )))
    }

    fn validate(&self, value: &ActionValue) -> bool {
        let body = value.body();
        !body.operands.is_empty() && body.operands.iter().all(|op| op.trim() != "/")
    }

    fn describe(&self) -> &str {
        "Runs one or more commands as the identity. Supports placeholders."
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "command { give $player diamond 1 }",
            "command {\n  - \"tp $player 0 100 0\"\n  - \"say Hello $player!\"\n}",
        ]
    }
}

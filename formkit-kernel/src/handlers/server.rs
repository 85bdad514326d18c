//! `server` - run commands as the console.

use formkit_api::{CommandDispatcherRef, IdentityRef};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct ServerHandler {
    dispatcher: CommandDispatcherRef,
}

impl ServerHandler {
    pub fn new(dispatcher: CommandDispatcherRef) -> Self {
        Self { dispatcher }
    }
}

impl ActionHandler for ServerHandler {
    fn action_type(&self) -> &str {
        "server"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let commands = cx.operands(identity, value);
        if commands.is_empty() {
            return Ok(ActionResult::failure("Server command cannot be empty"));
        }
        for command in &commands {
            let command = command.trim().trim_start_matches('/');
            self.dispatcher.run_as_console(command)?;
            tracing::debug!("Console ran '{}' for {}", command, identity.name());
        }
        Ok(ActionResult::success_with(format!(
            "Executed {} console command(s)",
            commands.len()
        )))
    }

    fn describe(&self) -> &str {
        "Runs commands from the console with full privileges"
    }

    fn usage_examples(&self) -> &[&str] {
        &["server { give $player diamond 64 }"]
    }
}

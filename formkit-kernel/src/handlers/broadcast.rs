//! `broadcast` - announce a message to the server through the console.
//!
//! An operand is either a plain message, sent with `say`, or
//! `<scope>:<target>:<message>` where scope is `permission`, `world` or
//! `radius`. Scoped broadcasts rely on the host providing a `broadcast`
//! console command. When the primary command is rejected the common
//! announcement commands are tried in turn.

use formkit_api::{CommandDispatcherRef, IdentityRef};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

const FALLBACK_COMMANDS: [&str; 3] = ["bc", "broadcast", "announce"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Permission,
    World,
    Radius,
}

impl Scope {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "permission" => Some(Self::Permission),
            "world" => Some(Self::World),
            "radius" => Some(Self::Radius),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Announcement<'a> {
    Everyone(&'a str),
    Scoped {
        scope: Scope,
        target: &'a str,
        message: &'a str,
    },
}

impl<'a> Announcement<'a> {
    fn parse(operand: &'a str) -> Result<Self, String> {
        let operand = operand.trim();
        let parts: Vec<&str> = operand.splitn(3, ':').collect();
        if let [scope, target, message] = parts[..] {
            let Some(scope) = Scope::parse(scope.trim()) else {
                return Err(format!("Unknown broadcast type: {}", scope.trim()));
            };
            let (target, message) = (target.trim(), message.trim());
            if target.is_empty() || message.is_empty() {
                return Err("Scoped broadcast needs a target and a message".to_string());
            }
            return Ok(Self::Scoped { scope, target, message });
        }
        Ok(Self::Everyone(operand))
    }

    fn message(&self) -> &'a str {
        match *self {
            Self::Everyone(message) | Self::Scoped { message, .. } => message,
        }
    }

    fn command(&self, sender: &str) -> String {
        match self {
            Self::Everyone(message) => format!("say {message}"),
            Self::Scoped { scope: Scope::Permission, target, message } => {
                format!("broadcast permission {target} {message}")
            }
            Self::Scoped { scope: Scope::World, target, message } => {
                format!("broadcast world {target} {message}")
            }
            Self::Scoped { scope: Scope::Radius, target, message } => {
                format!("broadcast radius {target} {sender} {message}")
            }
        }
    }
}

pub struct BroadcastHandler {
    dispatcher: CommandDispatcherRef,
}

impl BroadcastHandler {
    pub fn new(dispatcher: CommandDispatcherRef) -> Self {
        Self { dispatcher }
    }

    fn announce(
        &self,
        identity: &IdentityRef,
        announcement: &Announcement<'_>,
    ) -> anyhow::Result<()> {
        let primary = announcement.command(identity.name());
        let Err(first) = self.dispatcher.run_as_console(&primary) else {
            return Ok(());
        };
        tracing::debug!("Broadcast command '{}' rejected: {:#}", primary, first);

        let message = announcement.message();
        for fallback in FALLBACK_COMMANDS {
            if self
                .dispatcher
                .run_as_console(&format!("{fallback} {message}"))
                .is_ok()
            {
                return Ok(());
            }
        }
        Err(first.context("no broadcast command accepted the message"))
    }
}

impl ActionHandler for BroadcastHandler {
    fn action_type(&self) -> &str {
        "broadcast"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let operands = cx.operands(identity, value);
        if operands.is_empty() {
            return Ok(ActionResult::failure("No broadcast message specified"));
        }
        for operand in &operands {
            let announcement = match Announcement::parse(operand) {
                Ok(announcement) => announcement,
                Err(e) => return Ok(ActionResult::failure(e)),
            };
            self.announce(identity, &announcement)?;
            tracing::info!("{} broadcast: {}", identity.name(), announcement.message());
        }
        Ok(ActionResult::success_with(format!(
            "Broadcast {} message(s)",
            operands.len()
        )))
    }

    fn validate(&self, value: &ActionValue) -> bool {
        let body = value.body();
        !body.is_empty()
            && body
                .operands
                .iter()
                .all(|op| Announcement::parse(op).is_ok_and(|a| !a.message().is_empty()))
    }

    fn describe(&self) -> &str {
        "Broadcasts a message to everyone, or to a permission group, world or radius"
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "broadcast { Welcome to the server! }",
            "broadcast { permission:vip.access:VIP only message! }",
            "broadcast { world:world_nether:Nether announcement! }",
            "broadcast { radius:50:Local announcement! }",
        ]
    }
}

//! `url` - send a link to the identity's chat, where clients render it
//! as clickable.

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

const MAX_URL_LEN: usize = 2048;

fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

pub struct UrlHandler;

impl ActionHandler for UrlHandler {
    fn action_type(&self) -> &str {
        "url"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let links: Vec<String> = cx
            .operands(identity, value)
            .iter()
            .map(|link| link.chars().filter(|c| !c.is_control()).collect::<String>())
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty())
            .collect();
        if links.is_empty() {
            return Ok(ActionResult::failure("URL cannot be empty"));
        }
        for link in &links {
            if !looks_like_url(link) {
                tracing::warn!("URL action for {} is not an http(s) link: {}", identity.name(), link);
            }
            identity.send_message(link);
        }
        Ok(ActionResult::success_with(format!("Sent {} link(s)", links.len())))
    }

    /// Accepts http(s) links, and anything with a placeholder since it
    /// may only become a link once rendered.
    fn validate(&self, value: &ActionValue) -> bool {
        let body = value.body();
        !body.is_empty()
            && body.operands.iter().all(|op| {
                let op = op.trim();
                op.len() <= MAX_URL_LEN && (looks_like_url(op) || op.contains('$') || op.contains('{'))
            })
    }

    fn describe(&self) -> &str {
        "Sends a link to the chat; clients render http(s) links as clickable"
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "url { https://example.com }",
            "url { https://store.example.com/$player }",
        ]
    }
}

//! `actionbar` - text above the hotbar.

use formkit_api::{IdentityRef, TitleDisplayRef};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct ActionBarHandler {
    titles: TitleDisplayRef,
}

impl ActionBarHandler {
    pub fn new(titles: TitleDisplayRef) -> Self {
        Self { titles }
    }
}

impl ActionHandler for ActionBarHandler {
    fn action_type(&self) -> &str {
        "actionbar"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        if !self.titles.is_supported() {
            return Ok(ActionResult::skipped("Action bar is not supported"));
        }
        let text = cx.operands(identity, value).join(" ");
        if text.is_empty() {
            return Ok(ActionResult::failure("Action bar text cannot be empty"));
        }
        self.titles.action_bar(identity, &text)?;
        Ok(ActionResult::success())
    }

    fn describe(&self) -> &str {
        "Shows a line of text in the action bar"
    }
}

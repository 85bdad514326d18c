//! `title` - `title[:subtitle[:fadeIn:stay:fadeOut]]`.

use formkit_api::{IdentityRef, TitleDisplayRef, TitleTimings};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct TitleHandler {
    titles: TitleDisplayRef,
}

impl TitleHandler {
    pub fn new(titles: TitleDisplayRef) -> Self {
        Self { titles }
    }
}

fn parse_timings(parts: &[&str]) -> TitleTimings {
    let defaults = TitleTimings::default();
    let field = |i: usize, default: u32| {
        parts
            .get(i)
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(default)
    };
    TitleTimings {
        fade_in: field(2, defaults.fade_in),
        stay: field(3, defaults.stay),
        fade_out: field(4, defaults.fade_out),
    }
}

impl ActionHandler for TitleHandler {
    fn action_type(&self) -> &str {
        "title"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        if !self.titles.is_supported() {
            return Ok(ActionResult::skipped("Titles are not supported"));
        }
        let Some(spec) = cx.operands(identity, value).into_iter().next() else {
            return Ok(ActionResult::failure("Title cannot be empty"));
        };
        let parts: Vec<&str> = spec.split(':').collect();
        let title = parts[0];
        let subtitle = parts.get(1).copied().unwrap_or("");
        self.titles
            .send_title(identity, title, subtitle, parse_timings(&parts))?;
        Ok(ActionResult::success())
    }

    fn describe(&self) -> &str {
        "Shows a title and optional subtitle"
    }

    fn usage_examples(&self) -> &[&str] {
        &["title { Welcome:to the server:10:60:10 }"]
    }
}

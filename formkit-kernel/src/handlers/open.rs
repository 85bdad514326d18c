//! `open` - open another menu.

use std::sync::Weak;

use formkit_api::IdentityRef;

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};
use crate::menu::OpenOutcome;

/// Type names the open handler answers to.
pub const OPEN_TYPES: [&str; 3] = ["open", "openform", "open_form"];

/// Something that can open menus by name.
pub trait MenuOpener: Send + Sync {
    fn open_menu(&self, identity: &IdentityRef, menu: &str, args: &[String]) -> OpenOutcome;
}

pub struct OpenHandler {
    name: &'static str,
    opener: Weak<dyn MenuOpener>,
}

impl OpenHandler {
    pub fn new(name: &'static str, opener: Weak<dyn MenuOpener>) -> Self {
        Self { name, opener }
    }
}

impl ActionHandler for OpenHandler {
    fn action_type(&self) -> &str {
        self.name
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let Some(target) = cx.operands(identity, value).into_iter().next() else {
            return Ok(ActionResult::failure("No menu specified"));
        };
        let mut words = target.split_whitespace().map(str::to_string);
        let Some(menu) = words.next() else {
            return Ok(ActionResult::failure("No menu specified"));
        };
        let args: Vec<String> = words.collect();

        let Some(opener) = self.opener.upgrade() else {
            return Ok(ActionResult::failure("Menu engine is no longer running"));
        };
        match opener.open_menu(identity, &menu, &args) {
            OpenOutcome::Sent => Ok(ActionResult::success_with(format!("Opened {menu}"))),
            outcome => Ok(ActionResult::failure(format!(
                "Could not open menu '{menu}': {outcome}"
            ))),
        }
    }

    fn describe(&self) -> &str {
        "Opens another menu, passing extra words as arguments"
    }

    fn usage_examples(&self) -> &[&str] {
        &["open { shop }", "open { warp_menu $1 }"]
    }
}

/// First word of the first operand, the menu an open action targets.
pub(crate) fn open_target(value: &ActionValue) -> Option<String> {
    value
        .body()
        .operands
        .first()
        .and_then(|op| op.split_whitespace().next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{MockIdentity, TestExecutor};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl MenuOpener for RecordingOpener {
        fn open_menu(&self, _: &IdentityRef, menu: &str, args: &[String]) -> OpenOutcome {
            self.opened
                .lock()
                .unwrap()
                .push((menu.to_string(), args.to_vec()));
            if menu == "missing" {
                OpenOutcome::NotFound
            } else {
                OpenOutcome::Sent
            }
        }
    }

    #[test]
    fn test_open_passes_arguments() {
        let opener = Arc::new(RecordingOpener::default());
        let weak = Arc::downgrade(&opener) as Weak<dyn MenuOpener>;
        let handler = OpenHandler::new("openform", weak);
        let harness = TestExecutor::new();
        let cx = harness.context_with(&[("1", "nether")]);
        let result = handler
            .execute(
                &MockIdentity::new("Steve").into_ref(),
                &ActionValue::from("openform { warps $1 fast }"),
                &harness.handler_context(&cx),
            )
            .unwrap();
        assert!(result.is_success());
        assert_eq!(
            opener.opened.lock().unwrap()[0],
            ("warps".to_string(), vec!["nether".to_string(), "fast".to_string()])
        );
    }

    #[test]
    fn test_open_reports_outcome() {
        let opener = Arc::new(RecordingOpener::default());
        let weak = Arc::downgrade(&opener) as Weak<dyn MenuOpener>;
        let handler = OpenHandler::new("open", weak);
        let harness = TestExecutor::new();
        let cx = harness.context_with(&[]);
        let result = handler
            .execute(
                &MockIdentity::new("Steve").into_ref(),
                &ActionValue::from("open { missing }"),
                &harness.handler_context(&cx),
            )
            .unwrap();
        assert!(result.is_failure());
    }

    #[test]
    fn test_open_after_engine_dropped() {
        let opener = Arc::new(RecordingOpener::default());
        let weak = Arc::downgrade(&opener) as Weak<dyn MenuOpener>;
        drop(opener);
        let harness = TestExecutor::new();
        let cx = harness.context_with(&[]);
        let result = OpenHandler::new("open", weak)
            .execute(
                &MockIdentity::new("Steve").into_ref(),
                &ActionValue::from("open { shop }"),
                &harness.handler_context(&cx),
            )
            .unwrap();
        assert!(result.is_failure());
    }

    #[test]
    fn test_open_target() {
        assert_eq!(open_target(&ActionValue::from("open { shop 1 }")), Some("shop".into()));
        assert_eq!(open_target(&ActionValue::from("open {   }")), None);
    }
}

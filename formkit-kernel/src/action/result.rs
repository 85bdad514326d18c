//! Outcome of running one action.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    Success,
    Failure,
    PartialSuccess,
    Skipped,
}

#[derive(Clone)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: Option<String>,
    pub cause: Option<Arc<anyhow::Error>>,
    pub payload: Option<serde_json::Value>,
    /// Set when the rest of the running sequence must wait this long.
    pub resume_after: Option<Duration>,
}

impl ActionResult {
    fn with_status(status: ActionStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            cause: None,
            payload: None,
            resume_after: None,
        }
    }

    pub fn success() -> Self {
        Self::with_status(ActionStatus::Success, None)
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Success, Some(message.into()))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Failure, Some(message.into()))
    }

    /// A failure caused by `error`; the message is the error's display text.
    pub fn failure_from(error: anyhow::Error) -> Self {
        Self {
            status: ActionStatus::Failure,
            message: Some(error.to_string()),
            cause: Some(Arc::new(error)),
            payload: None,
            resume_after: None,
        }
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::PartialSuccess, Some(message.into()))
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Skipped, Some(message.into()))
    }

    /// A success that suspends whatever follows it for `delay`.
    pub fn suspended(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            resume_after: Some(delay),
            ..Self::success_with(message)
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failure
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionResult")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("cause", &self.cause.as_ref().map(|e| e.to_string()))
            .field("payload", &self.payload)
            .field("resume_after", &self.resume_after)
            .finish()
    }
}

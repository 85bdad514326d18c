//! The actor on whose behalf actions run and conditions are evaluated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which client edition an identity is connected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientPlatform {
    Bedrock,
    Java,
    Unknown,
}

/// Capability surface of one connected session.
pub trait Identity: Send + Sync {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    /// Deliver one chat line.
    fn send_message(&self, text: &str);

    /// Run a command as this identity. Returns whether the host accepted it.
    fn execute_command(&self, command: &str) -> bool;

    fn has_permission(&self, permission: &str) -> bool;

    fn platform(&self) -> ClientPlatform {
        ClientPlatform::Unknown
    }
}

/// Shared handle to an identity.
pub type IdentityRef = Arc<dyn Identity>;

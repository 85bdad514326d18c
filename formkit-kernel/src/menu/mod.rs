//! Menus: the loaded model and the orchestrator that opens them.

mod model;
mod offline;
mod orchestrator;

pub use model::{
    Button, ButtonFace, ConditionalButton, ConditionalProperty, Menu, PriorityItem, PropertyKind,
    count_numbered_placeholders,
};
pub use orchestrator::MenuOrchestrator;

use std::fmt;
use std::sync::Arc;

use formkit_api::{
    CommandDispatcherRef, EconomyRef, ExtensionPresenceRef, IdentityDirectoryRef,
    PlaceholderExpanderRef, SchedulerRef, SoundPlayerRef, SurfaceSenderRef, TitleDisplayRef,
};
use serde::{Deserialize, Serialize};

/// Layout family of a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Simple,
    Modal,
    Custom,
}

impl MenuType {
    /// Case-insensitive lookup of a configured type name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(MenuType::Simple),
            "modal" => Some(MenuType::Modal),
            "custom" => Some(MenuType::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuType::Simple => "simple",
            MenuType::Modal => "modal",
            MenuType::Custom => "custom",
        }
    }
}

impl fmt::Display for MenuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    NotFound,
    NoPermission,
    Usage { required: usize },
    /// No surface sender, or the identity's client cannot show surfaces.
    Unsupported,
    Sent,
    DeliveryFailed,
}

impl fmt::Display for OpenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenOutcome::NotFound => f.write_str("menu not found"),
            OpenOutcome::NoPermission => f.write_str("missing permission"),
            OpenOutcome::Usage { required } => write!(f, "needs {required} argument(s)"),
            OpenOutcome::Unsupported => f.write_str("client cannot display menus"),
            OpenOutcome::Sent => f.write_str("sent"),
            OpenOutcome::DeliveryFailed => f.write_str("delivery failed"),
        }
    }
}

/// Platform adapters handed to the engine. Any of them may be missing;
/// handlers that need a missing one are not registered.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub commands: Option<CommandDispatcherRef>,
    pub sounds: Option<SoundPlayerRef>,
    pub economy: Option<EconomyRef>,
    pub surfaces: Option<SurfaceSenderRef>,
    pub titles: Option<TitleDisplayRef>,
    pub extensions: Option<ExtensionPresenceRef>,
    pub directory: Option<IdentityDirectoryRef>,
    /// Falls back to a thread-sleeping scheduler.
    pub scheduler: Option<SchedulerRef>,
    pub placeholders: Option<PlaceholderExpanderRef>,
}

impl Collaborators {
    /// No platform at all. Menus load and validate but never display.
    pub fn headless() -> Self {
        Self::default()
    }

    /// Inert adapters for every side-effecting collaborator, so all
    /// built-in action types register. Used for checking configurations
    /// away from a platform; running an action fails.
    pub fn offline() -> Self {
        let offline = Arc::new(offline::Offline);
        Self {
            commands: Some(offline.clone()),
            sounds: Some(offline.clone()),
            economy: Some(offline.clone()),
            titles: Some(offline.clone()),
            directory: Some(offline),
            ..Self::default()
        }
    }
}

//! Platform collaborators the engine calls out to.
//!
//! Every trait is object safe and `Send + Sync` so a host can hand the
//! kernel `Arc<dyn ...>` adapters and swap them per platform.

use std::sync::Arc;
use std::time::Duration;

use crate::{IdentityRef, Responder, Surface};

/// Raw command dispatch.
pub trait CommandDispatcher: Send + Sync {
    fn run_as_console(&self, command: &str) -> anyhow::Result<()>;

    fn run_as_identity(&self, identity: &IdentityRef, command: &str) -> anyhow::Result<()>;

    fn exists(&self, command: &str) -> bool;
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, identity: &IdentityRef, name: &str, volume: f32, pitch: f32)
    -> anyhow::Result<()>;

    fn stop_all(&self, identity: &IdentityRef) -> anyhow::Result<()>;

    fn exists(&self, name: &str) -> bool;
}

/// Balance bookkeeping for one currency.
pub trait Economy: Send + Sync {
    fn balance(&self, identity: &IdentityRef) -> f64;

    fn add(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()>;

    fn remove(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()>;

    fn set(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()>;

    fn has(&self, identity: &IdentityRef, amount: f64) -> bool {
        self.balance(identity) >= amount
    }

    fn format(&self, amount: f64) -> String {
        format!("{amount:.2}")
    }
}

/// Delivers a rendered surface to a client.
pub trait SurfaceSender: Send + Sync {
    /// Send `surface`; `responder` is invoked once with the client's answer.
    fn send(&self, identity: &IdentityRef, surface: Surface, responder: Responder)
    -> anyhow::Result<()>;

    fn is_available(&self) -> bool;

    /// Whether `identity` is on a client that can display surfaces.
    fn is_target_of_required_kind(&self, identity: &IdentityRef) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleTimings {
    pub fade_in: u32,
    pub stay: u32,
    pub fade_out: u32,
}

impl Default for TitleTimings {
    fn default() -> Self {
        Self {
            fade_in: 10,
            stay: 60,
            fade_out: 10,
        }
    }
}

pub trait TitleDisplay: Send + Sync {
    fn send_title(
        &self,
        identity: &IdentityRef,
        title: &str,
        subtitle: &str,
        timings: TitleTimings,
    ) -> anyhow::Result<()>;

    fn action_bar(&self, identity: &IdentityRef, text: &str) -> anyhow::Result<()>;

    fn clear(&self, identity: &IdentityRef) -> anyhow::Result<()>;

    fn reset(&self, identity: &IdentityRef) -> anyhow::Result<()>;

    fn is_supported(&self) -> bool;
}

/// Queries which host extensions are installed.
pub trait ExtensionPresence: Send + Sync {
    fn is_enabled(&self, name: &str) -> bool;
}

pub trait IdentityDirectory: Send + Sync {
    fn resolve(&self, name: &str) -> Option<IdentityRef>;

    fn is_online(&self, name: &str) -> bool;

    fn send_message(&self, identity: &IdentityRef, text: &str);
}

/// A deferred task handed to the host scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs work later, on the host's own timeline.
pub trait Scheduler: Send + Sync {
    fn run_later(&self, delay: Duration, task: Task);
}

/// Scheduler that sleeps on a detached thread. Used when the host has none.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn run_later(&self, delay: Duration, task: Task) {
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            task();
        });
    }
}

/// Resolves host-side placeholders such as `%player_level%`.
pub trait PlaceholderExpander: Send + Sync {
    fn expand(&self, identity: &IdentityRef, text: &str) -> String;
}

/// Shared handles for every collaborator, as consumed by the kernel.
pub type CommandDispatcherRef = Arc<dyn CommandDispatcher>;
pub type SoundPlayerRef = Arc<dyn SoundPlayer>;
pub type EconomyRef = Arc<dyn Economy>;
pub type SurfaceSenderRef = Arc<dyn SurfaceSender>;
pub type TitleDisplayRef = Arc<dyn TitleDisplay>;
pub type ExtensionPresenceRef = Arc<dyn ExtensionPresence>;
pub type IdentityDirectoryRef = Arc<dyn IdentityDirectory>;
pub type SchedulerRef = Arc<dyn Scheduler>;
pub type PlaceholderExpanderRef = Arc<dyn PlaceholderExpander>;

//! Stand-in collaborators for running without a platform.
//!
//! Every side effect fails with an error. They exist so the full set of
//! built-in handlers registers for static checks.

use formkit_api::{
    CommandDispatcher, Economy, IdentityDirectory, IdentityRef, SoundPlayer, TitleDisplay,
    TitleTimings,
};

pub(crate) struct Offline;

fn offline<T>() -> anyhow::Result<T> {
    anyhow::bail!("no platform attached")
}

impl CommandDispatcher for Offline {
    fn run_as_console(&self, _command: &str) -> anyhow::Result<()> {
        offline()
    }

    fn run_as_identity(&self, _identity: &IdentityRef, _command: &str) -> anyhow::Result<()> {
        offline()
    }

    fn exists(&self, _command: &str) -> bool {
        false
    }
}

impl SoundPlayer for Offline {
    fn play(&self, _identity: &IdentityRef, _name: &str, _volume: f32, _pitch: f32)
    -> anyhow::Result<()> {
        offline()
    }

    fn stop_all(&self, _identity: &IdentityRef) -> anyhow::Result<()> {
        offline()
    }

    fn exists(&self, _name: &str) -> bool {
        false
    }
}

impl Economy for Offline {
    fn balance(&self, _identity: &IdentityRef) -> f64 {
        0.0
    }

    fn add(&self, _identity: &IdentityRef, _amount: f64) -> anyhow::Result<()> {
        offline()
    }

    fn remove(&self, _identity: &IdentityRef, _amount: f64) -> anyhow::Result<()> {
        offline()
    }

    fn set(&self, _identity: &IdentityRef, _amount: f64) -> anyhow::Result<()> {
        offline()
    }
}

impl TitleDisplay for Offline {
    fn send_title(
        &self,
        _identity: &IdentityRef,
        _title: &str,
        _subtitle: &str,
        _timings: TitleTimings,
    ) -> anyhow::Result<()> {
        offline()
    }

    fn action_bar(&self, _identity: &IdentityRef, _text: &str) -> anyhow::Result<()> {
        offline()
    }

    fn clear(&self, _identity: &IdentityRef) -> anyhow::Result<()> {
        offline()
    }

    fn reset(&self, _identity: &IdentityRef) -> anyhow::Result<()> {
        offline()
    }

    fn is_supported(&self) -> bool {
        false
    }
}

impl IdentityDirectory for Offline {
    fn resolve(&self, _name: &str) -> Option<IdentityRef> {
        None
    }

    fn is_online(&self, _name: &str) -> bool {
        false
    }

    fn send_message(&self, _identity: &IdentityRef, _text: &str) {}
}

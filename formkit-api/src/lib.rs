//! Formkit API - Shared types for the menu engine and its host adapters.
//!
//! The kernel only talks to the outside world through the traits defined
//! here: the identity an action runs for, the platform collaborators that
//! carry out side effects, and the surface model sent to a client.

mod collaborators;
mod identity;
mod surface;

pub use collaborators::*;
pub use identity::*;
pub use surface::*;

//! Registry for looking up action handlers by type.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::ActionHandler;
use crate::error::RegistryError;

fn normalize(action_type: &str) -> String {
    action_type.trim().to_lowercase()
}

/// Concurrent map from action type to handler.
///
/// Safe to mutate while other threads are looking handlers up, which is
/// what a reload does while clicks are in flight.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own type name.
    pub fn register(&self, handler: Arc<dyn ActionHandler>) -> Result<(), RegistryError> {
        let key = normalize(handler.action_type());
        if key.is_empty() {
            return Err(RegistryError::EmptyType);
        }

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.insert(key.clone(), handler).is_some() {
            tracing::warn!("Overriding existing handler for action type '{}'", key);
        } else {
            tracing::debug!("Registered action handler '{}'", key);
        }
        Ok(())
    }

    /// Remove a handler. Returns whether one was registered.
    pub fn unregister(&self, action_type: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(action_type))
            .is_some()
    }

    /// Look up a handler, ignoring case and surrounding whitespace.
    pub fn get(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(action_type))
            .cloned()
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize(action_type))
    }

    /// Snapshot of registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Snapshot of registered handlers.
    pub fn all(&self) -> Vec<Arc<dyn ActionHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! In-memory registry of resolved fields, keyed by field name.
//!
//! The registry uses `arc-swap` for lock-free reads on the hot path; reloads
//! swap in a whole new map of immutable definitions.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use thiserror::Error;

use super::definition::RegisteredField;

/// Errors from the field registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested field name has no entry in the registry.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Shared, lock-free map of registered fields.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    inner: Arc<ArcSwap<HashMap<String, RegisteredField>>>,
}

impl FieldRegistry {
    /// Create a new, empty [`FieldRegistry`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    /// Return the number of registered fields.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Return `true` if no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Look up a field by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownField`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<RegisteredField, RegistryError> {
        self.inner
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownField(name.to_owned()))
    }

    /// Atomically replace the entire registry.
    pub fn replace_all(&self, fields: HashMap<String, RegisteredField>) {
        self.inner.store(Arc::new(fields));
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

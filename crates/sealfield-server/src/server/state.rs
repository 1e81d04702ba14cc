//! Shared application state injected into every Axum handler.

use common::ServiceError;

use crate::registry::{cache::RegistryError, FieldRegistry, RegisteredField};

/// Application state shared across all request handlers.
///
/// The registry is `Arc`-backed, so Axum can clone the state per request
/// without copying field definitions.
#[derive(Clone, Default)]
pub struct AppState {
    /// Lock-free registry of resolved fields.
    pub registry: FieldRegistry,
}

impl AppState {
    /// Create a new [`AppState`] around `registry`.
    pub fn new(registry: FieldRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a field by name.
    ///
    /// An empty registry means definitions never loaded, which is reported
    /// as unavailable rather than as an unknown field.
    pub fn field(&self, name: &str) -> Result<RegisteredField, ServiceError> {
        if self.registry.is_empty() {
            return Err(ServiceError::Unavailable("field registry not loaded".into()));
        }
        self.registry.get(name).map_err(|RegistryError::UnknownField(n)| {
            ServiceError::NotFound(format!("unknown field: {n}"))
        })
    }
}

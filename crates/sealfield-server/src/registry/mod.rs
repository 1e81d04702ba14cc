//! Field definition loading and the live field registry.
//!
//! # Responsibilities
//!
//! - Read the definition file at startup and on a refresh interval.
//! - Resolve every definition against the process [`KeyMaterial`], which is
//!   loaded once and never re-read.
//! - Publish the resolved fields atomically through [`FieldRegistry`].
//!
//! A definition file that fails to parse or contains an invalid field is
//! rejected as a whole; the previous registry stays in place.

pub mod cache;
pub mod definition;

pub use cache::FieldRegistry;
pub use definition::RegisteredField;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use sealfield::KeyMaterial;
use tokio::time;
use tracing::{info, warn};

use definition::DefinitionFile;

/// Parse definition file contents, trying YAML first and then JSON.
fn parse_definitions(text: &str, origin: &str) -> Result<DefinitionFile> {
    if let Ok(parsed) = serde_yaml::from_str(text) {
        Ok(parsed)
    } else if let Ok(parsed) = serde_json::from_str(text) {
        Ok(parsed)
    } else {
        anyhow::bail!("failed to parse field definitions from {origin}: not valid YAML or JSON")
    }
}

/// Resolve every definition, rejecting duplicates and invalid fields.
fn resolve_all(
    file: DefinitionFile,
    material: &KeyMaterial,
) -> Result<HashMap<String, RegisteredField>> {
    let mut fields = HashMap::with_capacity(file.fields.len());
    for def in file.fields {
        let field = def
            .build(material)
            .with_context(|| format!("invalid field definition: {}", def.name))?;
        if fields.insert(def.name.clone(), field).is_some() {
            anyhow::bail!("duplicate field definition: {}", def.name);
        }
    }
    Ok(fields)
}

/// Load all field definitions from `path` and atomically replace the registry.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any field
/// definition is invalid.
pub async fn load_all(path: &Path, material: &KeyMaterial, registry: &FieldRegistry) -> Result<()> {
    let origin = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read field definitions: {origin}"))?;

    let fields = resolve_all(parse_definitions(&text, &origin)?, material)?;
    if fields.is_empty() {
        warn!(path = %origin, "no field definitions found");
    }

    registry.replace_all(fields);
    info!(count = registry.len(), path = %origin, "field registry loaded");
    Ok(())
}

/// Spawn a background task that periodically reloads the field registry.
///
/// On failure the previous registry is retained and a warning is emitted.
pub fn refresh_task(
    path: std::path::PathBuf,
    interval_secs: u64,
    material: KeyMaterial,
    registry: FieldRegistry,
) -> tokio::task::JoinHandle<()> {
    let interval = std::time::Duration::from_secs(interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; startup already loaded the registry.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = load_all(&path, &material, &registry).await {
                warn!(error = %e, "field registry reload failed; retaining previous definitions");
            }
        }
    })
}

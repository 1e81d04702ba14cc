//! Key resolution and derivation.
//!
//! # Lifecycle
//!
//! 1. At startup the process loads a [`KeyMaterial`]: its key list, the
//!    fallback default secret, and the default derivation flag.
//! 2. Each field definition resolves a [`KeySet`] from explicit keys or the
//!    process material, then resolves it once into [`CipherKeys`].
//! 3. The resolved keys live as long as the field definition and are never
//!    mutated. Rotation means deploying a new definition.
//!
//! # Security invariants
//!
//! - Secrets and derived keys are zeroed on drop and redacted in `Debug`.
//! - Key identity is never embedded in tokens; decoding tries each key.

pub mod derive;
pub mod material;

pub use derive::{CipherKey, CipherKeys, KEY_LEN};
pub use material::{KeyMaterial, KeySet, Secret};

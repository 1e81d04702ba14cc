//! Field-level authenticated encryption with rotatable keys and
//! digest-prefix equality lookups.
//!
//! # Layers
//!
//! - [`keys`]: process key material, per-field key sets, HKDF derivation.
//! - [`crypto`]: versioned AES-256-GCM-SIV tokens and lookup digests.
//! - [`field`]: field definitions, the storage codec, typed columns.
//! - [`index`]: prefix index planning for indexed and unique fields.
//!
//! Everything here is synchronous and free of I/O. Definitions are
//! immutable once built and safe to share across threads.

pub mod crypto;
pub mod error;
pub mod field;
pub mod index;
pub mod keys;

pub use error::{FieldError, Result};
pub use field::{
    Comparable, EncryptedColumn, FieldCodec, FieldSpec, FieldValue, IndexIntent, LookupValue,
};
pub use index::{IndexCatalog, IndexDefinition, IndexDiff, IndexPolicy};
pub use keys::{KeyMaterial, KeySet, Secret};

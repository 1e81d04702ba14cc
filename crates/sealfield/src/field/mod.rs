//! Encrypted field definitions and the storage codec built on them.
//!
//! - [`spec`]: immutable [`FieldSpec`] and its validating builder.
//! - [`codec`]: [`FieldCodec`], turning plaintext bytes into stored bytes
//!   and lookups into digests.
//! - [`column`]: [`EncryptedColumn<T>`], the typed wrapper storage layers use.

pub mod codec;
pub mod column;
pub mod spec;

pub use codec::{Comparable, FieldCodec, LookupOperator, LookupValue};
pub use column::{EncryptedColumn, FieldValue};
pub use spec::{FieldSpec, FieldSpecBuilder, IndexIntent};

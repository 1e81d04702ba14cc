//! Cryptographic primitives: the token codec and lookup digests.
//!
//! This module is free of field and index concerns; it only turns bytes
//! into tokens and digests and back.
//!
//! # Token format
//!
//! ```text
//! 0x80 | timestamp (u64 BE) | nonce (12) | ciphertext | tag (16)
//! ```

pub mod digest;
pub mod token;

pub use digest::{LookupDigest, LookupHash, DIGEST_LEN};
pub use token::TOKEN_OVERHEAD;

//! [`FieldCodec`]: the encode / decode / lookup contract used by storage.
//!
//! # Stored layout
//!
//! ```text
//! [digest (32)]? | token
//! ```
//!
//! The digest prefix is present iff the field's index intent is `index` or
//! `unique`. Its fixed length makes it trivial to strip before decoding.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::{token, LookupDigest, DIGEST_LEN};
use crate::error::{FieldError, Result};

use super::spec::FieldSpec;

/// Lookup operators an encrypted field can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOperator {
    /// Equality against one value.
    Exact,
    /// Membership in a list of values.
    In,
}

impl LookupOperator {
    /// Parse an ORM-style operator name for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedLookup`] for anything but `exact`
    /// and `in`. Ordering, range, and substring lookups cannot be answered
    /// from digests.
    pub fn parse(field: &str, operator: &str) -> Result<Self> {
        match operator {
            "exact" => Ok(LookupOperator::Exact),
            "in" => Ok(LookupOperator::In),
            other => Err(FieldError::unsupported(field, other)),
        }
    }

    /// Canonical operator name.
    pub fn as_str(self) -> &'static str {
        match self {
            LookupOperator::Exact => "exact",
            LookupOperator::In => "in",
        }
    }
}

/// Canonical plaintext bytes supplied for a lookup.
#[derive(Debug, Clone)]
pub enum LookupValue<'a> {
    /// One value.
    Single(&'a [u8]),
    /// A list of values (for `in`).
    Many(Vec<&'a [u8]>),
}

/// Value to compare against the digest prefix of stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparable {
    /// Compare the prefix for equality.
    Digest(LookupDigest),
    /// Compare the prefix for membership.
    Digests(Vec<LookupDigest>),
}

impl Comparable {
    /// Flatten into a list of digests.
    pub fn into_digests(self) -> Vec<LookupDigest> {
        match self {
            Comparable::Digest(d) => vec![d],
            Comparable::Digests(ds) => ds,
        }
    }
}

/// Encodes and decodes stored values for one field.
///
/// Cheap to clone; safe to share across threads.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    spec: Arc<FieldSpec>,
}

impl FieldCodec {
    /// Wrap a field definition.
    pub fn new(spec: impl Into<Arc<FieldSpec>>) -> Self {
        Self { spec: spec.into() }
    }

    /// The field definition.
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Encrypt `plaintext` for storage, stamped with the current time.
    pub fn encode_for_storage(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encode_for_storage_at(plaintext, unix_now())
    }

    /// Encrypt `plaintext` for storage, stamped with `now` (unix seconds).
    pub fn encode_for_storage_at(&self, plaintext: &[u8], now: u64) -> Result<Vec<u8>> {
        let token = token::encode(self.spec.ciphers().primary(), plaintext, now)?;
        if !self.spec.index_intent().prepends_digest() {
            return Ok(token);
        }
        let digest = self.digest(plaintext)?;
        let mut stored = Vec::with_capacity(DIGEST_LEN + token.len());
        stored.extend_from_slice(digest.as_bytes());
        stored.extend_from_slice(&token);
        Ok(stored)
    }

    /// Decrypt a stored value back to its canonical plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Decryption`] if the value is malformed or no key
    /// in the field's set verifies it.
    pub fn decode_from_storage(&self, stored: &[u8]) -> Result<Vec<u8>> {
        token::decode(self.spec.ciphers(), self.token_part(stored)?, unix_now())
    }

    /// Re-encrypt a stored value under the field's primary key.
    ///
    /// The digest prefix is recomputed from the plaintext, so the stored
    /// layout always matches the current definition.
    pub fn reencode(&self, stored: &[u8]) -> Result<Vec<u8>> {
        let plaintext = self.decode_from_storage(stored)?;
        self.encode_for_storage(&plaintext)
    }

    /// Validate `operator` against the field before any value is prepared.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedLookup`] if the field has no index
    /// intent or the operator is not `exact` or `in`.
    pub fn check_lookup(&self, operator: &str) -> Result<LookupOperator> {
        let field = self.spec.name();
        if !self.spec.index_intent().prepends_digest() {
            return Err(FieldError::unsupported(field, operator));
        }
        LookupOperator::parse(field, operator)
    }

    /// Transform a lookup into digests comparable with stored prefixes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedLookup`] if the field has no index
    /// intent, the operator is not `exact` or `in`, or `exact` is given a
    /// list.
    pub fn transform_lookup_value(
        &self,
        operator: &str,
        value: LookupValue<'_>,
    ) -> Result<Comparable> {
        let field = self.spec.name();
        match (self.check_lookup(operator)?, value) {
            (LookupOperator::Exact, LookupValue::Single(v)) => {
                Ok(Comparable::Digest(self.digest(v)?))
            }
            (LookupOperator::Exact, LookupValue::Many(_)) => {
                Err(FieldError::unsupported(field, "exact (list value)"))
            }
            (LookupOperator::In, LookupValue::Single(v)) => {
                Ok(Comparable::Digests(vec![self.digest(v)?]))
            }
            (LookupOperator::In, LookupValue::Many(vs)) => vs
                .into_iter()
                .map(|v| self.digest(v))
                .collect::<Result<Vec<_>>>()
                .map(Comparable::Digests),
        }
    }

    /// Digest canonical bytes with the field's lookup hash.
    pub fn digest(&self, canonical: &[u8]) -> Result<LookupDigest> {
        self.spec.lookup_hash().digest(canonical)
    }

    fn token_part<'a>(&self, stored: &'a [u8]) -> Result<&'a [u8]> {
        if !self.spec.index_intent().prepends_digest() {
            return Ok(stored);
        }
        stored.get(DIGEST_LEN..).ok_or(FieldError::Decryption)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

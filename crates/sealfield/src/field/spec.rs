//! [`FieldSpec`]: the immutable definition of one encrypted attribute.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::LookupHash;
use crate::error::{FieldError, Result};
use crate::keys::{CipherKeys, KeyMaterial, KeySet, Secret};

/// Declared index support for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexIntent {
    /// Stored value is the token alone; no lookups.
    #[default]
    None,
    /// Digest-prefixed, with a non-unique prefix index.
    Index,
    /// Digest-prefixed, with a unique prefix index.
    Unique,
}

impl IndexIntent {
    /// Map ORM-style `unique` / `db_index` flags to an intent. `unique` wins.
    pub fn from_flags(unique: bool, db_index: bool) -> Self {
        match (unique, db_index) {
            (true, _) => IndexIntent::Unique,
            (false, true) => IndexIntent::Index,
            (false, false) => IndexIntent::None,
        }
    }

    /// Whether stored values carry a digest prefix.
    pub fn prepends_digest(self) -> bool {
        self != IndexIntent::None
    }
}

/// Immutable configuration of one encrypted attribute.
///
/// Keys are resolved and derived exactly once, when the spec is built.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    keys: KeySet,
    use_hkdf: bool,
    index_intent: IndexIntent,
    ciphers: CipherKeys,
    lookup: LookupHash,
}

impl FieldSpec {
    /// Start defining a field called `name`.
    pub fn builder(name: impl Into<String>) -> FieldSpecBuilder {
        FieldSpecBuilder {
            name: name.into(),
            key: None,
            keys: None,
            use_hkdf: None,
            index_intent: IndexIntent::None,
            primary_key: false,
            lookup_hash_key: None,
        }
    }

    /// Field name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw secrets, highest priority first.
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Whether secrets were stretched through HKDF.
    pub fn use_hkdf(&self) -> bool {
        self.use_hkdf
    }

    /// Declared index support.
    pub fn index_intent(&self) -> IndexIntent {
        self.index_intent
    }

    /// Cipher keys derived from [`FieldSpec::keys`].
    pub fn ciphers(&self) -> &CipherKeys {
        &self.ciphers
    }

    /// Digest scheme for lookups and stored prefixes.
    pub fn lookup_hash(&self) -> &LookupHash {
        &self.lookup
    }
}

/// Builder for [`FieldSpec`]. All validation happens in [`build`](Self::build).
#[derive(Debug)]
pub struct FieldSpecBuilder {
    name: String,
    key: Option<Secret>,
    keys: Option<Vec<Secret>>,
    use_hkdf: Option<bool>,
    index_intent: IndexIntent,
    primary_key: bool,
    lookup_hash_key: Option<Secret>,
}

impl FieldSpecBuilder {
    /// Use a single explicit secret.
    pub fn key(mut self, key: impl Into<Secret>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Use an explicit key list, highest priority first.
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Secret>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Override the process default derivation flag.
    pub fn hkdf(mut self, enabled: bool) -> Self {
        self.use_hkdf = Some(enabled);
        self
    }

    /// Declare index support.
    pub fn index_intent(mut self, intent: IndexIntent) -> Self {
        self.index_intent = intent;
        self
    }

    /// Declare the field as the model's primary key. Always rejected.
    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Key lookup digests with HMAC-SHA256 under a dedicated secret.
    pub fn lookup_hash_key(mut self, secret: impl Into<Secret>) -> Self {
        self.lookup_hash_key = Some(secret.into());
        self
    }

    /// Validate and resolve the definition against process key material.
    ///
    /// # Errors
    ///
    /// - [`FieldError::Configuration`] for conflicting keys, an empty key
    ///   list, a primary-key declaration, or a hash key on an unindexed field.
    /// - [`FieldError::InvalidKey`] if derivation is disabled and a secret is
    ///   not a valid cipher key.
    pub fn build(self, material: &KeyMaterial) -> Result<FieldSpec> {
        if self.primary_key {
            return Err(FieldError::config(format!(
                "{}: an encrypted field cannot be a primary key",
                self.name
            )));
        }
        if self.lookup_hash_key.is_some() && !self.index_intent.prepends_digest() {
            return Err(FieldError::config(format!(
                "{}: a lookup hash key requires index or unique intent",
                self.name
            )));
        }

        let keys = material
            .resolve(self.key, self.keys)
            .map_err(|e| match e {
                FieldError::Configuration(msg) => {
                    FieldError::Configuration(format!("{}: {msg}", self.name))
                }
                other => other,
            })?;
        let use_hkdf = self.use_hkdf.unwrap_or_else(|| material.use_hkdf());
        let ciphers = CipherKeys::resolve(&keys, use_hkdf)?;
        let lookup = match &self.lookup_hash_key {
            Some(secret) => LookupHash::keyed(secret)?,
            None => LookupHash::Sha256,
        };

        debug!(
            field = %self.name,
            keys = keys.len(),
            use_hkdf,
            index_intent = ?self.index_intent,
            keyed_digest = lookup.is_keyed(),
            "field defined"
        );

        Ok(FieldSpec {
            name: self.name,
            keys,
            use_hkdf,
            index_intent: self.index_intent,
            ciphers,
            lookup,
        })
    }
}

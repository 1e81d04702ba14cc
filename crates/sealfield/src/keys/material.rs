//! [`KeyMaterial`]: process-wide secrets and per-field key resolution.

use std::fmt;

use tracing::debug;

use crate::error::{FieldError, Result};

/// An opaque raw secret.
///
/// The bytes are overwritten with zeroes on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Box<[u8]>);

impl Secret {
    /// Wrap raw secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into().into_boxed_slice())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&[u8]> for Secret {
    fn from(b: &[u8]) -> Self {
        Self::new(b)
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Non-empty, priority-ordered list of secrets.
///
/// Index 0 encrypts everything new; every entry is tried, in order, when
/// decrypting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySet(Vec<Secret>);

impl KeySet {
    /// Build a key set from `secrets`, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Configuration`] if `secrets` is empty.
    pub fn new(secrets: Vec<Secret>) -> Result<Self> {
        if secrets.is_empty() {
            return Err(FieldError::config("a key set needs at least one key"));
        }
        Ok(Self(secrets))
    }

    /// The key used for all new encryption.
    pub fn primary(&self) -> &Secret {
        &self.0[0]
    }

    /// Iterate the secrets in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Secret> {
        self.0.iter()
    }

    /// Number of secrets in the set. Always at least one.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Key configuration loaded once at process startup.
///
/// Holds the process-wide key list, the fallback default secret, and the
/// default derivation flag. Immutable after construction; injected into
/// every field definition rather than read from global scope.
#[derive(Clone, Debug)]
pub struct KeyMaterial {
    keys: Vec<Secret>,
    default_secret: Secret,
    use_hkdf: bool,
}

impl KeyMaterial {
    /// Create key material from the process default secret, an optional
    /// process key list (highest priority first) and the default HKDF flag.
    pub fn new(default_secret: Secret, keys: Vec<Secret>, use_hkdf: bool) -> Self {
        Self {
            keys,
            default_secret,
            use_hkdf,
        }
    }

    /// Whether fields derive cipher keys via HKDF unless told otherwise.
    pub fn use_hkdf(&self) -> bool {
        self.use_hkdf
    }

    /// Resolve the key set for one field.
    ///
    /// Explicit keys win and are used verbatim in the given order. Without
    /// them the process key list is used, and failing that the single
    /// process default secret.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Configuration`] if both `explicit_key` and
    /// `explicit_keys` are supplied, or if `explicit_keys` is empty.
    pub fn resolve(
        &self,
        explicit_key: Option<Secret>,
        explicit_keys: Option<Vec<Secret>>,
    ) -> Result<KeySet> {
        let set = match (explicit_key, explicit_keys) {
            (Some(_), Some(_)) => {
                return Err(FieldError::config(
                    "cannot supply both a single key and a key list",
                ))
            }
            (Some(key), None) => KeySet::new(vec![key])?,
            (None, Some(keys)) => KeySet::new(keys)?,
            (None, None) if !self.keys.is_empty() => KeySet::new(self.keys.clone())?,
            (None, None) => KeySet::new(vec![self.default_secret.clone()])?,
        };
        debug!(keys = set.len(), "resolved field key set");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(keys: &[&str]) -> KeyMaterial {
        KeyMaterial::new(
            Secret::from("process-secret"),
            keys.iter().map(|k| Secret::from(*k)).collect(),
            true,
        )
    }

    #[test]
    fn explicit_key_wins() {
        let set = material(&["a", "b"]).resolve(Some("mine".into()), None).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().as_bytes(), b"mine");
    }

    #[test]
    fn explicit_keys_keep_order() {
        let set = material(&[])
            .resolve(None, Some(vec!["new".into(), "old".into()]))
            .unwrap();
        let keys: Vec<&[u8]> = set.iter().map(Secret::as_bytes).collect();
        assert_eq!(keys, vec![&b"new"[..], &b"old"[..]]);
    }

    #[test]
    fn falls_back_to_process_keys() {
        let set = material(&["p1", "p2"]).resolve(None, None).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.primary().as_bytes(), b"p1");
    }

    #[test]
    fn falls_back_to_default_secret() {
        let set = material(&[]).resolve(None, None).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().as_bytes(), b"process-secret");
    }

    #[test]
    fn key_and_keys_conflict() {
        let err = material(&[])
            .resolve(Some("a".into()), Some(vec!["b".into()]))
            .unwrap_err();
        assert!(matches!(err, FieldError::Configuration(_)));
    }

    #[test]
    fn empty_key_list_rejected() {
        let err = material(&[]).resolve(None, Some(Vec::new())).unwrap_err();
        assert!(matches!(err, FieldError::Configuration(_)));
    }

    #[test]
    fn secret_redacted_in_debug() {
        let s = Secret::from("hunter2");
        let dbg = format!("{s:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("hunter2"));
    }
}

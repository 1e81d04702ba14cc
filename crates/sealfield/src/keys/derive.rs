//! Turning raw secrets into cipher-ready keys.
//!
//! With derivation enabled every secret, whatever its length or alphabet,
//! is stretched through HKDF-SHA256 with a fixed salt and context. With it
//! disabled the secret must already be a cipher key: URL-safe base64 of
//! exactly [`KEY_LEN`] bytes.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use hkdf::Hkdf;
use sha2::Sha256;

use super::material::{KeySet, Secret};
use crate::error::{FieldError, Result};

/// Byte length of an AES-256 key.
pub const KEY_LEN: usize = 32;

const HKDF_SALT: &[u8] = b"sealfield-hkdf-salt";
const HKDF_INFO: &[u8] = b"sealfield";

/// A 256-bit cipher key, zeroed on drop.
#[derive(Clone)]
pub struct CipherKey(Box<[u8; KEY_LEN]>);

impl CipherKey {
    /// Wrap exactly [`KEY_LEN`] key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    /// Borrow the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

/// Derive a cipher key from `secret` with HKDF-SHA256.
///
/// `info` separates independent uses of the same secret.
pub fn hkdf_derive(secret: &[u8], info: &[u8]) -> Result<CipherKey> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| FieldError::InvalidKey(format!("HKDF expand failed: {e}")))?;
    Ok(CipherKey::from_bytes(okm))
}

/// Derive the token cipher key for `secret`.
pub fn derive_cipher_key(secret: &Secret) -> Result<CipherKey> {
    hkdf_derive(secret.as_bytes(), HKDF_INFO)
}

/// Interpret `secret` as an already-valid cipher key.
///
/// # Errors
///
/// Returns [`FieldError::InvalidKey`] unless the secret is URL-safe base64
/// (padded) that decodes to exactly [`KEY_LEN`] bytes.
pub fn raw_cipher_key(secret: &Secret) -> Result<CipherKey> {
    let decoded = URL_SAFE.decode(secret.as_bytes()).map_err(|_| {
        FieldError::InvalidKey("key must be URL-safe base64 when HKDF is disabled".into())
    })?;
    let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
        FieldError::InvalidKey(format!(
            "key must decode to {KEY_LEN} bytes, got {}",
            decoded.len()
        ))
    })?;
    Ok(CipherKey::from_bytes(bytes))
}

/// Non-empty, priority-ordered cipher keys resolved from a [`KeySet`].
#[derive(Clone, Debug)]
pub struct CipherKeys(Vec<CipherKey>);

impl CipherKeys {
    /// Resolve every secret in `set`, preserving priority order.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidKey`] if `use_hkdf` is `false` and any
    /// secret is not a valid raw cipher key.
    pub fn resolve(set: &KeySet, use_hkdf: bool) -> Result<Self> {
        let keys = set
            .iter()
            .map(|s| {
                if use_hkdf {
                    derive_cipher_key(s)
                } else {
                    raw_cipher_key(s)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(keys))
    }

    /// Build directly from already-resolved keys.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Configuration`] if `keys` is empty.
    pub fn from_keys(keys: Vec<CipherKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(FieldError::config("a key set needs at least one key"));
        }
        Ok(Self(keys))
    }

    /// The key used for new encryption.
    pub fn primary(&self) -> &CipherKey {
        &self.0[0]
    }

    /// Iterate the keys in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &CipherKey> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_cipher_key(&Secret::from("hello")).unwrap();
        let b = derive_cipher_key(&Secret::from("hello")).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_secrets_different_keys() {
        let a = derive_cipher_key(&Secret::from("hello")).unwrap();
        let b = derive_cipher_key(&Secret::from("world")).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_info_different_keys() {
        let a = hkdf_derive(b"hello", b"one").unwrap();
        let b = hkdf_derive(b"hello", b"two").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn raw_key_accepts_base64_of_32_bytes() {
        let encoded = URL_SAFE.encode([7u8; KEY_LEN]);
        let key = raw_cipher_key(&Secret::from(encoded.as_str())).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_LEN]);
    }

    #[test]
    fn raw_key_rejects_arbitrary_secret() {
        let err = raw_cipher_key(&Secret::from("hello")).unwrap_err();
        assert!(matches!(err, FieldError::InvalidKey(_)));
    }

    #[test]
    fn raw_key_rejects_wrong_length() {
        let encoded = URL_SAFE.encode([7u8; 16]);
        let err = raw_cipher_key(&Secret::from(encoded.as_str())).unwrap_err();
        assert!(matches!(err, FieldError::InvalidKey(_)));
    }

    #[test]
    fn resolve_keeps_priority_order() {
        let set = KeySet::new(vec!["new".into(), "old".into()]).unwrap();
        let keys = CipherKeys::resolve(&set, true).unwrap();
        let expected = derive_cipher_key(&Secret::from("new")).unwrap();
        assert_eq!(keys.primary().as_bytes(), expected.as_bytes());
        assert_eq!(keys.iter().count(), 2);
    }

    #[test]
    fn resolve_without_hkdf_rejects_plain_secrets() {
        let set = KeySet::new(vec!["not-a-key".into()]).unwrap();
        assert!(matches!(
            CipherKeys::resolve(&set, false),
            Err(FieldError::InvalidKey(_))
        ));
    }

    #[test]
    fn cipher_key_redacted_in_debug() {
        let key = CipherKey::from_bytes([0xFF; KEY_LEN]);
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}

//! Deterministic lookup digests over canonical plaintext bytes.
//!
//! The digest is the queryable surrogate stored in front of a token. By
//! default it is plain SHA-256, which anyone with read access to the column
//! can recompute for a guessed value. Fields may instead key it with
//! HMAC-SHA256; the hash key is independent of the rotating cipher keys so
//! that stored prefixes stay valid across rotations.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{FieldError, Result};
use crate::keys::derive::hkdf_derive;
use crate::keys::{CipherKey, Secret};

/// Byte length of a lookup digest.
pub const DIGEST_LEN: usize = 32;

const HASH_KEY_INFO: &[u8] = b"sealfield-lookup-hash";

type HmacSha256 = Hmac<Sha256>;

/// Fixed-length digest of a value's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupDigest([u8; DIGEST_LEN]);

impl LookupDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Read the digest prefix of a stored value.
    ///
    /// Returns `None` if `stored` is shorter than [`DIGEST_LEN`].
    pub fn from_prefix(stored: &[u8]) -> Option<Self> {
        let prefix: [u8; DIGEST_LEN] = stored.get(..DIGEST_LEN)?.try_into().ok()?;
        Some(Self(prefix))
    }

    /// Borrow the digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for LookupDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for LookupDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupDigest(")?;
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

/// How a field computes its lookup digests.
#[derive(Clone, Debug, Default)]
pub enum LookupHash {
    /// Unkeyed SHA-256 over the canonical bytes.
    #[default]
    Sha256,
    /// HMAC-SHA256 keyed by a dedicated hash key.
    Keyed(CipherKey),
}

impl LookupHash {
    /// Keyed digests with a key derived from `secret`.
    pub fn keyed(secret: &Secret) -> Result<Self> {
        Ok(LookupHash::Keyed(hkdf_derive(secret.as_bytes(), HASH_KEY_INFO)?))
    }

    /// Digest `canonical`, the same bytes the token codec encrypts.
    pub fn digest(&self, canonical: &[u8]) -> Result<LookupDigest> {
        let bytes: [u8; DIGEST_LEN] = match self {
            LookupHash::Sha256 => Sha256::digest(canonical).into(),
            LookupHash::Keyed(key) => {
                let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                    .map_err(|e| FieldError::InvalidKey(format!("HMAC init failed: {e}")))?;
                mac.update(canonical);
                mac.finalize().into_bytes().into()
            }
        };
        Ok(LookupDigest(bytes))
    }

    /// Whether this hash needs key material.
    pub fn is_keyed(&self) -> bool {
        matches!(self, LookupHash::Keyed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(v: &[u8]) -> LookupDigest {
        LookupHash::Sha256.digest(v).unwrap()
    }

    #[test]
    fn sha256_matches_known_vector() {
        // SHA-256("abc")
        let d = plain(b"abc");
        assert_eq!(d.as_bytes()[..4], [0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(d.as_bytes()[28..], [0xf2, 0x00, 0x15, 0xad]);
    }

    #[test]
    fn equal_iff_inputs_equal() {
        let samples: Vec<Vec<u8>> = vec![
            b"".to_vec(),
            b"a".to_vec(),
            b"A".to_vec(),
            "caf\u{e9}".as_bytes().to_vec(),
            "cafe\u{301}".as_bytes().to_vec(),
            "\u{1f510} sealed".as_bytes().to_vec(),
            vec![0u8; 1],
            vec![0u8; 2],
            vec![b'x'; 255],
            vec![b'x'; 256],
            vec![0xFF; 4096],
        ];
        for (i, a) in samples.iter().enumerate() {
            for (j, b) in samples.iter().enumerate() {
                assert_eq!(plain(a) == plain(b), i == j, "samples {i} and {j}");
            }
        }
    }

    #[test]
    fn keyed_differs_from_plain_and_across_keys() {
        let k1 = LookupHash::keyed(&Secret::from("one")).unwrap();
        let k2 = LookupHash::keyed(&Secret::from("two")).unwrap();
        assert!(k1.is_keyed());
        assert_ne!(k1.digest(b"v").unwrap(), plain(b"v"));
        assert_ne!(k1.digest(b"v").unwrap(), k2.digest(b"v").unwrap());
        assert_eq!(k1.digest(b"v").unwrap(), k1.digest(b"v").unwrap());
    }

    #[test]
    fn prefix_parsing() {
        let d = plain(b"abc");
        let mut stored = d.as_bytes().to_vec();
        stored.extend_from_slice(b"token");
        assert_eq!(LookupDigest::from_prefix(&stored), Some(d));
        assert_eq!(LookupDigest::from_prefix(&stored[..31]), None);
    }
}

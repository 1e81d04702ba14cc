//! AES-256-GCM-SIV tokens with a version byte and timestamp.
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant,
//! so an accidental nonce collision degrades to leaking equality of that pair
//! rather than breaking authentication. A fresh random nonce is still drawn
//! for every token.
//!
//! The version byte and timestamp are passed as associated data, so the
//! tag covers every byte of the token.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Nonce,
};

use crate::error::{FieldError, Result};
use crate::keys::{CipherKey, CipherKeys};

/// Leading byte of every token produced by this module.
pub const TOKEN_VERSION: u8 = 0x80;

/// Byte length of the big-endian unix timestamp.
pub const TIMESTAMP_LEN: usize = 8;

/// Byte length of an AES-GCM-SIV nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag.
pub const TAG_LEN: usize = 16;

const HEADER_LEN: usize = 1 + TIMESTAMP_LEN;

/// Bytes a token adds on top of the plaintext.
pub const TOKEN_OVERHEAD: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// Tokens stamped further than this in the future fail TTL checks.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Encrypt `plaintext` under `key`, stamping `now` (unix seconds).
///
/// Output layout: `version ++ timestamp ++ nonce ++ ciphertext ++ tag`.
///
/// # Errors
///
/// Returns [`FieldError::InvalidKey`] on an internal AEAD error (unreachable
/// with a valid key).
pub fn encode(key: &CipherKey, plaintext: &[u8], now: u64) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    use aes_gcm_siv::aead::rand_core::RngCore;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let mut token = Vec::with_capacity(TOKEN_OVERHEAD + plaintext.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&now.to_be_bytes());

    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &token[..HEADER_LEN],
            },
        )
        .map_err(|_| FieldError::InvalidKey("aead encryption failed".into()))?;

    token.extend_from_slice(&nonce_bytes);
    token.extend_from_slice(&sealed);
    Ok(token)
}

/// Decrypt `token`, trying each key in priority order.
///
/// `_now` is accepted for symmetry with [`decode_with_ttl`]; plain decoding
/// never enforces token age.
///
/// # Errors
///
/// Returns [`FieldError::Decryption`] if the token is malformed or no key
/// verifies it. The two cases are indistinguishable.
pub fn decode(keys: &CipherKeys, token: &[u8], _now: u64) -> Result<Vec<u8>> {
    open(keys, token).map(|(_, plaintext)| plaintext)
}

/// Like [`decode`], but also rejects tokens older than `ttl_secs` or stamped
/// more than [`MAX_CLOCK_SKEW_SECS`] in the future.
///
/// # Errors
///
/// Returns [`FieldError::Decryption`] for any failure, expiry included.
pub fn decode_with_ttl(keys: &CipherKeys, token: &[u8], now: u64, ttl_secs: u64) -> Result<Vec<u8>> {
    let (timestamp, plaintext) = open(keys, token)?;
    if timestamp.saturating_add(ttl_secs) < now {
        return Err(FieldError::Decryption);
    }
    if timestamp > now.saturating_add(MAX_CLOCK_SKEW_SECS) {
        return Err(FieldError::Decryption);
    }
    Ok(plaintext)
}

/// Return the timestamp embedded in `token`, after authenticating it.
///
/// # Errors
///
/// Returns [`FieldError::Decryption`] if the token does not verify.
pub fn extract_timestamp(keys: &CipherKeys, token: &[u8]) -> Result<u64> {
    open(keys, token).map(|(timestamp, _)| timestamp)
}

/// Re-encrypt `token` under the primary key, stamping `now`.
///
/// # Errors
///
/// Returns [`FieldError::Decryption`] if no key in `keys` verifies `token`.
pub fn rotate(keys: &CipherKeys, token: &[u8], now: u64) -> Result<Vec<u8>> {
    let (_, plaintext) = open(keys, token)?;
    encode(keys.primary(), &plaintext, now)
}

fn open(keys: &CipherKeys, token: &[u8]) -> Result<(u64, Vec<u8>)> {
    if token.len() < TOKEN_OVERHEAD || token[0] != TOKEN_VERSION {
        return Err(FieldError::Decryption);
    }
    let (header, rest) = token.split_at(HEADER_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let mut ts = [0u8; TIMESTAMP_LEN];
    ts.copy_from_slice(&header[1..]);
    let timestamp = u64::from_be_bytes(ts);

    for key in keys.iter() {
        let cipher = build_cipher(key).map_err(|_| FieldError::Decryption)?;
        let opened = cipher.decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: sealed,
                aad: header,
            },
        );
        if let Ok(plaintext) = opened {
            return Ok((timestamp, plaintext));
        }
    }
    Err(FieldError::Decryption)
}

fn build_cipher(key: &CipherKey) -> Result<Aes256GcmSiv> {
    Aes256GcmSiv::new_from_slice(key.as_bytes())
        .map_err(|_| FieldError::InvalidKey("cipher rejected key".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive::hkdf_derive;

    const NOW: u64 = 1_700_000_000;

    fn key(name: &str) -> CipherKey {
        hkdf_derive(name.as_bytes(), b"test").unwrap()
    }

    fn keys(names: &[&str]) -> CipherKeys {
        CipherKeys::from_keys(names.iter().map(|n| key(n)).collect()).unwrap()
    }

    #[test]
    fn encode_decode_round_trip() {
        let token = encode(&key("a"), b"123-45-6789", NOW).unwrap();
        assert_eq!(decode(&keys(&["a"]), &token, NOW).unwrap(), b"123-45-6789");
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let token = encode(&key("a"), b"", NOW).unwrap();
        assert_eq!(token.len(), TOKEN_OVERHEAD);
        assert!(decode(&keys(&["a"]), &token, NOW).unwrap().is_empty());
    }

    #[test]
    fn layout_is_version_then_timestamp() {
        let token = encode(&key("a"), b"x", NOW).unwrap();
        assert_eq!(token[0], TOKEN_VERSION);
        assert_eq!(&token[1..9], &NOW.to_be_bytes());
        assert_eq!(token.len(), TOKEN_OVERHEAD + 1);
    }

    #[test]
    fn encode_is_not_deterministic() {
        let a = encode(&key("a"), b"same", NOW).unwrap();
        let b = encode(&key("a"), b"same", NOW).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let token = encode(&key("a"), b"secret", NOW).unwrap();
        assert!(matches!(
            decode(&keys(&["b"]), &token, NOW),
            Err(FieldError::Decryption)
        ));
    }

    #[test]
    fn any_key_in_set_decodes() {
        let old = encode(&key("old"), b"legacy", NOW).unwrap();
        let new = encode(&key("new"), b"fresh", NOW).unwrap();
        let set = keys(&["new", "old"]);
        assert_eq!(decode(&set, &old, NOW).unwrap(), b"legacy");
        assert_eq!(decode(&set, &new, NOW).unwrap(), b"fresh");
    }

    #[test]
    fn every_single_byte_flip_fails() {
        let set = keys(&["a"]);
        let token = encode(&key("a"), b"tamper me", NOW).unwrap();
        for i in 0..token.len() {
            let mut bad = token.clone();
            bad[i] ^= 0x01;
            assert!(
                matches!(decode(&set, &bad, NOW), Err(FieldError::Decryption)),
                "flip at byte {i} was accepted"
            );
        }
    }

    #[test]
    fn truncated_and_garbage_tokens_fail_the_same_way() {
        let set = keys(&["a"]);
        let token = encode(&key("a"), b"abc", NOW).unwrap();
        for bad in [&token[..token.len() - 1], &token[..5], &[][..], &b"garbage"[..]] {
            let err = decode(&set, bad, NOW).unwrap_err();
            assert_eq!(err.to_string(), "invalid token or wrong key");
        }
    }

    #[test]
    fn ttl_accepts_fresh_and_rejects_expired() {
        let set = keys(&["a"]);
        let token = encode(&key("a"), b"x", NOW).unwrap();
        assert!(decode_with_ttl(&set, &token, NOW + 10, 60).is_ok());
        assert!(decode_with_ttl(&set, &token, NOW + 61, 60).is_err());
    }

    #[test]
    fn ttl_rejects_tokens_from_the_future() {
        let set = keys(&["a"]);
        let token = encode(&key("a"), b"x", NOW + MAX_CLOCK_SKEW_SECS + 1).unwrap();
        assert!(decode_with_ttl(&set, &token, NOW, 3600).is_err());
        // Plain decode never looks at the clock.
        assert!(decode(&set, &token, NOW).is_ok());
    }

    #[test]
    fn decode_ignores_the_clock() {
        let set = keys(&["a"]);
        let token = encode(&key("a"), b"x", NOW).unwrap();
        assert_eq!(decode(&set, &token, 0).unwrap(), b"x");
        assert_eq!(decode(&set, &token, u64::MAX).unwrap(), b"x");
    }

    #[test]
    fn timestamp_extracted_after_verification() {
        let token = encode(&key("a"), b"x", NOW).unwrap();
        assert_eq!(extract_timestamp(&keys(&["a"]), &token).unwrap(), NOW);
        assert!(extract_timestamp(&keys(&["b"]), &token).is_err());
    }

    #[test]
    fn rotate_moves_token_to_primary_key() {
        let token = encode(&key("old"), b"move me", NOW).unwrap();
        let rotated = rotate(&keys(&["new", "old"]), &token, NOW + 5).unwrap();
        assert_eq!(decode(&keys(&["new"]), &rotated, NOW).unwrap(), b"move me");
        assert_eq!(extract_timestamp(&keys(&["new"]), &rotated).unwrap(), NOW + 5);
    }
}

//! Cryptographic utilities
//!
//! [`PathCipher`] protects the link between a stored file and its anonymous
//! identifier. Paths are sealed with AES-256-GCM under a fresh random nonce,
//! so equal paths never produce equal ciphertexts. The sealed form is
//!
//! ```text
//! v1:<key id>:<base64url(nonce || ciphertext || tag)>
//! ```
//!
//! The key id lets old ciphertexts keep decrypting after the active key is
//! rotated, as long as the old key stays in the ring.

use std::collections::HashMap;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::{
    ANONYMOUS_ID_TOKEN_LENGTH, CIPHER_FORMAT_VERSION, CIPHER_KEY_BYTES, CIPHER_NONCE_BYTES,
};

/// AES-GCM authentication tag length in bytes
const TAG_BYTES: usize = 16;

/// Generate a cryptographically secure random token
pub fn generate_secure_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();

    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hash a string using SHA-256
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Why a sealed path could not be opened
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptionError {
    #[error("malformed ciphertext: {0}")]
    Malformed(&'static str),

    #[error("key '{0}' is not available")]
    UnknownKey(String),

    #[error("ciphertext failed authentication")]
    AuthenticationFailed,
}

/// Key ring setup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherSetupError {
    #[error("key ring is empty")]
    EmptyKeyRing,

    #[error("key '{0}' must be 32 bytes")]
    InvalidKeyLength(String),

    #[error("key id '{0}' is invalid")]
    InvalidKeyId(String),

    #[error("active key '{0}' is not in the key ring")]
    UnknownActiveKey(String),
}

#[derive(Debug, thiserror::Error)]
#[error("path encryption failed")]
pub struct EncryptionError;

/// Symmetric cipher for file paths plus anonymous identifier minting
#[derive(Clone)]
pub struct PathCipher {
    active_key_id: String,
    keys: HashMap<String, Aes256Gcm>,
}

impl std::fmt::Debug for PathCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut key_ids: Vec<&String> = self.keys.keys().collect();
        key_ids.sort();
        f.debug_struct("PathCipher")
            .field("active_key_id", &self.active_key_id)
            .field("key_ids", &key_ids)
            .finish()
    }
}

impl PathCipher {
    /// Build a cipher from `(key id, raw key)` pairs
    pub fn new<'a, I>(keys: I, active_key_id: &str) -> Result<Self, CipherSetupError>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut ring = HashMap::new();
        for (id, raw) in keys {
            if id.is_empty() || id.contains(':') {
                return Err(CipherSetupError::InvalidKeyId(id.to_string()));
            }
            if raw.len() != CIPHER_KEY_BYTES {
                return Err(CipherSetupError::InvalidKeyLength(id.to_string()));
            }
            let key = Key::<Aes256Gcm>::from_slice(raw);
            ring.insert(id.to_string(), Aes256Gcm::new(key));
        }

        if ring.is_empty() {
            return Err(CipherSetupError::EmptyKeyRing);
        }
        if !ring.contains_key(active_key_id) {
            return Err(CipherSetupError::UnknownActiveKey(active_key_id.to_string()));
        }

        Ok(Self {
            active_key_id: active_key_id.to_string(),
            keys: ring,
        })
    }

    pub fn active_key_id(&self) -> &str {
        &self.active_key_id
    }

    /// Seal a plaintext path under the active key
    pub fn encrypt(&self, plain_path: &str) -> Result<String, EncryptionError> {
        let cipher = self
            .keys
            .get(&self.active_key_id)
            .ok_or(EncryptionError)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plain_path.as_bytes())
            .map_err(|_| EncryptionError)?;

        let mut payload = Vec::with_capacity(CIPHER_NONCE_BYTES + sealed.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&sealed);

        Ok(format!(
            "{}:{}:{}",
            CIPHER_FORMAT_VERSION,
            self.active_key_id,
            URL_SAFE_NO_PAD.encode(payload)
        ))
    }

    /// Open a sealed path
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptionError> {
        let mut parts = ciphertext.splitn(3, ':');
        let (Some(version), Some(key_id), Some(body)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DecryptionError::Malformed("missing sections"));
        };
        if version != CIPHER_FORMAT_VERSION {
            return Err(DecryptionError::Malformed("unsupported version"));
        }

        let cipher = self
            .keys
            .get(key_id)
            .ok_or_else(|| DecryptionError::UnknownKey(key_id.to_string()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| DecryptionError::Malformed("invalid base64"))?;
        if payload.len() < CIPHER_NONCE_BYTES + TAG_BYTES {
            return Err(DecryptionError::Malformed("payload too short"));
        }

        let (nonce, sealed) = payload.split_at(CIPHER_NONCE_BYTES);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| DecryptionError::AuthenticationFailed)?;

        String::from_utf8(plain).map_err(|_| DecryptionError::Malformed("path is not UTF-8"))
    }

    /// Mint a fresh anonymous identifier for a submission of `contest_id`.
    ///
    /// The identifier carries a short contest tag and a random token; nothing
    /// in it derives from the candidate. Uniqueness against stored ids is the
    /// caller's job.
    pub fn new_anonymous_id(&self, contest_id: &Uuid) -> String {
        let tag = hash_string(&contest_id.to_string())[..4].to_uppercase();
        format!(
            "ANO-{}-{}",
            tag,
            generate_secure_token(ANONYMOUS_ID_TOKEN_LENGTH)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: [u8; 32] = [7u8; 32];
    const KEY_B: [u8; 32] = [9u8; 32];

    fn cipher(active: &str) -> PathCipher {
        PathCipher::new([("a", &KEY_A[..]), ("b", &KEY_B[..])], active).unwrap()
    }

    #[test]
    fn test_generate_secure_token() {
        let token1 = generate_secure_token(32);
        let token2 = generate_secure_token(32);

        assert_eq!(token1.len(), 32);
        assert_ne!(token1, token2);
        assert!(token1.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_string() {
        assert_eq!(hash_string("test"), hash_string("test"));
        assert_ne!(hash_string("test"), hash_string("different"));
    }

    #[test]
    fn test_round_trip_restores_exact_path() {
        let cipher = cipher("a");
        for path in [
            "2026/concours/copie.pdf",
            "",
            "dossier avec espaces/épreuve écrite.docx",
            "a:b:c/with:colons.txt",
        ] {
            let sealed = cipher.encrypt(path).unwrap();
            assert_eq!(cipher.decrypt(&sealed).unwrap(), path);
        }
    }

    #[test]
    fn test_encryption_is_not_deterministic() {
        let cipher = cipher("a");
        let first = cipher.encrypt("copies/42.pdf").unwrap();
        let second = cipher.encrypt("copies/42.pdf").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_rotated_key_still_decrypts_old_ciphertexts() {
        let sealed_under_a = cipher("a").encrypt("copies/1.pdf").unwrap();
        let rotated = cipher("b");
        assert_eq!(rotated.decrypt(&sealed_under_a).unwrap(), "copies/1.pdf");
        assert!(rotated.encrypt("x").unwrap().starts_with("v1:b:"));
    }

    #[test]
    fn test_unknown_key_fails() {
        let sealed = cipher("b").encrypt("copies/1.pdf").unwrap();
        let only_a = PathCipher::new([("a", &KEY_A[..])], "a").unwrap();
        assert_eq!(
            only_a.decrypt(&sealed),
            Err(DecryptionError::UnknownKey("b".to_string()))
        );
    }

    #[test]
    fn test_malformed_and_tampered_ciphertexts_fail() {
        let cipher = cipher("a");
        assert!(matches!(
            cipher.decrypt("garbage"),
            Err(DecryptionError::Malformed(_))
        ));
        assert!(matches!(
            cipher.decrypt("v2:a:AAAA"),
            Err(DecryptionError::Malformed(_))
        ));
        assert!(matches!(
            cipher.decrypt("v1:a:!!!"),
            Err(DecryptionError::Malformed(_))
        ));

        let sealed = cipher.encrypt("copies/1.pdf").unwrap();
        let mut bytes = URL_SAFE_NO_PAD
            .decode(sealed.rsplit(':').next().unwrap())
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = format!("v1:a:{}", URL_SAFE_NO_PAD.encode(bytes));
        assert_eq!(
            cipher.decrypt(&tampered),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_key_ring_validation() {
        assert_eq!(
            PathCipher::new(std::iter::empty::<(&str, &[u8])>(), "a").unwrap_err(),
            CipherSetupError::EmptyKeyRing
        );
        assert_eq!(
            PathCipher::new([("a", &[1u8; 16][..])], "a").unwrap_err(),
            CipherSetupError::InvalidKeyLength("a".to_string())
        );
        assert_eq!(
            PathCipher::new([("a:1", &KEY_A[..])], "a:1").unwrap_err(),
            CipherSetupError::InvalidKeyId("a:1".to_string())
        );
        assert_eq!(
            PathCipher::new([("a", &KEY_A[..])], "z").unwrap_err(),
            CipherSetupError::UnknownActiveKey("z".to_string())
        );
    }

    #[test]
    fn test_anonymous_ids_are_tagged_and_distinct() {
        let cipher = cipher("a");
        let contest = Uuid::new_v4();
        let first = cipher.new_anonymous_id(&contest);
        let second = cipher.new_anonymous_id(&contest);

        assert_ne!(first, second);
        assert_eq!(first.len(), "ANO-".len() + 4 + 1 + ANONYMOUS_ID_TOKEN_LENGTH);
        assert_eq!(first[..9], second[..9]);
    }
}

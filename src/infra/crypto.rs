//! Field-level encryption for personally identifying data.
//!
//! Values are sealed with AES-256-GCM under a random 96-bit nonce and stored
//! as `base64(nonce || ciphertext || tag)`. Equality lookups go through a
//! blind index: an HMAC-SHA256 of the plaintext under a sub-key derived from
//! the encryption key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::config::{
    BLIND_INDEX_CONTEXT, DECRYPTION_ERROR_SENTINEL, ENCRYPTION_KEY_LENGTH, NONCE_LENGTH,
};
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption key must be exactly {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext is not valid base64")]
    Encoding,

    #[error("ciphertext is too short")]
    Truncated,

    #[error("ciphertext failed authentication")]
    Authentication,

    #[error("decrypted value is not valid UTF-8")]
    Utf8,

    #[error("encryption failed")]
    Encrypt,
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::internal(format!("field encryption: {}", err))
    }
}

/// Ciphertext together with its blind index, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedField {
    pub ciphertext: String,
    pub blind_index: String,
}

/// Encrypts, decrypts and blind-indexes individual fields.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
    index_mac: HmacSha256,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != ENCRYPTION_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: ENCRYPTION_KEY_LENGTH,
                actual: key.len(),
            });
        }

        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(key).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: ENCRYPTION_KEY_LENGTH,
                actual: key.len(),
            }
        })?;

        let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: ENCRYPTION_KEY_LENGTH,
                actual: key.len(),
            }
        })?;
        mac.update(BLIND_INDEX_CONTEXT);
        let index_key = mac.finalize().into_bytes();
        let index_mac = <HmacSha256 as Mac>::new_from_slice(&index_key).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: ENCRYPTION_KEY_LENGTH,
                actual: index_key.len(),
            }
        })?;

        Ok(Self { cipher, index_mac })
    }

    /// Encrypt under a fresh nonce. Two calls on the same input differ.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let blob = STANDARD.decode(encoded).map_err(|_| CryptoError::Encoding)?;
        if blob.len() < NONCE_LENGTH {
            return Err(CryptoError::Truncated);
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LENGTH);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }

    /// Deterministic lowercase-hex HMAC of the plaintext.
    pub fn blind_index(&self, plaintext: &str) -> String {
        let mut mac = self.index_mac.clone();
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedField, CryptoError> {
        Ok(SealedField {
            ciphertext: self.encrypt(plaintext)?,
            blind_index: self.blind_index(plaintext),
        })
    }

    /// Decrypt for display; corrupt values render as a sentinel.
    pub fn reveal(&self, encoded: &str) -> String {
        match self.decrypt(encoded) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!(error = %e, "Stored field could not be decrypted");
                DECRYPTION_ERROR_SENTINEL.to_string()
            }
        }
    }

    pub fn reveal_opt(&self, encoded: Option<&str>) -> Option<String> {
        encoded.map(|value| self.reveal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn cipher() -> FieldCipher {
        FieldCipher::new(KEY).unwrap()
    }

    #[test]
    fn test_rejects_wrong_key_length() {
        assert_eq!(
            FieldCipher::new(b"short").unwrap_err(),
            CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 5
            }
        );
        assert!(FieldCipher::new(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_decrypt_recovers_plaintext() {
        let c = cipher();
        let sealed = c.encrypt("3201010101010001").unwrap();
        assert_eq!(c.decrypt(&sealed).unwrap(), "3201010101010001");
    }

    #[test]
    fn test_encrypt_is_randomized() {
        let c = cipher();
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }

    #[test]
    fn test_blind_index_is_deterministic_hex() {
        let c = cipher();
        let a = c.blind_index("3201010101010001");
        assert_eq!(a, c.blind_index("3201010101010001"));
        assert_ne!(a, c.blind_index("3201010101010002"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
    }

    #[test]
    fn test_blind_index_depends_on_key() {
        let other = FieldCipher::new(b"fedcba9876543210fedcba9876543210").unwrap();
        assert_ne!(cipher().blind_index("x"), other.blind_index("x"));
    }

    #[test]
    fn test_decrypt_failures() {
        let c = cipher();
        assert_eq!(c.decrypt("not base64!!").unwrap_err(), CryptoError::Encoding);
        assert_eq!(c.decrypt(&STANDARD.encode([1u8; 4])).unwrap_err(), CryptoError::Truncated);

        let mut blob = STANDARD.decode(c.encrypt("secret").unwrap()).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert_eq!(
            c.decrypt(&STANDARD.encode(blob)).unwrap_err(),
            CryptoError::Authentication
        );
    }

    #[test]
    fn test_other_key_cannot_decrypt() {
        let sealed = cipher().encrypt("secret").unwrap();
        let other = FieldCipher::new(b"fedcba9876543210fedcba9876543210").unwrap();
        assert_eq!(other.decrypt(&sealed).unwrap_err(), CryptoError::Authentication);
    }

    #[test]
    fn test_reveal_uses_sentinel() {
        let c = cipher();
        assert_eq!(c.reveal("garbage"), DECRYPTION_ERROR_SENTINEL);
        let sealed = c.seal("3201010101010001").unwrap();
        assert_eq!(c.reveal(&sealed.ciphertext), "3201010101010001");
        assert_eq!(sealed.blind_index, c.blind_index("3201010101010001"));
    }
}

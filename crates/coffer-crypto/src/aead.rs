//! AES-256-GCM building block used by every sealing step in the crate.
//!
//! This module provides:
//! - [`seal`] — encrypt under a caller-supplied nonce, returning `ciphertext || tag`
//! - [`encrypt`] — encrypt under a fresh `OsRng` nonce, returning [`SealedData`]
//! - [`open`] / [`decrypt`] — the inverse operations, output in [`SecretBuffer`]
//!
//! Callers decide what a failed open means: the symmetric service reports it
//! as tampering, key unwrapping as an unopenable envelope, key-file loading
//! as a wrong passphrase. Here it is always [`CryptoError::Tampered`].

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use zeroize::Zeroize;

/// AES-256-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Minimum valid serialized length: nonce + empty ciphertext + tag.
const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Self-contained AES-256-GCM output.
///
/// Wire format: `nonce (12 bytes) || ciphertext (variable) || tag (16 bytes)`.
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedData {
    /// 96-bit random nonce, unique per encryption.
    pub nonce: [u8; NONCE_LEN],
    /// `ciphertext || tag`.
    pub ciphertext: Vec<u8>,
}

impl SealedData {
    /// Serialize to wire format: `nonce || ciphertext || tag`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN.saturating_add(self.ciphertext.len()));
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialize from wire format.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Tampered`] if the input is shorter than
    /// 28 bytes (nonce + empty ciphertext + tag).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_SEALED_LEN {
            return Err(CryptoError::Tampered);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

fn less_safe_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::Encryption(format!(
            "invalid key length: {} bytes (expected {KEY_LEN})",
            key.len()
        )));
    }
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` and `nonce`, returning `ciphertext || tag`.
///
/// The nonce must never repeat under the same key.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the key is not 32 bytes or the
/// primitive fails.
pub fn seal(
    plaintext: &[u8],
    key: &[u8],
    nonce: [u8; NONCE_LEN],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let key = less_safe_key(key)?;
    let mut in_out = Vec::with_capacity(plaintext.len().saturating_add(TAG_LEN));
    in_out.extend_from_slice(plaintext);
    if key
        .seal_in_place_append_tag(
            aead::Nonce::assume_unique_for_key(nonce),
            aead::Aad::from(aad),
            &mut in_out,
        )
        .is_err()
    {
        in_out.zeroize();
        return Err(CryptoError::Encryption(
            "AES-256-GCM encryption failed".into(),
        ));
    }
    Ok(in_out)
}

/// Decrypt and authenticate `ciphertext || tag`.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the key is not 32 bytes, and
/// [`CryptoError::Tampered`] if authentication fails.
pub fn open(
    ciphertext: &[u8],
    key: &[u8],
    nonce: [u8; NONCE_LEN],
    aad: &[u8],
) -> Result<SecretBuffer, CryptoError> {
    let key = less_safe_key(key)?;
    let mut in_out = ciphertext.to_vec();
    let result = match key.open_in_place(
        aead::Nonce::assume_unique_for_key(nonce),
        aead::Aad::from(aad),
        &mut in_out,
    ) {
        Ok(plaintext) => SecretBuffer::new(plaintext),
        Err(_) => Err(CryptoError::Tampered),
    };
    in_out.zeroize();
    result
}

/// Encrypt with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the key is not 32 bytes or the
/// primitive fails.
pub fn encrypt(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<SealedData, CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Entropy(format!("CSPRNG fill failed: {e}")))?;
    let ciphertext = seal(plaintext, key, nonce, aad)?;
    Ok(SealedData { nonce, ciphertext })
}

/// Decrypt [`SealedData`].
///
/// # Errors
///
/// Same as [`open`].
pub fn decrypt(sealed: &SealedData, key: &[u8], aad: &[u8]) -> Result<SecretBuffer, CryptoError> {
    open(&sealed.ciphertext, key, sealed.nonce, aad)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Passphrase-based authenticated encryption.
//!
//! [`SymmetricCryptoService`] turns `(plaintext, secret)` into a
//! [`Scheme::Symmetric`] envelope:
//!
//! 1. cipher key = SHA-256(secret)
//! 2. IV = 12 bytes from the entropy source
//! 3. ciphertext = AES-256-GCM(key, IV, plaintext), marker bound as AAD
//! 4. tag = HMAC-SHA256(secret, IV || ciphertext)
//!
//! Decryption checks the tag before the cipher runs. A mismatch never
//! reaches AES-GCM and never yields plaintext.

use ring::digest;

use crate::aead::{self, NONCE_LEN};
use crate::entropy::{OsEntropySource, SecureEntropySource};
use crate::envelope::{Envelope, Scheme};
use crate::error::CryptoError;
use crate::memory::SecretBuffer;

/// Minimum secret length, in characters.
pub const MIN_SECRET_LEN: usize = 8;

/// Passphrase-based envelope encryption.
///
/// Holds no secrets; the passphrase is supplied per call.
#[derive(Debug, Default)]
pub struct SymmetricCryptoService<E: SecureEntropySource = OsEntropySource> {
    entropy: E,
}

impl SymmetricCryptoService<OsEntropySource> {
    /// Service drawing IVs from the OS CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entropy(OsEntropySource::new())
    }
}

impl<E: SecureEntropySource> SymmetricCryptoService<E> {
    /// Service drawing IVs from `entropy`.
    pub const fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Encrypt a UTF-8 plaintext into an envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SecretTooShort`] if `secret` has fewer than
    /// [`MIN_SECRET_LEN`] characters, [`CryptoError::Entropy`] if no IV can be
    /// drawn, or [`CryptoError::Encryption`] if the cipher fails.
    pub fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CryptoError> {
        self.encrypt_bytes(plaintext.as_bytes(), secret)
    }

    /// Encrypt arbitrary bytes into an envelope string.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encrypt`].
    pub fn encrypt_bytes(&self, plaintext: &[u8], secret: &str) -> Result<String, CryptoError> {
        check_secret(secret)?;
        let key = derive_cipher_key(secret)?;

        let iv_bytes = self.entropy.next_bytes(NONCE_LEN)?;
        let iv: [u8; NONCE_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::Entropy(format!(
                "entropy source returned {} bytes (expected {NONCE_LEN})",
                iv_bytes.len()
            ))
        })?;

        let ciphertext = aead::seal(
            plaintext,
            key.expose(),
            iv,
            Scheme::Symmetric.marker().as_bytes(),
        )?;
        let envelope =
            Envelope::seal(Scheme::Symmetric, iv.to_vec(), ciphertext, secret.as_bytes());
        Ok(envelope.to_string())
    }

    /// Decrypt an envelope produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// - [`CryptoError::SecretTooShort`] for a short secret
    /// - [`CryptoError::MalformedEnvelope`] if the input is not a symmetric envelope
    /// - [`CryptoError::Tampered`] if the tag does not match (wrong secret or modified data)
    /// - [`CryptoError::InvalidArgument`] if the payload is not UTF-8 (use [`Self::decrypt_bytes`])
    pub fn decrypt(&self, envelope: &str, secret: &str) -> Result<String, CryptoError> {
        let plaintext = self.decrypt_bytes(envelope, secret)?;
        String::from_utf8(plaintext.expose().to_vec()).map_err(|_| {
            CryptoError::InvalidArgument("decrypted payload is not UTF-8 text".into())
        })
    }

    /// Decrypt an envelope into a [`SecretBuffer`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::decrypt`], minus the UTF-8 check.
    pub fn decrypt_bytes(&self, envelope: &str, secret: &str) -> Result<SecretBuffer, CryptoError> {
        check_secret(secret)?;
        let envelope = Envelope::parse(envelope, Scheme::Symmetric)?;
        let iv: [u8; NONCE_LEN] = envelope.header.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedEnvelope(format!(
                "IV is {} bytes (expected {NONCE_LEN})",
                envelope.header.len()
            ))
        })?;

        envelope.verify_mac(secret.as_bytes())?;

        let key = derive_cipher_key(secret)?;
        aead::open(
            &envelope.ciphertext,
            key.expose(),
            iv,
            Scheme::Symmetric.marker().as_bytes(),
        )
    }
}

fn check_secret(secret: &str) -> Result<(), CryptoError> {
    let len = secret.chars().count();
    if len < MIN_SECRET_LEN {
        return Err(CryptoError::SecretTooShort {
            len,
            min: MIN_SECRET_LEN,
        });
    }
    Ok(())
}

/// SHA-256 of the secret, sized for AES-256.
fn derive_cipher_key(secret: &str) -> Result<SecretBuffer, CryptoError> {
    SecretBuffer::new(digest::digest(&digest::SHA256, secret.as_bytes()).as_ref())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

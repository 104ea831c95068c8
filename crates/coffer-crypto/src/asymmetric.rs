//! Public-key envelope encryption and signing.
//!
//! [`AsymmetricCryptoService::encrypt`] produces a [`Scheme::Hybrid`]
//! envelope:
//!
//! 1. content key = 32 fresh bytes from the entropy source, used once
//! 2. wrapped key = KEM ciphertext || AES-256-GCM(encapsulated secret, content key)
//! 3. ciphertext = AES-256-GCM(content key, plaintext), marker bound as AAD
//! 4. tag = HMAC-SHA256(plaintext, wrapped key || ciphertext)
//!
//! The tag is keyed by the plaintext, so it can only be checked once the
//! payload has been decrypted. Payload authentication happens in step 3.
//!
//! Keys are acquired in stages through [`AsymmetricCryptoServiceBuilder`]:
//! the public key first, then the optional private key. If the private key
//! fails to load, the public key already parsed is released with the builder.

use std::fmt;
use std::path::{Path, PathBuf};

use data_encoding::BASE64;
use zeroize::Zeroizing;

use crate::aead::{self, SealedData};
use crate::config::KeyConfig;
use crate::entropy::{OsEntropySource, SecureEntropySource};
use crate::envelope::{Envelope, Scheme};
use crate::error::CryptoError;
use crate::kem::{self, KemCiphertext, KemPrivateKey, CIPHERTEXT_LEN};
use crate::keys::{PrivateKeyBundle, PublicKeyBundle};
use crate::memory::SecretBuffer;
use crate::signing::{self, HybridSignature};

/// AAD for the AES-256-GCM layer that wraps the content key.
const WRAP_AAD: &[u8] = b"coffer-content-key-v1";

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

enum KeySource {
    Path(PathBuf),
    Bytes(Zeroizing<Vec<u8>>),
}

impl KeySource {
    fn read(&self, which: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match self {
            Self::Path(path) => std::fs::read(path).map(Zeroizing::new).map_err(|e| {
                CryptoError::KeyLoad(format!(
                    "cannot read {which} key file {}: {e}",
                    path.display()
                ))
            }),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Staged construction of an [`AsymmetricCryptoService`].
#[derive(Default)]
pub struct AsymmetricCryptoServiceBuilder {
    public_key: Option<KeySource>,
    private_key: Option<KeySource>,
    passphrase: Option<Zeroizing<String>>,
}

impl AsymmetricCryptoServiceBuilder {
    /// Read the public key file from `path`.
    #[must_use]
    pub fn public_key_path(mut self, path: impl AsRef<Path>) -> Self {
        self.public_key = Some(KeySource::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Use an in-memory public key file.
    #[must_use]
    pub fn public_key_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.public_key = Some(KeySource::Bytes(Zeroizing::new(bytes.into())));
        self
    }

    /// Read the private key file from `path`.
    #[must_use]
    pub fn private_key_path(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(KeySource::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Use an in-memory private key file.
    #[must_use]
    pub fn private_key_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.private_key = Some(KeySource::Bytes(Zeroizing::new(bytes.into())));
        self
    }

    /// Passphrase for a protected private key. Only used while parsing.
    #[must_use]
    pub fn passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.to_string()));
        self
    }

    /// Load the configured keys.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MissingKey`] if no public key was configured
    /// - [`CryptoError::KeyLoad`] if a key file is unreadable, unparsable or
    ///   the private key does not match the public key
    /// - [`CryptoError::Passphrase`] if a protected private key cannot be unlocked
    pub fn build(self) -> Result<AsymmetricCryptoService, CryptoError> {
        self.build_with_entropy(OsEntropySource::new())
    }

    /// Like [`Self::build`], drawing content keys and nonces from `entropy`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::build`].
    pub fn build_with_entropy<E: SecureEntropySource>(
        self,
        entropy: E,
    ) -> Result<AsymmetricCryptoService<E>, CryptoError> {
        let source = self.public_key.as_ref().ok_or(CryptoError::MissingKey("public"))?;
        let public = PublicKeyBundle::from_bytes(&source.read("public")?)?;
        tracing::debug!("loaded public key from {source}");

        let private = match &self.private_key {
            Some(source) => {
                let bytes = source.read("private")?;
                let passphrase = self.passphrase.as_deref().map(String::as_str);
                let private = PrivateKeyBundle::from_bytes(&bytes, &public, passphrase)?;
                tracing::debug!("loaded private key from {source}");
                Some(private)
            }
            None => {
                if self.passphrase.is_some() {
                    tracing::warn!("passphrase supplied without a private key; ignoring it");
                }
                None
            }
        };

        Ok(AsymmetricCryptoService::with_entropy(public, private, entropy))
    }
}

impl fmt::Debug for AsymmetricCryptoServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricCryptoServiceBuilder")
            .field("public_key", &self.public_key.as_ref().map(ToString::to_string))
            .field("private_key", &self.private_key.as_ref().map(ToString::to_string))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Hybrid envelope encryption, decryption, signing and verification.
///
/// Without a private key the service can only encrypt and verify.
pub struct AsymmetricCryptoService<E: SecureEntropySource = OsEntropySource> {
    public: PublicKeyBundle,
    private: Option<PrivateKeyBundle>,
    entropy: E,
}

impl AsymmetricCryptoService<OsEntropySource> {
    /// Start building a service.
    #[must_use]
    pub fn builder() -> AsymmetricCryptoServiceBuilder {
        AsymmetricCryptoServiceBuilder::default()
    }

    /// Service over already loaded keys.
    #[must_use]
    pub fn new(public: PublicKeyBundle, private: Option<PrivateKeyBundle>) -> Self {
        Self::with_entropy(public, private, OsEntropySource::new())
    }

    /// Build from a [`KeyConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`AsymmetricCryptoServiceBuilder::build`].
    pub fn from_config(config: &KeyConfig) -> Result<Self, CryptoError> {
        let mut builder = Self::builder().public_key_path(&config.public_key);
        if let Some(path) = &config.private_key {
            builder = builder.private_key_path(path);
        }
        if let Some(passphrase) = &config.passphrase {
            builder = builder.passphrase(passphrase);
        }
        builder.build()
    }
}

impl<E: SecureEntropySource> AsymmetricCryptoService<E> {
    /// Service over already loaded keys with a custom entropy source.
    #[must_use]
    pub const fn with_entropy(
        public: PublicKeyBundle,
        private: Option<PrivateKeyBundle>,
        entropy: E,
    ) -> Self {
        Self {
            public,
            private,
            entropy,
        }
    }

    /// The loaded public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKeyBundle {
        &self.public
    }

    /// Returns `true` if decrypt and sign are available.
    #[must_use]
    pub const fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// Encrypt a UTF-8 plaintext for the loaded public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`], [`CryptoError::SecureMemory`] or
    /// [`CryptoError::Encryption`] if a primitive fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Encrypt arbitrary bytes for the loaded public key.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encrypt`].
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let content_key = SecretBuffer::from_vec(self.entropy.next_bytes(aead::KEY_LEN)?)?;
        if content_key.len() != aead::KEY_LEN {
            return Err(CryptoError::Entropy(format!(
                "entropy source returned {} bytes (expected {})",
                content_key.len(),
                aead::KEY_LEN
            )));
        }

        let (kem_ciphertext, wrapping_key) = kem::encapsulate(&self.public.kem)?;
        let key_nonce = self.nonce()?;
        let sealed_key = SealedData {
            nonce: key_nonce,
            ciphertext: aead::seal(
                content_key.expose(),
                wrapping_key.expose(),
                key_nonce,
                WRAP_AAD,
            )?,
        };
        let mut wrapped = kem_ciphertext.to_bytes();
        wrapped.extend_from_slice(&sealed_key.to_bytes());

        let payload_nonce = self.nonce()?;
        let payload = SealedData {
            nonce: payload_nonce,
            ciphertext: aead::seal(
                plaintext,
                content_key.expose(),
                payload_nonce,
                Scheme::Hybrid.marker().as_bytes(),
            )?,
        };

        let envelope = Envelope::seal(Scheme::Hybrid, wrapped, payload.to_bytes(), plaintext);
        Ok(envelope.to_string())
    }

    /// Decrypt an envelope produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MissingKey`] if no private key is loaded
    /// - [`CryptoError::MalformedEnvelope`] if the input is not a hybrid envelope
    /// - [`CryptoError::EnvelopeOpen`] if the content key cannot be unwrapped
    /// - [`CryptoError::Tampered`] if the payload or its tag fails to verify
    /// - [`CryptoError::InvalidArgument`] if the payload is not UTF-8 (use [`Self::decrypt_bytes`])
    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let plaintext = self.decrypt_bytes(envelope)?;
        String::from_utf8(plaintext.expose().to_vec()).map_err(|_| {
            CryptoError::InvalidArgument("decrypted payload is not UTF-8 text".into())
        })
    }

    /// Decrypt an envelope into a [`SecretBuffer`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::decrypt`], minus the UTF-8 check.
    pub fn decrypt_bytes(&self, envelope: &str) -> Result<SecretBuffer, CryptoError> {
        let private = self.private.as_ref().ok_or(CryptoError::MissingKey("private"))?;
        let envelope = Envelope::parse(envelope, Scheme::Hybrid)?;

        let content_key = unwrap_content_key(&envelope.header, &private.kem)?;

        let payload = SealedData::from_bytes(&envelope.ciphertext)?;
        let plaintext = aead::decrypt(
            &payload,
            content_key.expose(),
            Scheme::Hybrid.marker().as_bytes(),
        )
        .inspect_err(|_| tracing::debug!("hybrid envelope payload failed authentication"))?;

        envelope.verify_mac(plaintext.expose())?;
        Ok(plaintext)
    }

    /// Sign `plaintext`, returning a base64 signature.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if no private key is loaded, or
    /// [`CryptoError::Signature`] if signing fails.
    pub fn sign(&self, plaintext: &str) -> Result<String, CryptoError> {
        let private = self.private.as_ref().ok_or(CryptoError::MissingKey("private"))?;
        let signature = signing::sign(plaintext.as_bytes(), &private.signing)?;
        Ok(BASE64.encode(&signature.to_bytes()))
    }

    /// Check a base64 signature over `plaintext`.
    ///
    /// Undecodable or wrongly sized signatures are `Ok(false)`, like any
    /// other mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Signature`] only if verification faults internally.
    pub fn verify(&self, plaintext: &str, signature: &str) -> Result<bool, CryptoError> {
        let Ok(bytes) = BASE64.decode(signature.as_bytes()) else {
            return Ok(false);
        };
        let Some(signature) = HybridSignature::from_bytes(&bytes) else {
            return Ok(false);
        };
        signing::verify(plaintext.as_bytes(), &signature, &self.public.signing)
    }

    fn nonce(&self) -> Result<[u8; aead::NONCE_LEN], CryptoError> {
        let bytes = self.entropy.next_bytes(aead::NONCE_LEN)?;
        bytes.as_slice().try_into().map_err(|_| {
            CryptoError::Entropy(format!(
                "entropy source returned {} bytes (expected {})",
                bytes.len(),
                aead::NONCE_LEN
            ))
        })
    }
}

impl<E: SecureEntropySource> fmt::Debug for AsymmetricCryptoService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricCryptoService")
            .field("private_key_loaded", &self.private.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: SecureEntropySource> Drop for AsymmetricCryptoService<E> {
    fn drop(&mut self) {
        tracing::debug!(
            "releasing key material (private key loaded: {})",
            self.private.is_some()
        );
    }
}

/// Recover the content key from `wrapped`. Every failure is [`CryptoError::EnvelopeOpen`].
fn unwrap_content_key(
    wrapped: &[u8],
    private_key: &KemPrivateKey,
) -> Result<SecretBuffer, CryptoError> {
    if wrapped.len() < CIPHERTEXT_LEN {
        return Err(CryptoError::EnvelopeOpen);
    }
    let (kem_bytes, sealed_bytes) = wrapped.split_at(CIPHERTEXT_LEN);
    let kem_ciphertext = KemCiphertext::from_bytes(kem_bytes)?;
    let sealed_key = SealedData::from_bytes(sealed_bytes).map_err(|_| CryptoError::EnvelopeOpen)?;

    let wrapping_key = kem::decapsulate(&kem_ciphertext, private_key)?;
    let content_key = aead::decrypt(&sealed_key, wrapping_key.expose(), WRAP_AAD).map_err(|_| {
        tracing::debug!("content key could not be unwrapped");
        CryptoError::EnvelopeOpen
    })?;
    if content_key.len() != aead::KEY_LEN {
        return Err(CryptoError::EnvelopeOpen);
    }
    Ok(content_key)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

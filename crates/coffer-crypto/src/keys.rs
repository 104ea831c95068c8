//! Key pairs for [`AsymmetricCryptoService`](crate::AsymmetricCryptoService)
//! and their JSON key files.
//!
//! A key pair bundles a hybrid KEM key (envelope encryption) with a hybrid
//! signing key. Files are versioned JSON with base64 fields:
//!
//! ```text
//! public:  { "version": 1, "kem_x25519", "kem_ml_kem", "sig_ed25519", "sig_ml_dsa" }
//! private: { "version": 1, "protection": null | { "kdf", "salt", "params" }, "key" }
//! ```
//!
//! The private `key` field holds
//! `x25519 (32) || ml_kem (3168) || ed25519 seed (32) || ml_dsa (4032)`,
//! either raw or sealed as [`SealedData`] under an Argon2id-derived key.

use data_encoding::BASE64;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::aead::{self, SealedData};
use crate::error::CryptoError;
use crate::kdf::{self, Argon2idParams, MIN_SALT_LEN};
use crate::kem::{
    self, KemPrivateKey, KemPublicKey, ML_KEM_PRIVATE_KEY_LEN, X25519_PRIVATE_KEY_LEN,
};
use crate::memory::SecretBuffer;
use crate::signing::{
    self, SigningKeyPair, SigningPublicKey, ED25519_SEED_LEN, ML_DSA_65_SIGNING_KEY_LEN,
};

/// Current key file format version.
pub const KEY_FILE_VERSION: u32 = 1;

/// KDF identifier written into protected private key files.
const KDF_NAME: &str = "argon2id";

/// AAD binding a sealed private key to its purpose.
const PRIVATE_KEY_AAD: &[u8] = b"coffer-private-key-v1";

const PRIVATE_KEY_LEN: usize =
    X25519_PRIVATE_KEY_LEN + ML_KEM_PRIVATE_KEY_LEN + ED25519_SEED_LEN + ML_DSA_65_SIGNING_KEY_LEN;

// ---------------------------------------------------------------------------
// File layouts
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublicKeyFile {
    version: u32,
    kem_x25519: String,
    kem_ml_kem: String,
    sig_ed25519: String,
    sig_ml_dsa: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrivateKeyFile {
    version: u32,
    protection: Option<Protection>,
    key: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Protection {
    kdf: String,
    salt: String,
    params: Argon2idParams,
}

// ---------------------------------------------------------------------------
// Public key
// ---------------------------------------------------------------------------

/// Public half: safe to distribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyBundle {
    /// Recipient key for envelope encryption.
    pub kem: KemPublicKey,
    /// Verification key for signatures.
    pub signing: SigningPublicKey,
}

impl PublicKeyBundle {
    /// Serialize as a public key file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        let file = PublicKeyFile {
            version: KEY_FILE_VERSION,
            kem_x25519: BASE64.encode(&self.kem.x25519),
            kem_ml_kem: BASE64.encode(&self.kem.ml_kem),
            sig_ed25519: BASE64.encode(&self.signing.ed25519),
            sig_ml_dsa: BASE64.encode(&self.signing.ml_dsa),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| CryptoError::KeyLoad(format!("public key serialization failed: {e}")))
    }

    /// Parse a public key file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] if the JSON, version, encoding or any
    /// key length is wrong.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let file: PublicKeyFile = serde_json::from_str(json)
            .map_err(|e| CryptoError::KeyLoad(format!("unparsable public key file: {e}")))?;
        check_version(file.version)?;

        let kem = KemPublicKey::new(
            decode_array(&file.kem_x25519, "kem_x25519")?,
            decode_field(&file.kem_ml_kem, "kem_ml_kem")?,
        )?;
        let signing = SigningPublicKey::new(
            decode_array(&file.sig_ed25519, "sig_ed25519")?,
            decode_field(&file.sig_ml_dsa, "sig_ml_dsa")?,
        )?;
        Ok(Self { kem, signing })
    }

    /// Parse a public key file from raw bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_json`], plus [`CryptoError::KeyLoad`] for non-UTF-8 input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let json = std::str::from_utf8(bytes)
            .map_err(|_| CryptoError::KeyLoad("public key file is not UTF-8".into()))?;
        Self::from_json(json)
    }
}

// ---------------------------------------------------------------------------
// Private key
// ---------------------------------------------------------------------------

/// Private half. Every component lives in secure memory.
pub struct PrivateKeyBundle {
    pub(crate) kem: KemPrivateKey,
    pub(crate) signing: SigningKeyPair,
}

impl PrivateKeyBundle {
    /// Serialize as a private key file, sealed under `passphrase` if given.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if Argon2id rejects `params`,
    /// [`CryptoError::Entropy`] if no salt can be drawn, or
    /// [`CryptoError::KeyLoad`] if serialization fails.
    pub fn to_json(
        &self,
        passphrase: Option<&str>,
        params: &Argon2idParams,
    ) -> Result<String, CryptoError> {
        let raw = self.raw_bytes()?;

        let (protection, key) = match passphrase {
            None => (None, BASE64.encode(raw.expose())),
            Some(passphrase) => {
                let mut salt = [0u8; MIN_SALT_LEN];
                OsRng
                    .try_fill_bytes(&mut salt)
                    .map_err(|e| CryptoError::Entropy(format!("CSPRNG fill failed: {e}")))?;
                let wrapping_key = kdf::derive(passphrase.as_bytes(), &salt, params)?;
                let sealed = aead::encrypt(raw.expose(), wrapping_key.expose(), PRIVATE_KEY_AAD)?;
                let protection = Protection {
                    kdf: KDF_NAME.to_string(),
                    salt: BASE64.encode(&salt),
                    params: params.clone(),
                };
                (Some(protection), BASE64.encode(&sealed.to_bytes()))
            }
        };

        let mut file = PrivateKeyFile {
            version: KEY_FILE_VERSION,
            protection,
            key,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| CryptoError::KeyLoad(format!("private key serialization failed: {e}")));
        file.key.zeroize();
        json
    }

    /// Parse a private key file and check it belongs to `public`.
    ///
    /// A passphrase given for an unprotected file is ignored with a warning.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::Passphrase`] if the file is protected and the
    ///   passphrase is missing or wrong
    /// - [`CryptoError::KeyLoad`] if the file is unparsable or the key does
    ///   not match `public`
    /// - [`CryptoError::KeyDerivation`] if the stored Argon2id parameters are invalid
    pub fn from_json(
        json: &str,
        public: &PublicKeyBundle,
        passphrase: Option<&str>,
    ) -> Result<Self, CryptoError> {
        let file: PrivateKeyFile = serde_json::from_str(json)
            .map_err(|e| CryptoError::KeyLoad(format!("unparsable private key file: {e}")))?;
        check_version(file.version)?;

        let key = decode_field(&file.key, "key")?;
        let raw = match file.protection {
            None => {
                if passphrase.is_some() {
                    tracing::warn!("passphrase supplied for an unprotected private key; ignoring it");
                }
                SecretBuffer::from_vec(key)?
            }
            Some(protection) => {
                let Some(passphrase) = passphrase else {
                    return Err(CryptoError::Passphrase);
                };
                if protection.kdf != KDF_NAME {
                    return Err(CryptoError::KeyLoad(format!(
                        "unsupported key derivation function: {}",
                        protection.kdf
                    )));
                }
                let salt = decode_field(&protection.salt, "salt")?;
                let wrapping_key = kdf::derive(passphrase.as_bytes(), &salt, &protection.params)?;
                let sealed = SealedData::from_bytes(&key)
                    .map_err(|_| CryptoError::KeyLoad("sealed private key is truncated".into()))?;
                aead::decrypt(&sealed, wrapping_key.expose(), PRIVATE_KEY_AAD).map_err(|e| {
                    match e {
                        CryptoError::Tampered => CryptoError::Passphrase,
                        other => other,
                    }
                })?
            }
        };

        Self::from_raw(raw.expose(), public)
    }

    /// Parse a private key file from raw bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_json`], plus [`CryptoError::KeyLoad`] for non-UTF-8 input.
    pub fn from_bytes(
        bytes: &[u8],
        public: &PublicKeyBundle,
        passphrase: Option<&str>,
    ) -> Result<Self, CryptoError> {
        let json = std::str::from_utf8(bytes)
            .map_err(|_| CryptoError::KeyLoad("private key file is not UTF-8".into()))?;
        Self::from_json(json, public, passphrase)
    }

    fn from_raw(raw: &[u8], public: &PublicKeyBundle) -> Result<Self, CryptoError> {
        if raw.len() != PRIVATE_KEY_LEN {
            return Err(CryptoError::KeyLoad(format!(
                "private key is {} bytes (expected {PRIVATE_KEY_LEN})",
                raw.len()
            )));
        }
        let (x25519, rest) = raw.split_at(X25519_PRIVATE_KEY_LEN);
        let (ml_kem, rest) = rest.split_at(ML_KEM_PRIVATE_KEY_LEN);
        let (ed25519_seed, ml_dsa) = rest.split_at(ED25519_SEED_LEN);

        let kem = KemPrivateKey::from_parts(x25519, ml_kem)?;
        if !kem.matches_public(&public.kem) {
            return Err(CryptoError::KeyLoad(
                "private key does not match the public key".into(),
            ));
        }
        let signing = SigningKeyPair::from_parts(ed25519_seed, ml_dsa, public.signing.clone())?;
        Ok(Self { kem, signing })
    }

    fn raw_bytes(&self) -> Result<SecretBuffer, CryptoError> {
        let mut raw = Vec::with_capacity(PRIVATE_KEY_LEN);
        raw.extend_from_slice(self.kem.x25519.expose());
        raw.extend_from_slice(self.kem.ml_kem.expose());
        raw.extend_from_slice(self.signing.ed25519_seed.expose());
        raw.extend_from_slice(self.signing.ml_dsa_signing_key.expose());
        SecretBuffer::from_vec(raw)
    }
}

impl std::fmt::Debug for PrivateKeyBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKeyBundle(***)")
    }
}

// ---------------------------------------------------------------------------
// Key pair
// ---------------------------------------------------------------------------

/// Freshly generated public + private bundles.
#[derive(Debug)]
pub struct KeyPair {
    /// Public half.
    pub public: PublicKeyBundle,
    /// Private half.
    pub private: PrivateKeyBundle,
}

impl KeyPair {
    /// Generate a new hybrid encryption + signing key pair.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Signature`] or [`CryptoError::SecureMemory`]
    /// if key generation fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let kem_kp = kem::generate_keypair()?;
        let signing = signing::generate_keypair()?;
        tracing::debug!("generated hybrid key pair");
        Ok(Self {
            public: PublicKeyBundle {
                kem: kem_kp.public,
                signing: signing.public.clone(),
            },
            private: PrivateKeyBundle {
                kem: kem_kp.private,
                signing,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_version(version: u32) -> Result<(), CryptoError> {
    if version == KEY_FILE_VERSION {
        Ok(())
    } else {
        Err(CryptoError::KeyLoad(format!(
            "unsupported key file version {version} (expected {KEY_FILE_VERSION})"
        )))
    }
}

fn decode_field(field: &str, name: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(field.as_bytes())
        .map_err(|e| CryptoError::KeyLoad(format!("{name} is not base64: {e}")))
}

fn decode_array<const N: usize>(field: &str, name: &str) -> Result<[u8; N], CryptoError> {
    let bytes = decode_field(field, name)?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::KeyLoad(format!("{name} is {} bytes (expected {N})", bytes.len()))
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

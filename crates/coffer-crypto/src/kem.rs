//! Hybrid KEM (X25519 + ML-KEM-1024) used to wrap per-message keys.
//!
//! This module provides:
//! - [`generate_keypair`] — a fresh recipient key pair
//! - [`encapsulate`] — derive a wrapping secret for a recipient public key
//! - [`decapsulate`] — recover that secret with the recipient private key
//!
//! Both shared secrets are combined via HKDF-SHA256, so the wrapping secret
//! stays safe as long as either X25519 or ML-KEM-1024 holds.
//!
//! ML-KEM decapsulation uses implicit rejection: a wrong private key or a
//! corrupted ciphertext yields an unrelated secret, not an error. The caller
//! detects that when the AEAD-wrapped key fails to open.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::hkdf;
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// X25519 public key length in bytes.
pub const X25519_PUBLIC_KEY_LEN: usize = 32;

/// X25519 private key length in bytes.
pub const X25519_PRIVATE_KEY_LEN: usize = 32;

/// ML-KEM-1024 public key length in bytes (FIPS 203).
pub const ML_KEM_PUBLIC_KEY_LEN: usize = 1568;

/// ML-KEM-1024 private key length in bytes (FIPS 203).
pub const ML_KEM_PRIVATE_KEY_LEN: usize = 3168;

/// Leading `dk_pke` part of an ML-KEM-1024 private key. The encapsulation
/// key follows it (FIPS 203: `dk_pke || ek || H(ek) || z`).
const ML_KEM_PKE_PRIVATE_KEY_LEN: usize = 1536;

/// ML-KEM-1024 ciphertext length in bytes (FIPS 203).
pub const ML_KEM_CIPHERTEXT_LEN: usize = 1568;

/// Serialized [`KemCiphertext`] length.
pub const CIPHERTEXT_LEN: usize = X25519_PUBLIC_KEY_LEN + ML_KEM_CIPHERTEXT_LEN;

/// Combined shared secret output length in bytes.
pub const SHARED_SECRET_LEN: usize = 32;

/// ML-KEM-1024 key generation seed size (FIPS 203: d || z).
const ML_KEM_KEYGEN_SEED_LEN: usize = 64;

/// ML-KEM-1024 encapsulation randomness size.
const ML_KEM_ENCAPS_RAND_LEN: usize = 32;

/// HKDF info string for the hybrid combiner.
const HKDF_INFO: &[u8] = b"COFFER-ENVELOPE-KEM-v1";

/// Marker type for `ring::hkdf::Prk::expand`: requests 32-byte output.
struct HkdfLen32;

impl hkdf::KeyType for HkdfLen32 {
    fn len(&self) -> usize {
        SHARED_SECRET_LEN
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Recipient public key: X25519 + ML-KEM-1024.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KemPublicKey {
    /// X25519 public key.
    pub x25519: [u8; X25519_PUBLIC_KEY_LEN],
    /// ML-KEM-1024 public key.
    pub ml_kem: Vec<u8>,
}

impl KemPublicKey {
    /// Construct with length and FIPS 203 validation.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] if the ML-KEM key has the wrong
    /// length or fails public key validation.
    pub fn new(x25519: [u8; X25519_PUBLIC_KEY_LEN], ml_kem: Vec<u8>) -> Result<Self, CryptoError> {
        let parsed = ml_kem_public_key_from_bytes(&ml_kem).map_err(|_| {
            CryptoError::KeyLoad(format!(
                "invalid ML-KEM public key length: {} bytes (expected {ML_KEM_PUBLIC_KEY_LEN})",
                ml_kem.len()
            ))
        })?;
        if !libcrux_ml_kem::mlkem1024::validate_public_key(&parsed) {
            return Err(CryptoError::KeyLoad("invalid ML-KEM-1024 public key".into()));
        }
        Ok(Self { x25519, ml_kem })
    }
}

/// Recipient private key. Both halves live in [`SecretBuffer`]s.
pub struct KemPrivateKey {
    pub(crate) x25519: SecretBuffer,
    pub(crate) ml_kem: SecretBuffer,
}

impl KemPrivateKey {
    /// Construct from raw halves, validating lengths.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] on a length mismatch.
    pub fn from_parts(x25519: &[u8], ml_kem: &[u8]) -> Result<Self, CryptoError> {
        if x25519.len() != X25519_PRIVATE_KEY_LEN {
            return Err(CryptoError::KeyLoad(format!(
                "invalid X25519 private key length: {} bytes (expected {X25519_PRIVATE_KEY_LEN})",
                x25519.len()
            )));
        }
        if ml_kem.len() != ML_KEM_PRIVATE_KEY_LEN {
            return Err(CryptoError::KeyLoad(format!(
                "invalid ML-KEM private key length: {} bytes (expected {ML_KEM_PRIVATE_KEY_LEN})",
                ml_kem.len()
            )));
        }
        Ok(Self {
            x25519: SecretBuffer::new(x25519)?,
            ml_kem: SecretBuffer::new(ml_kem)?,
        })
    }

    /// X25519 public key matching this private key.
    #[must_use]
    pub(crate) fn x25519_public(&self) -> [u8; X25519_PUBLIC_KEY_LEN] {
        let mut sk = [0u8; X25519_PRIVATE_KEY_LEN];
        sk.copy_from_slice(self.x25519.expose());
        let secret = x25519_dalek::StaticSecret::from(sk);
        sk.zeroize();
        x25519_dalek::PublicKey::from(&secret).to_bytes()
    }

    /// ML-KEM encapsulation key stored inside the decapsulation key.
    fn ml_kem_public(&self) -> &[u8] {
        self.ml_kem
            .expose()
            .get(ML_KEM_PKE_PRIVATE_KEY_LEN..ML_KEM_PKE_PRIVATE_KEY_LEN + ML_KEM_PUBLIC_KEY_LEN)
            .unwrap_or_default()
    }

    /// Returns `true` if both halves belong to `public`.
    #[must_use]
    pub(crate) fn matches_public(&self, public: &KemPublicKey) -> bool {
        self.x25519_public() == public.x25519 && self.ml_kem_public() == public.ml_kem.as_slice()
    }
}

impl std::fmt::Debug for KemPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KemPrivateKey(***)")
    }
}

/// Encapsulation output: ephemeral X25519 public key + ML-KEM ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KemCiphertext {
    /// Sender's ephemeral X25519 public key.
    pub x25519_public: [u8; X25519_PUBLIC_KEY_LEN],
    /// ML-KEM-1024 ciphertext.
    pub ml_kem_ciphertext: Vec<u8>,
}

impl KemCiphertext {
    /// `x25519_public || ml_kem_ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CIPHERTEXT_LEN);
        out.extend_from_slice(&self.x25519_public);
        out.extend_from_slice(&self.ml_kem_ciphertext);
        out
    }

    /// Parse exactly [`CIPHERTEXT_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EnvelopeOpen`] on a length mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != CIPHERTEXT_LEN {
            return Err(CryptoError::EnvelopeOpen);
        }
        let (x25519, ml_kem) = bytes.split_at(X25519_PUBLIC_KEY_LEN);
        let mut x25519_public = [0u8; X25519_PUBLIC_KEY_LEN];
        x25519_public.copy_from_slice(x25519);
        Ok(Self {
            x25519_public,
            ml_kem_ciphertext: ml_kem.to_vec(),
        })
    }
}

/// Public + private halves.
pub struct KemKeyPair {
    /// Public key (safe to share).
    pub public: KemPublicKey,
    /// Private key (must be kept secret).
    pub private: KemPrivateKey,
}

impl std::fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KemKeyPair(***)")
    }
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Generate a hybrid X25519 + ML-KEM-1024 key pair.
///
/// # Errors
///
/// Returns [`CryptoError::SecureMemory`] if secure buffer allocation fails.
pub fn generate_keypair() -> Result<KemKeyPair, CryptoError> {
    let x25519_secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
    let x25519_public = x25519_dalek::PublicKey::from(&x25519_secret);

    let mut x25519_sk_bytes = x25519_secret.to_bytes();
    let x25519_sk_buf = SecretBuffer::new(&x25519_sk_bytes);
    x25519_sk_bytes.zeroize();
    let x25519_sk_buf = x25519_sk_buf?;

    let mut ml_kem_seed = [0u8; ML_KEM_KEYGEN_SEED_LEN];
    OsRng.fill_bytes(&mut ml_kem_seed);
    let ml_kem_kp = libcrux_ml_kem::mlkem1024::generate_key_pair(ml_kem_seed);
    ml_kem_seed.zeroize();

    let ml_kem_pub_raw: &[u8] = ml_kem_kp.pk();
    let ml_kem_sec_raw: &[u8] = ml_kem_kp.sk();
    let ml_kem_sk_buf = SecretBuffer::new(ml_kem_sec_raw)?;

    Ok(KemKeyPair {
        public: KemPublicKey {
            x25519: x25519_public.to_bytes(),
            ml_kem: ml_kem_pub_raw.to_vec(),
        },
        private: KemPrivateKey {
            x25519: x25519_sk_buf,
            ml_kem: ml_kem_sk_buf,
        },
    })
}

// ---------------------------------------------------------------------------
// Encapsulation
// ---------------------------------------------------------------------------

/// Derive a fresh wrapping secret for `recipient`.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the recipient key is invalid or
/// HKDF fails.
pub fn encapsulate(
    recipient: &KemPublicKey,
) -> Result<(KemCiphertext, SecretBuffer), CryptoError> {
    let ml_kem_pk = ml_kem_public_key_from_bytes(&recipient.ml_kem)?;
    if !libcrux_ml_kem::mlkem1024::validate_public_key(&ml_kem_pk) {
        return Err(CryptoError::Encryption("invalid ML-KEM-1024 public key".into()));
    }

    let ephemeral_secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral_secret);
    let x25519_shared =
        ephemeral_secret.diffie_hellman(&x25519_dalek::PublicKey::from(recipient.x25519));

    let mut ml_kem_rand = [0u8; ML_KEM_ENCAPS_RAND_LEN];
    OsRng.fill_bytes(&mut ml_kem_rand);
    let (ml_kem_ct, ml_kem_ss) = libcrux_ml_kem::mlkem1024::encapsulate(&ml_kem_pk, ml_kem_rand);
    ml_kem_rand.zeroize();

    let combined = combine_shared_secrets(x25519_shared.as_bytes(), &ml_kem_ss)?;

    let ciphertext = KemCiphertext {
        x25519_public: ephemeral_public.to_bytes(),
        ml_kem_ciphertext: ml_kem_ct.as_ref().to_vec(),
    };
    Ok((ciphertext, combined))
}

// ---------------------------------------------------------------------------
// Decapsulation
// ---------------------------------------------------------------------------

/// Recover the wrapping secret from `ciphertext` with `private_key`.
///
/// # Errors
///
/// Returns [`CryptoError::EnvelopeOpen`] if the ciphertext is malformed, and
/// [`CryptoError::Encryption`] if the stored private key is unusable.
pub fn decapsulate(
    ciphertext: &KemCiphertext,
    private_key: &KemPrivateKey,
) -> Result<SecretBuffer, CryptoError> {
    let mut sk_arr = [0u8; X25519_PRIVATE_KEY_LEN];
    sk_arr.copy_from_slice(private_key.x25519.expose());
    let x25519_secret = x25519_dalek::StaticSecret::from(sk_arr);
    sk_arr.zeroize();

    let x25519_shared =
        x25519_secret.diffie_hellman(&x25519_dalek::PublicKey::from(ciphertext.x25519_public));

    let ml_kem_sk = libcrux_ml_kem::mlkem1024::MlKem1024PrivateKey::try_from(
        private_key.ml_kem.expose(),
    )
    .map_err(|_| CryptoError::Encryption("stored ML-KEM private key is unusable".into()))?;
    let ml_kem_ct = libcrux_ml_kem::mlkem1024::MlKem1024Ciphertext::try_from(
        ciphertext.ml_kem_ciphertext.as_slice(),
    )
    .map_err(|_| CryptoError::EnvelopeOpen)?;

    let ml_kem_shared = libcrux_ml_kem::mlkem1024::decapsulate(&ml_kem_sk, &ml_kem_ct);

    combine_shared_secrets(x25519_shared.as_bytes(), &ml_kem_shared)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// HKDF-SHA256 over `x25519_ss || ml_kem_ss`, empty salt, [`HKDF_INFO`].
fn combine_shared_secrets(
    x25519_ss: &[u8; SHARED_SECRET_LEN],
    ml_kem_ss: &[u8; SHARED_SECRET_LEN],
) -> Result<SecretBuffer, CryptoError> {
    let mut combined = [0u8; SHARED_SECRET_LEN * 2];
    combined[..SHARED_SECRET_LEN].copy_from_slice(x25519_ss);
    combined[SHARED_SECRET_LEN..].copy_from_slice(ml_kem_ss);

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]).extract(&combined);
    combined.zeroize();

    let okm = prk
        .expand(&[HKDF_INFO], HkdfLen32)
        .map_err(|_| CryptoError::Encryption("HKDF expand failed".into()))?;
    let mut output = [0u8; SHARED_SECRET_LEN];
    okm.fill(&mut output)
        .map_err(|_| CryptoError::Encryption("HKDF fill failed".into()))?;

    let result = SecretBuffer::new(&output);
    output.zeroize();
    result
}

fn ml_kem_public_key_from_bytes(
    bytes: &[u8],
) -> Result<libcrux_ml_kem::mlkem1024::MlKem1024PublicKey, CryptoError> {
    libcrux_ml_kem::mlkem1024::MlKem1024PublicKey::try_from(bytes).map_err(|_| {
        CryptoError::Encryption(format!(
            "invalid ML-KEM public key length: {} bytes (expected {ML_KEM_PUBLIC_KEY_LEN})",
            bytes.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Hybrid signing: Ed25519 + ML-DSA-65.
//!
//! This module provides:
//! - [`generate_keypair`] — a fresh hybrid signing key pair
//! - [`sign`] — both signatures over a message
//! - [`verify`] — `true` only if both signatures hold
//!
//! A signature travels as `ed25519 (64 bytes) || ml_dsa (3309 bytes)`; see
//! [`HybridSignature::to_bytes`]. ML-DSA-65 signs with the context
//! `b"COFFER-HYBRID-SIG-v1"`. Ed25519 (via `ring`) takes no context.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::signature::{self, Ed25519KeyPair, KeyPair};
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ed25519 public key length in bytes.
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 seed (private key) length in bytes.
pub const ED25519_SEED_LEN: usize = 32;

/// Ed25519 signature length in bytes.
pub const ED25519_SIGNATURE_LEN: usize = 64;

/// ML-DSA-65 verification key length in bytes (FIPS 204).
pub const ML_DSA_65_VERIFICATION_KEY_LEN: usize = 1952;

/// ML-DSA-65 signing key length in bytes (FIPS 204).
pub const ML_DSA_65_SIGNING_KEY_LEN: usize = 4032;

/// ML-DSA-65 signature length in bytes (FIPS 204).
pub const ML_DSA_65_SIGNATURE_LEN: usize = 3309;

/// Serialized [`HybridSignature`] length.
pub const SIGNATURE_LEN: usize = ED25519_SIGNATURE_LEN + ML_DSA_65_SIGNATURE_LEN;

const ML_DSA_KEYGEN_RAND_LEN: usize = 32;

const ML_DSA_SIGN_RAND_LEN: usize = 32;

/// ML-DSA context string for domain separation.
const ML_DSA_CONTEXT: &[u8] = b"COFFER-HYBRID-SIG-v1";

/// Signed and verified once when a key pair is reassembled from parts.
const KEY_CHECK_MESSAGE: &[u8] = b"coffer signing key check";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Signer's public key: Ed25519 + ML-DSA-65.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningPublicKey {
    /// Ed25519 public key.
    pub ed25519: [u8; ED25519_PUBLIC_KEY_LEN],
    /// ML-DSA-65 verification key.
    pub ml_dsa: Vec<u8>,
}

impl SigningPublicKey {
    /// Construct with length validation.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] if the ML-DSA verification key is not
    /// exactly [`ML_DSA_65_VERIFICATION_KEY_LEN`] bytes.
    pub fn new(
        ed25519: [u8; ED25519_PUBLIC_KEY_LEN],
        ml_dsa: Vec<u8>,
    ) -> Result<Self, CryptoError> {
        if ml_dsa.len() != ML_DSA_65_VERIFICATION_KEY_LEN {
            return Err(CryptoError::KeyLoad(format!(
                "invalid ML-DSA verification key length: {} bytes (expected {ML_DSA_65_VERIFICATION_KEY_LEN})",
                ml_dsa.len()
            )));
        }
        Ok(Self { ed25519, ml_dsa })
    }
}

/// Signing key pair. Private halves live in [`SecretBuffer`]s.
///
/// Deliberately not `Serialize`; key files go through [`crate::keys`].
pub struct SigningKeyPair {
    pub(crate) ed25519_seed: SecretBuffer,
    pub(crate) ml_dsa_signing_key: SecretBuffer,
    /// Public key (safe to share).
    pub public: SigningPublicKey,
}

impl SigningKeyPair {
    /// Rebuild a key pair from stored private halves and its public key.
    ///
    /// The Ed25519 seed must produce `public.ed25519`; a mismatch means the
    /// private key file belongs to another public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] on a length or consistency mismatch.
    pub fn from_parts(
        ed25519_seed: &[u8],
        ml_dsa_signing_key: &[u8],
        public: SigningPublicKey,
    ) -> Result<Self, CryptoError> {
        if ml_dsa_signing_key.len() != ML_DSA_65_SIGNING_KEY_LEN {
            return Err(CryptoError::KeyLoad(format!(
                "invalid ML-DSA signing key length: {} bytes (expected {ML_DSA_65_SIGNING_KEY_LEN})",
                ml_dsa_signing_key.len()
            )));
        }
        Ed25519KeyPair::from_seed_and_public_key(ed25519_seed, &public.ed25519).map_err(|_| {
            CryptoError::KeyLoad("private key does not match the public key".into())
        })?;
        let keypair = Self {
            ed25519_seed: SecretBuffer::new(ed25519_seed)?,
            ml_dsa_signing_key: SecretBuffer::new(ml_dsa_signing_key)?,
            public,
        };

        // ML-DSA keys carry no cheap consistency check; sign once and verify.
        let matches = sign(KEY_CHECK_MESSAGE, &keypair)
            .and_then(|sig| verify(KEY_CHECK_MESSAGE, &sig, &keypair.public))
            .unwrap_or(false);
        if !matches {
            tracing::debug!("ML-DSA signing key failed the sign/verify check");
            return Err(CryptoError::KeyLoad(
                "private key does not match the public key".into(),
            ));
        }
        Ok(keypair)
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKeyPair(***)")
    }
}

/// Ed25519 + ML-DSA-65 signature pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HybridSignature {
    /// Ed25519 signature.
    pub ed25519: Vec<u8>,
    /// ML-DSA-65 signature.
    pub ml_dsa: Vec<u8>,
}

impl HybridSignature {
    /// `ed25519 || ml_dsa`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNATURE_LEN);
        out.extend_from_slice(&self.ed25519);
        out.extend_from_slice(&self.ml_dsa);
        out
    }

    /// Split a serialized signature. `None` unless exactly [`SIGNATURE_LEN`] bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return None;
        }
        let (ed25519, ml_dsa) = bytes.split_at(ED25519_SIGNATURE_LEN);
        Some(Self {
            ed25519: ed25519.to_vec(),
            ml_dsa: ml_dsa.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Generate a hybrid Ed25519 + ML-DSA-65 signing key pair.
///
/// # Errors
///
/// Returns [`CryptoError::Signature`] if Ed25519 key generation fails, or
/// [`CryptoError::SecureMemory`] if a secure buffer cannot be allocated.
pub fn generate_keypair() -> Result<SigningKeyPair, CryptoError> {
    let mut ed25519_seed_bytes = [0u8; ED25519_SEED_LEN];
    OsRng.fill_bytes(&mut ed25519_seed_bytes);

    let ed25519_kp = Ed25519KeyPair::from_seed_unchecked(&ed25519_seed_bytes).map_err(|e| {
        ed25519_seed_bytes.zeroize();
        CryptoError::Signature(format!("Ed25519 key generation failed: {e}"))
    })?;

    let mut ed25519_pk = [0u8; ED25519_PUBLIC_KEY_LEN];
    ed25519_pk.copy_from_slice(ed25519_kp.public_key().as_ref());

    let ed25519_seed_buf = SecretBuffer::new(&ed25519_seed_bytes);
    ed25519_seed_bytes.zeroize();
    let ed25519_seed_buf = ed25519_seed_buf?;

    let mut ml_dsa_keygen_rand = [0u8; ML_DSA_KEYGEN_RAND_LEN];
    OsRng.fill_bytes(&mut ml_dsa_keygen_rand);
    let ml_dsa_kp = libcrux_ml_dsa::ml_dsa_65::generate_key_pair(ml_dsa_keygen_rand);
    ml_dsa_keygen_rand.zeroize();

    // libcrux key types are not Zeroize; the SecretBuffer copy is the one we keep.
    let ml_dsa_sk_buf = SecretBuffer::new(ml_dsa_kp.signing_key.as_slice())?;

    Ok(SigningKeyPair {
        ed25519_seed: ed25519_seed_buf,
        ml_dsa_signing_key: ml_dsa_sk_buf,
        public: SigningPublicKey {
            ed25519: ed25519_pk,
            ml_dsa: ml_dsa_kp.verification_key.as_ref().to_vec(),
        },
    })
}

// ---------------------------------------------------------------------------
// Sign
// ---------------------------------------------------------------------------

/// Sign `message` with both algorithms.
///
/// Ed25519 is deterministic; ML-DSA-65 draws fresh randomness per call.
///
/// # Errors
///
/// Returns [`CryptoError::Signature`] if either signing operation fails.
pub fn sign(message: &[u8], keypair: &SigningKeyPair) -> Result<HybridSignature, CryptoError> {
    let ed25519_kp = Ed25519KeyPair::from_seed_and_public_key(
        keypair.ed25519_seed.expose(),
        &keypair.public.ed25519,
    )
    .map_err(|e| CryptoError::Signature(format!("Ed25519 key reconstruction failed: {e}")))?;
    let ed25519_sig = ed25519_kp.sign(message).as_ref().to_vec();

    let ml_dsa_sk_arr: [u8; ML_DSA_65_SIGNING_KEY_LEN] = keypair
        .ml_dsa_signing_key
        .expose()
        .try_into()
        .map_err(|_| CryptoError::Signature("ML-DSA signing key has invalid length".into()))?;
    let ml_dsa_sk = libcrux_ml_dsa::ml_dsa_65::MLDSA65SigningKey::new(ml_dsa_sk_arr);

    let mut ml_dsa_sign_rand = [0u8; ML_DSA_SIGN_RAND_LEN];
    OsRng.fill_bytes(&mut ml_dsa_sign_rand);
    let ml_dsa_result =
        libcrux_ml_dsa::ml_dsa_65::sign(&ml_dsa_sk, message, ML_DSA_CONTEXT, ml_dsa_sign_rand);
    ml_dsa_sign_rand.zeroize();
    let ml_dsa_sig = ml_dsa_result
        .map_err(|e| CryptoError::Signature(format!("ML-DSA signing failed: {e:?}")))?;

    Ok(HybridSignature {
        ed25519: ed25519_sig,
        ml_dsa: ml_dsa_sig.as_ref().to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Check both signatures over `message`.
///
/// Ed25519 is checked first. A signature that does not match is `Ok(false)`.
///
/// # Errors
///
/// Returns [`CryptoError::Signature`] only if the public key itself is
/// unusable, which [`SigningPublicKey::new`] rules out.
pub fn verify(
    message: &[u8],
    sig: &HybridSignature,
    public_key: &SigningPublicKey,
) -> Result<bool, CryptoError> {
    let ed25519_pk = signature::UnparsedPublicKey::new(&signature::ED25519, &public_key.ed25519);
    if ed25519_pk.verify(message, &sig.ed25519).is_err() {
        return Ok(false);
    }

    let ml_dsa_vk_arr: &[u8; ML_DSA_65_VERIFICATION_KEY_LEN] =
        public_key.ml_dsa.as_slice().try_into().map_err(|_| {
            CryptoError::Signature(format!(
                "invalid ML-DSA verification key length: {} bytes (expected {ML_DSA_65_VERIFICATION_KEY_LEN})",
                public_key.ml_dsa.len()
            ))
        })?;
    let ml_dsa_vk = libcrux_ml_dsa::ml_dsa_65::MLDSA65VerificationKey::new(*ml_dsa_vk_arr);

    let Ok(ml_dsa_sig_arr) = <&[u8; ML_DSA_65_SIGNATURE_LEN]>::try_from(sig.ml_dsa.as_slice())
    else {
        return Ok(false);
    };
    let ml_dsa_sig = libcrux_ml_dsa::ml_dsa_65::MLDSA65Signature::new(*ml_dsa_sig_arr);

    Ok(libcrux_ml_dsa::ml_dsa_65::verify(&ml_dsa_vk, message, ML_DSA_CONTEXT, &ml_dsa_sig).is_ok())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Secure entropy sources.
//!
//! [`SecureEntropySource`] is the seam between the crate and the platform
//! CSPRNG. [`OsEntropySource`] is the production implementation: it draws from
//! `OsRng` and, when configured with a seed file, mixes that file's content
//! into every draw through BLAKE3 in derive-key mode. Mixing can only add
//! entropy; a weak or empty seed file never weakens the OS bytes.

use std::fmt;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::config::EntropyConfig;
use crate::error::CryptoError;
use crate::memory::SecretBuffer;

/// BLAKE3 derive-key context for seed-file mixing.
const MIX_CONTEXT: &str = "coffer-crypto 2024 entropy seed-file mix v1";

/// Supplier of cryptographically secure random bytes.
pub trait SecureEntropySource: Send + Sync {
    /// Return exactly `len` secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if the source is unavailable.
    fn next_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError>;
}

/// OS CSPRNG, optionally mixed with an external seed.
#[derive(Default)]
pub struct OsEntropySource {
    seed: Option<SecretBuffer>,
}

impl OsEntropySource {
    /// Plain OS CSPRNG, no seed mixing.
    #[must_use]
    pub fn new() -> Self {
        tracing::debug!("entropy source: OS CSPRNG");
        Self { seed: None }
    }

    /// Mix the given seed bytes into every draw.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SecureMemory` if the seed cannot be stored.
    pub fn with_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        tracing::debug!("entropy source: OS CSPRNG mixed with {} seed bytes", seed.len());
        Ok(Self {
            seed: Some(SecretBuffer::new(seed)?),
        })
    }

    /// Read `path` once and mix its content into every draw.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if the seed file cannot be read.
    pub fn with_seed_file(path: &Path) -> Result<Self, CryptoError> {
        let bytes = std::fs::read(path).map_err(|e| {
            CryptoError::Entropy(format!("cannot read seed file {}: {e}", path.display()))
        })?;
        let seed = SecretBuffer::from_vec(bytes)?;
        tracing::debug!(
            "entropy source: OS CSPRNG mixed with seed file {} ({} bytes)",
            path.display(),
            seed.len()
        );
        Ok(Self { seed: Some(seed) })
    }

    /// Build from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if a configured seed file is unreadable.
    pub fn from_config(config: &EntropyConfig) -> Result<Self, CryptoError> {
        match &config.seed_file {
            Some(path) => Self::with_seed_file(path),
            None => Ok(Self::new()),
        }
    }

    /// Returns `true` if a seed is mixed into every draw.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.seed.is_some()
    }
}

impl SecureEntropySource for OsEntropySource {
    fn next_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut os_bytes = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut os_bytes)
            .map_err(|e| CryptoError::Entropy(format!("CSPRNG fill failed: {e}")))?;

        let Some(seed) = &self.seed else {
            return Ok(os_bytes);
        };

        let mut hasher = blake3::Hasher::new_derive_key(MIX_CONTEXT);
        hasher.update(seed.expose());
        hasher.update(&os_bytes);
        os_bytes.zeroize();

        let mut out = vec![0u8; len];
        hasher.finalize_xof().fill(&mut out);
        Ok(out)
    }
}

impl fmt::Debug for OsEntropySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsEntropySource")
            .field("seeded", &self.is_seeded())
            .finish()
    }
}

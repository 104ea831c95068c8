//! Argon2id derivation for passphrase-protected private key files.
//!
//! This module provides:
//! - [`derive`] — derive a 256-bit key from a passphrase + salt
//! - [`Argon2idParams`] — serializable parameter set (stored in the key file)
//! - [`KdfPreset`] — Interactive / Moderate / Sensitive defaults

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Output length of the KDF in bytes (256 bits).
const OUTPUT_LEN: usize = 32;

/// Minimum salt length in bytes. We enforce 16 (stricter than argon2's 8).
pub const MIN_SALT_LEN: usize = 16;

/// Argon2id parameter set, stored alongside the protected key.
///
/// Fields use the `argon2` crate convention:
/// - `m_cost`: memory in KiB (NOT bytes, NOT MB)
/// - `t_cost`: number of iterations
/// - `p_cost`: degree of parallelism
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2idParams {
    /// Memory cost in kibibytes.
    pub m_cost: u32,
    /// Number of iterations (time cost).
    pub t_cost: u32,
    /// Degree of parallelism (number of lanes).
    pub p_cost: u32,
}

impl Default for Argon2idParams {
    fn default() -> Self {
        KdfPreset::Moderate.params()
    }
}

/// KDF preset selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfPreset {
    /// 64 MB, 2 passes. Keys loaded on every request.
    Interactive,
    /// 256 MB, 3 passes. Keys loaded once per process.
    Moderate,
    /// 512 MB, 4 passes. Offline or rarely used keys.
    Sensitive,
}

impl KdfPreset {
    /// Parameters for this preset.
    #[must_use]
    pub const fn params(self) -> Argon2idParams {
        match self {
            Self::Interactive => Argon2idParams {
                m_cost: 65_536,
                t_cost: 2,
                p_cost: 1,
            },
            Self::Moderate => Argon2idParams {
                m_cost: 262_144,
                t_cost: 3,
                p_cost: 4,
            },
            Self::Sensitive => Argon2idParams {
                m_cost: 524_288,
                t_cost: 4,
                p_cost: 4,
            },
        }
    }
}

/// Derive a 256-bit key from a passphrase and salt using Argon2id.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` if:
/// - The salt is shorter than 16 bytes
/// - The argon2 parameters are invalid
/// - The derivation itself fails (e.g., memory allocation)
pub fn derive(
    passphrase: &[u8],
    salt: &[u8],
    params: &Argon2idParams,
) -> Result<SecretBuffer, CryptoError> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {MIN_SALT_LEN})",
            salt.len()
        )));
    }

    let argon2_params = argon2::Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; OUTPUT_LEN];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2id derivation failed: {e}")))?;

    let result = SecretBuffer::new(&output);
    output.zeroize();
    result
}

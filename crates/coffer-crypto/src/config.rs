//! JSON configuration for the entropy source and the asymmetric service.
//!
//! ```json
//! {
//!   "entropy": { "seed_file": "/etc/coffer/seed" },
//!   "keys": {
//!     "public_key": "/etc/coffer/public.json",
//!     "private_key": "/etc/coffer/private.json",
//!     "passphrase": "..."
//!   }
//! }
//! ```
//!
//! Every section is optional. Paths are used as given; relative paths resolve
//! against the process working directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CryptoConfig {
    /// Entropy source settings.
    pub entropy: EntropyConfig,
    /// Key files for [`AsymmetricCryptoService`](crate::AsymmetricCryptoService).
    pub keys: Option<KeyConfig>,
}

impl CryptoConfig {
    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Config`] if the JSON is invalid or has unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::Config(format!("invalid config: {e}")))
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, CryptoError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CryptoError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        tracing::debug!("loading crypto config from {}", path.display());
        Self::from_json_str(&json)
    }
}

/// Entropy source settings.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntropyConfig {
    /// File whose contents are mixed into every entropy draw.
    pub seed_file: Option<PathBuf>,
}

/// Key file locations and the private key passphrase.
///
/// The passphrase is zeroized on drop and never printed.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Public key file (required).
    #[zeroize(skip)]
    pub public_key: PathBuf,
    /// Private key file, needed for decrypt and sign.
    #[zeroize(skip)]
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    /// Passphrase for a protected private key file.
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

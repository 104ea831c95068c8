//! Cryptographic error types for `coffer-crypto`.

use thiserror::Error;

/// Coarse classification of a [`CryptoError`].
///
/// Callers use this to decide who hears about a failure: a developer
/// (misuse), an operator (environment) or the end user (validation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The API was called incorrectly: malformed envelope, bad argument,
    /// missing key for the requested operation.
    Misuse,
    /// The platform or a primitive failed: unreadable key files, entropy
    /// exhaustion, internal seal/open/sign faults.
    Environment,
    /// The input failed an integrity or credential check: tag mismatch,
    /// wrong passphrase, secret too short.
    Validation,
}

/// Errors produced by the random generator and the crypto services.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Argument outside its documented domain (zero length, empty alphabet,
    /// inverted range).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input is not an envelope of the expected scheme.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Operation needs a key that was not loaded into the service.
    #[error("no {0} key loaded")]
    MissingKey(&'static str),

    /// Secret passphrase is shorter than the accepted minimum.
    #[error("secret key too short: {len} characters (minimum {min})")]
    SecretTooShort {
        /// Length of the rejected secret, in characters.
        len: usize,
        /// Minimum accepted length, in characters.
        min: usize,
    },

    /// Integrity tag mismatch: the envelope was modified or the key is wrong.
    #[error("integrity check failed: data was tampered with or the key is wrong")]
    Tampered,

    /// Private key passphrase is wrong or missing.
    #[error("private key passphrase is wrong or missing")]
    Passphrase,

    /// The secure entropy source could not deliver bytes.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// Key file missing, unreadable, unparsable or inconsistent.
    #[error("key load error: {0}")]
    KeyLoad(String),

    /// Argon2id derivation failed (parameter validation, memory allocation).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric primitive failure while sealing.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// The wrapped per-message key could not be recovered.
    #[error("could not open envelope")]
    EnvelopeOpen,

    /// Signature creation failed, or verification faulted internally.
    #[error("signature error: {0}")]
    Signature(String),

    /// Secure memory allocation failure.
    #[error("secure memory error: {0}")]
    SecureMemory(String),

    /// Configuration file missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CryptoError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::MalformedEnvelope(_) | Self::MissingKey(_) => {
                ErrorKind::Misuse
            }
            Self::SecretTooShort { .. } | Self::Tampered | Self::Passphrase => {
                ErrorKind::Validation
            }
            Self::Entropy(_)
            | Self::KeyLoad(_)
            | Self::KeyDerivation(_)
            | Self::Encryption(_)
            | Self::EnvelopeOpen
            | Self::Signature(_)
            | Self::SecureMemory(_)
            | Self::Config(_) => ErrorKind::Environment,
        }
    }
}

//! `coffer-crypto` — random generation and envelope cryptography for coffer.
//!
//! Three services sit on top of a small set of primitives:
//! - [`RandomGenerator`] — fast random integers and strings, seeded once
//!   from a [`SecureEntropySource`]
//! - [`SymmetricCryptoService`] — passphrase envelopes with an integrity tag
//! - [`AsymmetricCryptoService`] — hybrid public-key envelopes and signatures
//!
//! No async, no network. Key material lives in [`SecretBuffer`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod config;
pub mod entropy;
pub mod random;

pub mod aead;
pub mod envelope;
pub mod symmetric;

pub mod kdf;
pub mod kem;
pub mod signing;

pub mod asymmetric;
pub mod keys;

pub use asymmetric::{AsymmetricCryptoService, AsymmetricCryptoServiceBuilder};
pub use config::{CryptoConfig, EntropyConfig, KeyConfig};
pub use entropy::{OsEntropySource, SecureEntropySource};
pub use envelope::{Envelope, Scheme};
pub use error::{CryptoError, ErrorKind};
pub use kdf::{Argon2idParams, KdfPreset};
pub use keys::{KeyPair, PrivateKeyBundle, PublicKeyBundle};
pub use memory::SecretBuffer;
pub use random::{Alphabet, RandomGenerator, RAND_MAX};
pub use symmetric::{SymmetricCryptoService, MIN_SECRET_LEN};

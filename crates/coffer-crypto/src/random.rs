//! Fast random integers and random strings.
//!
//! This module provides:
//! - [`RandomGenerator`] — a fast, non-cryptographic generator seeded once
//!   from a [`SecureEntropySource`]
//! - [`Alphabet`] — named character presets or a caller-supplied set
//!
//! # Seeding
//!
//! The first draw on a generator takes exactly 4 bytes from the entropy
//! source, reads them as a little-endian `u32`, shifts the value into the
//! signed 32-bit range and seeds a `SmallRng` with it. The generator never
//! reseeds. The check-and-set happens under the generator's lock, so a
//! generator shared between threads still seeds exactly once.
//!
//! Output is NOT suitable for key material; the services draw IVs and keys
//! from the entropy source directly.

use std::sync::{Mutex, MutexGuard};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::entropy::{OsEntropySource, SecureEntropySource};
use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest value returned by [`RandomGenerator::random`].
pub const RAND_MAX: i64 = i32::MAX as i64;

/// Number of entropy bytes consumed by the one-time seeding.
pub const SEED_LEN: usize = 4;

/// Offset that maps an unsigned 32-bit draw onto the signed 32-bit range.
const SIGNED_OFFSET: i64 = 1 << 31;

const BASE64: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const ALPHANUMERIC: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE56: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz";
const ALPHA: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const HEXADECIMAL: &str = "0123456789abcdef";
const NUMERIC: &str = "0123456789";

// ---------------------------------------------------------------------------
// Alphabet
// ---------------------------------------------------------------------------

/// Character set for [`RandomGenerator::random_string`].
///
/// `Alphabet::from("base36")` selects a preset; any string that is not a
/// preset name becomes a [`Alphabet::Custom`] set of its own characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Alphabet {
    /// `A-Z a-z 0-9 + /`
    Base64,
    /// `0-9 A-Z a-z`
    Alphanumeric,
    /// Alphanumeric without the look-alikes `0 O 1 I l o`.
    Base56,
    /// `A-Z a-z`
    Alpha,
    /// `0-9 a-z`
    Base36,
    /// `0-9 a-f`
    Hexadecimal,
    /// `0-9`
    Numeric,
    /// Caller-supplied characters, drawn as given (duplicates weigh more).
    Custom(Vec<char>),
}

impl Alphabet {
    /// Name of a preset, or `None` for a custom set.
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        match self {
            Self::Base64 => Some("base64"),
            Self::Alphanumeric => Some("alphanumeric"),
            Self::Base56 => Some("base56"),
            Self::Alpha => Some("alpha"),
            Self::Base36 => Some("base36"),
            Self::Hexadecimal => Some("hexadecimal"),
            Self::Numeric => Some("numeric"),
            Self::Custom(_) => None,
        }
    }

    /// Resolve to the concrete list of characters.
    #[must_use]
    pub fn symbols(&self) -> Vec<char> {
        let preset = match self {
            Self::Base64 => BASE64,
            Self::Alphanumeric => ALPHANUMERIC,
            Self::Base56 => BASE56,
            Self::Alpha => ALPHA,
            Self::Base36 => BASE36,
            Self::Hexadecimal => HEXADECIMAL,
            Self::Numeric => NUMERIC,
            Self::Custom(chars) => return chars.clone(),
        };
        preset.chars().collect()
    }
}

impl From<&str> for Alphabet {
    fn from(value: &str) -> Self {
        match value {
            "base64" => Self::Base64,
            "alphanumeric" => Self::Alphanumeric,
            "base56" => Self::Base56,
            "alpha" => Self::Alpha,
            "base36" => Self::Base36,
            "hexadecimal" => Self::Hexadecimal,
            "numeric" => Self::Numeric,
            other => Self::Custom(other.chars().collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// RandomGenerator
// ---------------------------------------------------------------------------

/// Fast generator seeded once from an exclusively owned entropy source.
pub struct RandomGenerator<E: SecureEntropySource = OsEntropySource> {
    source: E,
    fast: Mutex<Option<SmallRng>>,
}

impl RandomGenerator<OsEntropySource> {
    /// Generator backed by the plain OS CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(OsEntropySource::new())
    }
}

impl Default for RandomGenerator<OsEntropySource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SecureEntropySource> RandomGenerator<E> {
    /// Generator that will seed itself from `source` on first use.
    pub const fn with_source(source: E) -> Self {
        Self {
            source,
            fast: Mutex::new(None),
        }
    }

    /// Returns `true` once the one-time seeding has happened.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.fast.lock().is_ok_and(|slot| slot.is_some())
    }

    /// Borrow the entropy source.
    pub const fn source(&self) -> &E {
        &self.source
    }

    /// Unbounded draw in `[0, RAND_MAX]`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if the first-use seeding fails.
    pub fn random(&self) -> Result<i64, CryptoError> {
        self.with_rng(|rng| rng.gen_range(0..=RAND_MAX))
    }

    /// Draw in `[min, max]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if `min > max`, or
    /// [`CryptoError::Entropy`] if the first-use seeding fails.
    pub fn random_between(&self, min: i64, max: i64) -> Result<i64, CryptoError> {
        if min > max {
            return Err(CryptoError::InvalidArgument(format!(
                "empty range: min {min} is greater than max {max}"
            )));
        }
        self.with_rng(|rng| rng.gen_range(min..=max))
    }

    /// Build a string of exactly `length` characters drawn from `alphabet`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if `length` is zero or the
    /// alphabet resolves to no characters, or [`CryptoError::Entropy`] if the
    /// first-use seeding fails.
    pub fn random_string(&self, length: usize, alphabet: &Alphabet) -> Result<String, CryptoError> {
        if length == 0 {
            return Err(CryptoError::InvalidArgument(
                "random string length must be at least 1".into(),
            ));
        }
        let symbols = alphabet.symbols();
        if symbols.is_empty() {
            return Err(CryptoError::InvalidArgument(
                "alphabet must contain at least one character".into(),
            ));
        }

        self.with_rng(|rng| {
            (0..length)
                .map(|_| symbols[rng.gen_range(0..symbols.len())])
                .collect()
        })
    }

    /// Run `f` against the fast generator, seeding it first if needed.
    fn with_rng<T>(&self, f: impl FnOnce(&mut SmallRng) -> T) -> Result<T, CryptoError> {
        let mut slot = self.lock()?;
        if slot.is_none() {
            let bytes = self.source.next_bytes(SEED_LEN)?;
            let seed = seed_from_entropy(&bytes)?;
            tracing::trace!("random generator seeded from {SEED_LEN} entropy bytes");
            *slot = Some(SmallRng::seed_from_u64(u64::from_ne_bytes(
                i64::from(seed).to_ne_bytes(),
            )));
        }
        match slot.as_mut() {
            Some(rng) => Ok(f(rng)),
            None => Err(CryptoError::Entropy("generator is not seeded".into())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<SmallRng>>, CryptoError> {
        self.fast
            .lock()
            .map_err(|_| CryptoError::Entropy("random generator lock poisoned".into()))
    }
}

impl<E: SecureEntropySource> std::fmt::Debug for RandomGenerator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomGenerator")
            .field("seeded", &self.is_seeded())
            .finish_non_exhaustive()
    }
}

/// Turn 4 entropy bytes into the signed 32-bit seed.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the source returned a short draw.
pub(crate) fn seed_from_entropy(bytes: &[u8]) -> Result<i32, CryptoError> {
    let raw: [u8; SEED_LEN] = bytes.try_into().map_err(|_| {
        CryptoError::Entropy(format!(
            "entropy source returned {} bytes (expected {SEED_LEN})",
            bytes.len()
        ))
    })?;
    let shifted = i64::from(u32::from_le_bytes(raw)).wrapping_sub(SIGNED_OFFSET);
    i32::try_from(shifted).map_err(|_| CryptoError::Entropy("seed out of range".into()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

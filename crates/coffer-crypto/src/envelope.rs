//! Envelope wire format shared by both crypto services.
//!
//! ```text
//! <marker>#<base64 header>#<base64 ciphertext>#<hex HMAC>
//! ```
//!
//! The header is the IV for [`Scheme::Symmetric`] and the wrapped per-message
//! key for [`Scheme::Hybrid`]. The HMAC (SHA-256) always covers
//! `header || ciphertext`; what keys it is up to the scheme.
//!
//! Structural problems (field count, marker, encoding) are caller misuse and
//! surface as [`CryptoError::MalformedEnvelope`]. Tag problems surface as
//! [`CryptoError::Tampered`].

use std::fmt;

use data_encoding::{BASE64, HEXLOWER, HEXLOWER_PERMISSIVE};
use ring::hmac;

use crate::error::CryptoError;

/// Field separator.
pub const SEPARATOR: char = '#';

/// Number of fields in every envelope.
pub const FIELD_COUNT: usize = 4;

/// HMAC-SHA256 tag length in bytes.
pub const MAC_LEN: usize = 32;

/// Envelope scheme, identified by the first field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// Passphrase-based encryption (`SymmetricCryptoService`).
    Symmetric,
    /// Public-key envelope encryption (`AsymmetricCryptoService`).
    Hybrid,
}

impl Scheme {
    /// Fixed marker written as the first field.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Symmetric => "cfr-sym1",
            Self::Hybrid => "cfr-env1",
        }
    }
}

/// A parsed envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Scheme the envelope belongs to.
    pub scheme: Scheme,
    /// IV (symmetric) or wrapped key (hybrid).
    pub header: Vec<u8>,
    /// Encrypted payload.
    pub ciphertext: Vec<u8>,
    /// HMAC-SHA256 over `header || ciphertext`.
    pub mac: Vec<u8>,
}

impl Envelope {
    /// Assemble an envelope, computing its tag with `mac_key`.
    #[must_use]
    pub fn seal(scheme: Scheme, header: Vec<u8>, ciphertext: Vec<u8>, mac_key: &[u8]) -> Self {
        let mac = compute_mac(mac_key, &header, &ciphertext);
        Self {
            scheme,
            header,
            ciphertext,
            mac,
        }
    }

    /// Parse `input` as an envelope of `expected` scheme.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] if the input does not have
    /// exactly [`FIELD_COUNT`] fields, carries another marker, or a field is
    /// not validly encoded.
    pub fn parse(input: &str, expected: Scheme) -> Result<Self, CryptoError> {
        let fields: Vec<&str> = input.split(SEPARATOR).collect();
        let [marker, header, ciphertext, mac] = fields.as_slice() else {
            return Err(CryptoError::MalformedEnvelope(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        };
        if *marker != expected.marker() {
            return Err(CryptoError::MalformedEnvelope(format!(
                "unrecognized marker (expected {})",
                expected.marker()
            )));
        }

        let header = decode_base64(header, "header")?;
        let ciphertext = decode_base64(ciphertext, "ciphertext")?;
        let mac = HEXLOWER_PERMISSIVE
            .decode(mac.as_bytes())
            .map_err(|e| CryptoError::MalformedEnvelope(format!("tag is not hex: {e}")))?;
        if mac.len() != MAC_LEN {
            return Err(CryptoError::MalformedEnvelope(format!(
                "tag is {} bytes (expected {MAC_LEN})",
                mac.len()
            )));
        }

        Ok(Self {
            scheme: expected,
            header,
            ciphertext,
            mac,
        })
    }

    /// Check the carried tag against `mac_key`, in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Tampered`] on mismatch.
    pub fn verify_mac(&self, mac_key: &[u8]) -> Result<(), CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, mac_key);
        hmac::verify(&key, &authenticated_data(&self.header, &self.ciphertext), &self.mac)
            .map_err(|_| {
                tracing::debug!("{} envelope failed its integrity check", self.scheme.marker());
                CryptoError::Tampered
            })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.scheme.marker(),
            BASE64.encode(&self.header),
            BASE64.encode(&self.ciphertext),
            HEXLOWER.encode(&self.mac),
        )
    }
}

fn decode_base64(field: &str, name: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(field.as_bytes())
        .map_err(|e| CryptoError::MalformedEnvelope(format!("{name} is not base64: {e}")))
}

fn authenticated_data(header: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(header.len().saturating_add(ciphertext.len()));
    data.extend_from_slice(header);
    data.extend_from_slice(ciphertext);
    data
}

fn compute_mac(mac_key: &[u8], header: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, mac_key);
    hmac::sign(&key, &authenticated_data(header, ciphertext))
        .as_ref()
        .to_vec()
}

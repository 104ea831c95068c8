//! Every single-bit flip in an envelope must be rejected.

use coffer_crypto::{AsymmetricCryptoService, CryptoError, KeyPair, SymmetricCryptoService};
use data_encoding::BASE64;

const SECRET: &str = "12345678";

fn decode_fields(envelope: &str) -> Vec<Vec<u8>> {
    envelope
        .split('#')
        .skip(1)
        .take(2)
        .map(|field| BASE64.decode(field.as_bytes()).unwrap())
        .collect()
}

fn rebuild(envelope: &str, header: &[u8], ciphertext: &[u8]) -> String {
    let fields: Vec<&str> = envelope.split('#').collect();
    format!(
        "{}#{}#{}#{}",
        fields[0],
        BASE64.encode(header),
        BASE64.encode(ciphertext),
        fields[3]
    )
}

#[test]
fn symmetric_every_byte_flip_is_tampered() {
    let service = SymmetricCryptoService::new();
    let envelope = service.encrypt("the eagle lands at noon", SECRET).unwrap();
    let fields = decode_fields(&envelope);
    let (iv, ciphertext) = (&fields[0], &fields[1]);

    for i in 0..iv.len() {
        let mut bad = iv.clone();
        bad[i] ^= 0x01;
        let result = service.decrypt(&rebuild(&envelope, &bad, ciphertext), SECRET);
        assert!(matches!(result, Err(CryptoError::Tampered)), "iv byte {i}");
    }
    for i in 0..ciphertext.len() {
        let mut bad = ciphertext.clone();
        bad[i] ^= 0x80;
        let result = service.decrypt(&rebuild(&envelope, iv, &bad), SECRET);
        assert!(matches!(result, Err(CryptoError::Tampered)), "ciphertext byte {i}");
    }
}

#[test]
fn symmetric_wrong_secret_is_tampered() {
    let service = SymmetricCryptoService::new();
    let envelope = service.encrypt("data", SECRET).unwrap();
    for wrong in ["12345679", "123456789", "different"] {
        assert!(matches!(service.decrypt(&envelope, wrong), Err(CryptoError::Tampered)));
    }
}

#[test]
fn hybrid_payload_flips_are_tampered() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let envelope = service.encrypt("wire transfer: 100").unwrap();
    let fields = decode_fields(&envelope);
    let (wrapped, ciphertext) = (&fields[0], &fields[1]);

    for i in 0..ciphertext.len() {
        let mut bad = ciphertext.clone();
        bad[i] ^= 0x01;
        let result = service.decrypt(&rebuild(&envelope, wrapped, &bad));
        assert!(matches!(result, Err(CryptoError::Tampered)), "ciphertext byte {i}");
    }
}

#[test]
fn hybrid_wrapped_key_flips_never_decrypt() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let envelope = service.encrypt("wire transfer: 100").unwrap();
    let fields = decode_fields(&envelope);
    let (wrapped, ciphertext) = (&fields[0], &fields[1]);

    // Sample the X25519 key, the ML-KEM ciphertext and the sealed content key.
    for i in (0..wrapped.len()).step_by(97) {
        let mut bad = wrapped.clone();
        bad[i] ^= 0x01;
        let result = service.decrypt(&rebuild(&envelope, &bad, ciphertext));
        assert!(matches!(result, Err(CryptoError::EnvelopeOpen)), "wrapped byte {i}");
    }
}

#[test]
fn hybrid_forged_tag_is_tampered() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let envelope = service.encrypt("payload").unwrap();
    let (head, _) = envelope.rsplit_once('#').unwrap();
    let forged = format!("{head}#{}", "ab".repeat(32));
    assert!(matches!(service.decrypt(&forged), Err(CryptoError::Tampered)));
}

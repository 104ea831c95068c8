//! Secret-bearing types never print their contents.

use coffer_crypto::{
    AsymmetricCryptoService, CryptoConfig, KeyPair, OsEntropySource, SecretBuffer,
};

#[test]
fn secret_buffer_masked() {
    let buf = SecretBuffer::new(b"top secret bytes").unwrap();
    assert_eq!(format!("{buf:?}"), "SecretBuffer(***)");
    assert_eq!(format!("{buf}"), "SecretBuffer(***)");
}

#[test]
fn key_material_masked() {
    let kp = KeyPair::generate().unwrap();
    let debug = format!("{:?}", kp.private);
    assert_eq!(debug, "PrivateKeyBundle(***)");

    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    assert!(!format!("{service:?}").contains("ml_kem"));
}

#[test]
fn seed_and_passphrase_masked() {
    let source = OsEntropySource::with_seed(b"seed-material-xyz").unwrap();
    assert!(!format!("{source:?}").contains("seed-material-xyz"));

    let config = CryptoConfig::from_json_str(
        r#"{"keys": {"public_key": "p.json", "passphrase": "open sesame"}}"#,
    )
    .unwrap();
    assert!(!format!("{config:?}").contains("open sesame"));
}

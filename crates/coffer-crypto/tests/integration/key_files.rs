//! Key file generation, protection and loading.

use coffer_crypto::{
    AsymmetricCryptoService, Argon2idParams, CryptoError, ErrorKind, KeyPair, PublicKeyBundle,
};

/// Cheap Argon2id parameters for tests.
const FAST: Argon2idParams = Argon2idParams {
    m_cost: 64,
    t_cost: 1,
    p_cost: 1,
};

#[test]
fn protected_key_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let kp = KeyPair::generate().unwrap();
    let public = dir.path().join("public.json");
    let private = dir.path().join("private.json");
    std::fs::write(&public, kp.public.to_json().unwrap()).unwrap();
    std::fs::write(&private, kp.private.to_json(Some("s3cret phrase"), &FAST).unwrap()).unwrap();

    let service = AsymmetricCryptoService::builder()
        .public_key_path(&public)
        .private_key_path(&private)
        .passphrase("s3cret phrase")
        .build()
        .unwrap();
    let envelope = service.encrypt("unlocked").unwrap();
    assert_eq!(service.decrypt(&envelope).unwrap(), "unlocked");
}

#[test]
fn protected_key_file_needs_passphrase() {
    let kp = KeyPair::generate().unwrap();
    let private = kp.private.to_json(Some("s3cret phrase"), &FAST).unwrap();
    let err = AsymmetricCryptoService::builder()
        .public_key_bytes(kp.public.to_json().unwrap())
        .private_key_bytes(private)
        .build()
        .unwrap_err();
    assert!(matches!(err, CryptoError::Passphrase));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn protected_file_does_not_contain_raw_key() {
    let kp = KeyPair::generate().unwrap();
    let plain: serde_json::Value =
        serde_json::from_str(&kp.private.to_json(None, &FAST).unwrap()).unwrap();
    let sealed: serde_json::Value =
        serde_json::from_str(&kp.private.to_json(Some("phrase"), &FAST).unwrap()).unwrap();

    assert!(plain["protection"].is_null());
    assert_eq!(sealed["protection"]["kdf"], "argon2id");
    assert_eq!(sealed["protection"]["params"]["m_cost"], 64);
    assert_ne!(plain["key"], sealed["key"]);
}

#[test]
fn public_key_file_is_stable() {
    let kp = KeyPair::generate().unwrap();
    let json = kp.public.to_json().unwrap();
    let reparsed = PublicKeyBundle::from_json(&json).unwrap();
    assert_eq!(reparsed.to_json().unwrap(), json);
}

#[test]
fn corrupted_public_key_file_is_environment_error() {
    let err = AsymmetricCryptoService::builder()
        .public_key_bytes(b"{\"version\": 1}".to_vec())
        .build()
        .unwrap_err();
    assert!(matches!(err, CryptoError::KeyLoad(_)));
    assert_eq!(err.kind(), ErrorKind::Environment);
}

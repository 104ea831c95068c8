//! Hybrid envelopes through services built from key files.

use coffer_crypto::{
    AsymmetricCryptoService, CryptoConfig, CryptoError, KeyConfig, KeyPair, OsEntropySource,
    Scheme,
};

fn write_keys(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let kp = KeyPair::generate().unwrap();
    let public = dir.join("public.json");
    let private = dir.join("private.json");
    std::fs::write(&public, kp.public.to_json().unwrap()).unwrap();
    std::fs::write(
        &private,
        kp.private
            .to_json(None, &coffer_crypto::Argon2idParams::default())
            .unwrap(),
    )
    .unwrap();
    (public, private)
}

#[test]
fn roundtrip_through_key_files() {
    let dir = tempfile::tempdir().unwrap();
    let (public, private) = write_keys(dir.path());

    let sender = AsymmetricCryptoService::builder()
        .public_key_path(&public)
        .build()
        .unwrap();
    let recipient = AsymmetricCryptoService::builder()
        .public_key_path(&public)
        .private_key_path(&private)
        .build()
        .unwrap();

    let envelope = sender.encrypt("quarterly numbers").unwrap();
    assert!(envelope.starts_with(Scheme::Hybrid.marker()));
    assert_eq!(recipient.decrypt(&envelope).unwrap(), "quarterly numbers");
}

#[test]
fn roundtrip_large_binary() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let plaintext = vec![0xA5u8; 256 * 1024];
    let envelope = service.encrypt_bytes(&plaintext).unwrap();
    assert_eq!(service.decrypt_bytes(&envelope).unwrap().expose(), plaintext.as_slice());
}

#[test]
fn from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let (public, private) = write_keys(dir.path());
    let config_path = dir.path().join("coffer.json");
    let json = serde_json::json!({
        "keys": { "public_key": public, "private_key": private }
    });
    std::fs::write(&config_path, json.to_string()).unwrap();

    let config = CryptoConfig::from_json_file(&config_path).unwrap();
    let keys: &KeyConfig = config.keys.as_ref().unwrap();
    let service = AsymmetricCryptoService::from_config(keys).unwrap();
    assert!(service.has_private_key());

    let envelope = service.encrypt("configured").unwrap();
    assert_eq!(service.decrypt(&envelope).unwrap(), "configured");
}

#[test]
fn seed_file_from_config_reaches_hybrid_service() {
    let dir = tempfile::tempdir().unwrap();
    let (public, private) = write_keys(dir.path());
    let seed_path = dir.path().join("seed.bin");
    std::fs::write(&seed_path, b"host seed material").unwrap();
    let json = serde_json::json!({
        "entropy": { "seed_file": seed_path },
        "keys": { "public_key": public, "private_key": private }
    });

    let config = CryptoConfig::from_json_str(&json.to_string()).unwrap();
    let entropy = OsEntropySource::from_config(&config.entropy).unwrap();
    assert!(entropy.is_seeded());
    let keys = config.keys.as_ref().unwrap();
    let service = AsymmetricCryptoService::builder()
        .public_key_path(&keys.public_key)
        .private_key_path(keys.private_key.as_ref().unwrap())
        .build_with_entropy(entropy)
        .unwrap();

    let envelope = service.encrypt("seeded hybrid").unwrap();
    assert_eq!(service.decrypt(&envelope).unwrap(), "seeded hybrid");
}

#[test]
fn mismatched_private_key_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let (public, _) = write_keys(dir.path());
    let other = tempfile::tempdir().unwrap();
    let (_, foreign_private) = write_keys(other.path());

    let err = AsymmetricCryptoService::builder()
        .public_key_path(&public)
        .private_key_path(&foreign_private)
        .build()
        .unwrap_err();
    assert!(matches!(err, CryptoError::KeyLoad(_)));
}

//! Symmetric envelopes across realistic payload sizes and entropy sources.

use coffer_crypto::{OsEntropySource, Scheme, SymmetricCryptoService};

const SECRET: &str = "correct horse battery staple";

#[test]
fn roundtrip_1kb_text() {
    let service = SymmetricCryptoService::new();
    let plaintext = "x".repeat(1024);
    let envelope = service.encrypt(&plaintext, SECRET).unwrap();
    assert_eq!(service.decrypt(&envelope, SECRET).unwrap(), plaintext);
}

#[test]
fn roundtrip_1mb_binary() {
    let service = SymmetricCryptoService::new();
    let plaintext: Vec<u8> = (0..1_048_576u32).map(|i| (i % 251) as u8).collect();
    let envelope = service.encrypt_bytes(&plaintext, SECRET).unwrap();
    let decrypted = service.decrypt_bytes(&envelope, SECRET).unwrap();
    assert_eq!(decrypted.expose(), plaintext.as_slice());
}

#[test]
fn roundtrip_unicode() {
    let service = SymmetricCryptoService::new();
    let plaintext = "clé secrète 🔐 秘密";
    let envelope = service.encrypt(plaintext, "mot de passe").unwrap();
    assert_eq!(service.decrypt(&envelope, "mot de passe").unwrap(), plaintext);
}

#[test]
fn envelope_shape() {
    let envelope = SymmetricCryptoService::new()
        .encrypt("hello world", "12345678")
        .unwrap();
    let fields: Vec<&str> = envelope.split('#').collect();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0], Scheme::Symmetric.marker());
    assert_eq!(fields[3].len(), 64);
    assert!(fields[3].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn seeded_source_envelopes_open_with_plain_service() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.bin");
    std::fs::write(&seed, b"host specific seed material").unwrap();

    let seeded = SymmetricCryptoService::with_entropy(OsEntropySource::with_seed_file(&seed).unwrap());
    let envelope = seeded.encrypt("mixed iv", SECRET).unwrap();
    assert_eq!(
        SymmetricCryptoService::new().decrypt(&envelope, SECRET).unwrap(),
        "mixed iv"
    );
}

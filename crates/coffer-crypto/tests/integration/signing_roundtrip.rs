//! Signatures produced by one service instance and checked by another.

use coffer_crypto::{AsymmetricCryptoService, KeyPair};
use data_encoding::BASE64;

#[test]
fn verify_with_public_only_service() {
    let kp = KeyPair::generate().unwrap();
    let public_json = kp.public.to_json().unwrap();
    let signer = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let verifier = AsymmetricCryptoService::builder()
        .public_key_bytes(public_json)
        .build()
        .unwrap();

    let signature = signer.sign("release 2.4.1 sha256:abcd").unwrap();
    assert!(BASE64.decode(signature.as_bytes()).is_ok());
    assert!(verifier.verify("release 2.4.1 sha256:abcd", &signature).unwrap());
    assert!(!verifier.verify("release 2.4.2 sha256:abcd", &signature).unwrap());
}

#[test]
fn signature_from_other_signer_rejected() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let signer_a = AsymmetricCryptoService::new(a.public, Some(a.private));
    let signer_b = AsymmetricCryptoService::new(b.public, Some(b.private));

    let signature = signer_a.sign("message").unwrap();
    assert!(!signer_b.verify("message", &signature).unwrap());
}

#[test]
fn empty_message_signs() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let signature = service.sign("").unwrap();
    assert!(service.verify("", &signature).unwrap());
}

//! Malformed input is misuse, never a tamper report.

use coffer_crypto::{
    Alphabet, AsymmetricCryptoService, CryptoError, ErrorKind, KeyPair, RandomGenerator,
    SymmetricCryptoService,
};

const MALFORMED: &[&str] = &[
    "",
    "#",
    "cfr-sym1",
    "cfr-sym1#AAAA#AAAA",
    "cfr-sym1#AAAA#AAAA#00#extra",
    "unknown#AAAAAAAAAAAAAAAA#AAAA#0000000000000000000000000000000000000000000000000000000000000000",
];

#[test]
fn symmetric_malformed_is_misuse() {
    let service = SymmetricCryptoService::new();
    for input in MALFORMED {
        let err = service.decrypt(input, "12345678").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misuse, "{input:?}: {err}");
        assert!(!matches!(err, CryptoError::Tampered));
    }
}

#[test]
fn hybrid_malformed_is_misuse() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    for input in MALFORMED {
        let err = service.decrypt(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misuse, "{input:?}: {err}");
    }
}

#[test]
fn scheme_markers_are_not_interchangeable() {
    let kp = KeyPair::generate().unwrap();
    let hybrid = AsymmetricCryptoService::new(kp.public, Some(kp.private));
    let symmetric = SymmetricCryptoService::new();

    let hybrid_envelope = hybrid.encrypt("x").unwrap();
    let symmetric_envelope = symmetric.encrypt("x", "12345678").unwrap();

    assert!(matches!(
        symmetric.decrypt(&hybrid_envelope, "12345678"),
        Err(CryptoError::MalformedEnvelope(_))
    ));
    assert!(matches!(
        hybrid.decrypt(&symmetric_envelope),
        Err(CryptoError::MalformedEnvelope(_))
    ));
}

#[test]
fn missing_private_key_is_misuse() {
    let kp = KeyPair::generate().unwrap();
    let service = AsymmetricCryptoService::new(kp.public, None);
    let envelope = service.encrypt("x").unwrap();
    assert_eq!(service.decrypt(&envelope).unwrap_err().kind(), ErrorKind::Misuse);
    assert_eq!(service.sign("x").unwrap_err().kind(), ErrorKind::Misuse);
}

#[test]
fn invalid_random_arguments_are_misuse() {
    let generator = RandomGenerator::new();
    assert_eq!(
        generator.random_string(0, &Alphabet::Base64).unwrap_err().kind(),
        ErrorKind::Misuse
    );
    assert_eq!(
        generator.random_string(4, &Alphabet::Custom(Vec::new())).unwrap_err().kind(),
        ErrorKind::Misuse
    );
    assert_eq!(generator.random_between(2, 1).unwrap_err().kind(), ErrorKind::Misuse);
}

//! Random strings and integers through the public API.

use coffer_crypto::{Alphabet, CryptoError, OsEntropySource, RandomGenerator, RAND_MAX};

#[test]
fn every_preset_produces_its_own_characters() {
    let generator = RandomGenerator::new();
    for alphabet in [
        Alphabet::Base64,
        Alphabet::Alphanumeric,
        Alphabet::Base56,
        Alphabet::Alpha,
        Alphabet::Base36,
        Alphabet::Hexadecimal,
        Alphabet::Numeric,
    ] {
        let symbols = alphabet.symbols();
        let value = generator.random_string(64, &alphabet).unwrap();
        assert_eq!(value.chars().count(), 64);
        assert!(value.chars().all(|c| symbols.contains(&c)), "{alphabet:?}: {value}");
    }
}

#[test]
fn named_and_custom_alphabets_from_str() {
    let generator = RandomGenerator::new();
    assert_eq!(Alphabet::from("hexadecimal"), Alphabet::Hexadecimal);

    let value = generator.random_string(32, &Alphabet::from("ab")).unwrap();
    assert!(value.chars().all(|c| c == 'a' || c == 'b'));
}

#[test]
fn zero_length_is_invalid() {
    let err = RandomGenerator::new()
        .random_string(0, &Alphabet::Alphanumeric)
        .unwrap_err();
    assert!(matches!(err, CryptoError::InvalidArgument(_)));
}

#[test]
fn integers_stay_in_range() {
    let generator = RandomGenerator::with_source(OsEntropySource::with_seed(b"seed").unwrap());
    for _ in 0..1000 {
        let value = generator.random().unwrap();
        assert!((0..=RAND_MAX).contains(&value));
        let bounded = generator.random_between(-5, 5).unwrap();
        assert!((-5..=5).contains(&bounded));
    }
    assert_eq!(generator.random_between(9, 9).unwrap(), 9);
}

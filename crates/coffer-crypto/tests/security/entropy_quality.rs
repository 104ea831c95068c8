//! Smoke tests that generated output is not degenerate.
//!
//! Thresholds sit well below the expected values so natural variance never
//! trips them; broken output (constant, repeating) does.

use std::collections::HashSet;

use coffer_crypto::{Alphabet, OsEntropySource, RandomGenerator, SecretBuffer, SecureEntropySource};

/// Shannon entropy in bits per symbol.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy<T: std::hash::Hash + Eq>(data: &[T]) -> f64 {
    let mut freq = std::collections::HashMap::new();
    for item in data {
        *freq.entry(item).or_insert(0u64) += 1;
    }
    let len = data.len() as f64;
    freq.values()
        .map(|&f| {
            let p = f as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[test]
fn secret_buffer_random_64kb() {
    let buf = SecretBuffer::random(65_536).unwrap();
    assert!(shannon_entropy(buf.expose()) > 7.99);
}

#[test]
fn seeded_source_64kb() {
    let source = OsEntropySource::with_seed(&[0u8; 32]).unwrap();
    let bytes = source.next_bytes(65_536).unwrap();
    assert_eq!(bytes.len(), 65_536);
    assert!(shannon_entropy(&bytes) > 7.99);
}

#[test]
fn hexadecimal_strings_use_the_whole_alphabet() {
    let generator = RandomGenerator::new();
    let value = generator.random_string(16_384, &Alphabet::Hexadecimal).unwrap();
    let chars: Vec<char> = value.chars().collect();
    // log2(16) = 4 bits per symbol at best.
    assert!(shannon_entropy(&chars) > 3.95);
}

#[test]
fn strings_do_not_repeat() {
    let generator = RandomGenerator::new();
    let seen: HashSet<String> = (0..1000)
        .map(|_| generator.random_string(24, &Alphabet::Base56).unwrap())
        .collect();
    assert_eq!(seen.len(), 1000);
}

#[test]
fn generators_diverge() {
    let a = RandomGenerator::new().random_string(32, &Alphabet::Alphanumeric).unwrap();
    let b = RandomGenerator::new().random_string(32, &Alphabet::Alphanumeric).unwrap();
    assert_ne!(a, b);
}

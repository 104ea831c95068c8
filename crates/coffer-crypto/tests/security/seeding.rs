//! The fast generator draws exactly once from its entropy source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use coffer_crypto::{Alphabet, CryptoError, RandomGenerator, SecureEntropySource};

/// Records every request and answers with fixed bytes.
#[derive(Default)]
struct RecordingSource {
    requests: Mutex<Vec<usize>>,
}

impl SecureEntropySource for RecordingSource {
    fn next_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError> {
        self.requests.lock().unwrap().push(len);
        Ok(vec![0x5A; len])
    }
}

struct BrokenSource(AtomicUsize);

impl SecureEntropySource for BrokenSource {
    fn next_bytes(&self, _len: usize) -> Result<Vec<u8>, CryptoError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(CryptoError::Entropy("device unavailable".into()))
    }
}

#[test]
fn single_four_byte_draw_for_many_operations() {
    let generator = RandomGenerator::with_source(RecordingSource::default());
    assert!(!generator.is_seeded());

    for _ in 0..100 {
        generator.random_string(16, &Alphabet::Base56).unwrap();
        generator.random().unwrap();
        generator.random_between(1, 6).unwrap();
    }

    assert!(generator.is_seeded());
    assert_eq!(*generator.source().requests.lock().unwrap(), vec![4]);
}

#[test]
fn shared_generator_seeds_once_across_threads() {
    let generator = RandomGenerator::with_source(RecordingSource::default());
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    generator.random_string(8, &Alphabet::Numeric).unwrap();
                }
            });
        }
    });
    assert_eq!(*generator.source().requests.lock().unwrap(), vec![4]);
}

#[test]
fn instances_seed_independently() {
    let a = RandomGenerator::with_source(RecordingSource::default());
    let b = RandomGenerator::with_source(RecordingSource::default());
    a.random().unwrap();
    assert!(a.is_seeded());
    assert!(!b.is_seeded());
    assert!(b.source().requests.lock().unwrap().is_empty());
}

#[test]
fn failed_seeding_surfaces_and_retries() {
    let generator = RandomGenerator::with_source(BrokenSource(AtomicUsize::new(0)));
    assert!(matches!(generator.random(), Err(CryptoError::Entropy(_))));
    assert!(!generator.is_seeded());
    assert!(generator.random().is_err());
    assert_eq!(generator.source().0.load(Ordering::SeqCst), 2);
}

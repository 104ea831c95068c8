mod hybrid_roundtrip;
mod key_files;
mod random_strings;
mod signing_roundtrip;
mod symmetric_roundtrip;

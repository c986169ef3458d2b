//! Random per-document payloads.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Symbols a payload is drawn from.
pub const PAYLOAD_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890";

/// Draws `length` symbols uniformly from [`PAYLOAD_ALPHABET`].
pub fn generate_payload<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| PAYLOAD_ALPHABET[rng.random_range(0..PAYLOAD_ALPHABET.len())] as char)
        .collect()
}

/// Fixed-length payload source with its own random state.
///
/// Payloads carry no meaning; a seed only makes a run repeatable.
pub struct PayloadGenerator {
    rng: StdRng,
    length: usize,
}

impl PayloadGenerator {
    pub fn new(seed: Option<u64>, length: usize) -> PayloadGenerator {
        match seed {
            Some(seed) => PayloadGenerator::seeded(seed, length),
            None => PayloadGenerator::from_os_rng(length),
        }
    }

    pub fn seeded(seed: u64, length: usize) -> PayloadGenerator {
        PayloadGenerator {
            rng: StdRng::seed_from_u64(seed),
            length,
        }
    }

    pub fn from_os_rng(length: usize) -> PayloadGenerator {
        PayloadGenerator {
            rng: StdRng::from_os_rng(),
            length,
        }
    }

    pub fn next_payload(&mut self) -> String {
        generate_payload(&mut self.rng, self.length)
    }
}

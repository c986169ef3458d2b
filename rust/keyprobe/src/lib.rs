//! Bulk exact-set key lookup harness.
//!
//! Builds an index of `N` documents keyed either by hex strings or by 64-bit
//! integers, then looks all `N` keys up again with one batched membership query
//! and checks that exactly `N` documents come back. The lookup is timed on its
//! own, without index construction or key regeneration.

pub mod build;
pub mod codec;
pub mod config;
pub mod harness;
pub mod key;
pub mod lookup;
pub mod payload;
pub mod stopwatch;
pub mod verify;

pub use build::{BuildSummary, build_index};
pub use codec::{KEY_FIELD, KeyCodec, NumericKeyCodec, PAYLOAD_FIELD, StringKeyCodec, candidate_keys};
pub use config::HarnessConfig;
pub use harness::{Harness, HarnessReport, HarnessState, TrialReport};
pub use key::{Key, KeyEncoding, find_key_collisions, generate_key, numeric_key, string_key};
pub use lookup::{LookupOutcome, lookup};
pub use payload::{PayloadGenerator, generate_payload};
pub use stopwatch::Stopwatch;
pub use verify::verify_and_time;

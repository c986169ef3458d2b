use std::time::Duration;

use keyprobe_common::{Result, error::Error};

use crate::lookup::LookupOutcome;

/// Runs a lookup and checks that it matched exactly `expected` documents.
///
/// Returns the lookup's own timing window. A count that differs from `expected`,
/// or that is only a lower bound, fails with `HitCountMismatch`; nothing is retried.
pub fn verify_and_time<F>(trial: &str, expected: u64, lookup_fn: F) -> Result<Duration>
where
    F: FnOnce() -> Result<LookupOutcome>,
{
    let outcome = lookup_fn()?;
    let total = outcome.total_hits;
    if !total.is_exact() || total.value != expected {
        return Err(Error::hit_count_mismatch(
            trial,
            expected,
            total.value,
            total.is_exact(),
        ));
    }
    Ok(outcome.elapsed)
}

#[cfg(test)]
mod tests {
    use keyprobe_common::error::ErrorKind;
    use keyprobe_index::{TotalHits, TotalHitsRelation};

    use super::*;

    fn outcome(value: u64, relation: TotalHitsRelation) -> LookupOutcome {
        LookupOutcome {
            total_hits: TotalHits { value, relation },
            elapsed: Duration::from_micros(250),
        }
    }

    #[test]
    fn test_exact_match_returns_elapsed() {
        let elapsed =
            verify_and_time("string", 10, || Ok(outcome(10, TotalHitsRelation::EqualTo)))
                .unwrap();
        assert_eq!(elapsed, Duration::from_micros(250));
    }

    #[test]
    fn test_mismatches_fail() {
        let err = verify_and_time("numeric", 10, || Ok(outcome(9, TotalHitsRelation::EqualTo)))
            .unwrap_err();
        assert!(err.is_verification_failure());

        let err = verify_and_time("numeric", 10, || {
            Ok(outcome(10, TotalHitsRelation::GreaterThanOrEqualTo))
        })
        .unwrap_err();
        match err.kind() {
            ErrorKind::HitCountMismatch { actual, exact, .. } => {
                assert_eq!(*actual, 10);
                assert!(!exact);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lookup_errors_propagate() {
        let err = verify_and_time("string", 1, || Err(Error::index_not_found("/nowhere")))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IndexNotFound { .. }));
    }
}

//! Loose version comparison
//!
//! Tool version strings like git-annex's `5.20131213` are not semver,
//! so capability gating compares dotted numeric segments directly.
//! Missing segments count as zero; non-numeric segments fall back to
//! lexical comparison.

use std::cmp::Ordering;

/// Compare two dotted version strings segment by segment
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(ln), Ok(rn)) => ln.cmp(&rn),
            _ => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Whether `version` is at least `minimum`
pub fn at_least(version: &str, minimum: &str) -> bool {
    compare_versions(version, minimum) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_versions() {
        assert_eq!(compare_versions("5.20131213", "5.20131213"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_segments_compare_numerically() {
        assert_eq!(compare_versions("5.20140102", "5.20131213"), Ordering::Greater);
        assert_eq!(compare_versions("4.20131213", "5.1"), Ordering::Less);
        // Not lexical: 10 > 9
        assert_eq!(compare_versions("5.10", "5.9"), Ordering::Greater);
    }

    #[test]
    fn test_missing_segments_are_zero() {
        assert_eq!(compare_versions("5", "5.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("5.1", "5"), Ordering::Greater);
    }

    #[test]
    fn test_at_least() {
        assert!(at_least("5.20131213", "5.20131213"));
        assert!(at_least("6.20170101", "5.20131213"));
        assert!(!at_least("5.20130601", "5.20131213"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Comparison is antisymmetric.
        #[test]
        fn prop_antisymmetric(
            a in crate::test_utils::generators::version_string(),
            b in crate::test_utils::generators::version_string()
        ) {
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }

        /// Every version equals itself.
        #[test]
        fn prop_reflexive(a in crate::test_utils::generators::version_string()) {
            prop_assert_eq!(compare_versions(&a, &a), Ordering::Equal);
        }
    }
}

//! Property-based invariants:
//! - coverage partitions the defined list and reports the ratio rounded to
//!   two decimals, half-to-even on ties
//! - prefix normalization is idempotent

use dcat_ap_lu_tools::PrefixNormalizer;
use dcat_ap_lu_tools::coverage::{compare, coverage_percent};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn entity() -> impl Strategy<Value = String> {
    prop_oneof![Just("dcat"), Just("dct"), Just("dcterms"), Just("ns1"), Just("foaf")]
        .prop_flat_map(|prefix| "[A-Za-z]{1,8}".prop_map(move |local| format!("{prefix}:{local}")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn coverage_partitions_defined(
        defined in prop::collection::btree_set(entity(), 1..80),
        used in prop::collection::btree_set(entity(), 0..80),
    ) {
        let defined: Vec<String> = defined.into_iter().collect();
        let used: Vec<String> = used.into_iter().collect();
        let result = compare(&defined, &used);

        let used_set: BTreeSet<&String> = result.used.iter().collect();
        let unused_set: BTreeSet<&String> = result.unused.iter().collect();
        prop_assert!(used_set.is_disjoint(&unused_set));
        prop_assert_eq!(result.used.len() + result.unused.len(), defined.len());

        let intersection = defined.iter().filter(|d| used.contains(d)).count();
        prop_assert_eq!(result.used.len(), intersection);

        let exact = intersection as f64 * 100.0 / defined.len() as f64;
        let percent = result.coverage_percent;
        prop_assert!((percent - exact).abs() <= 0.005 + 1e-9, "{percent} vs {exact}");
        prop_assert!((percent * 100.0 - (percent * 100.0).round()).abs() < 1e-6);
        prop_assert!((0.0..=100.0).contains(&percent));
    }

    #[test]
    fn empty_defined_list_is_zero(used in 0usize..50) {
        prop_assert_eq!(coverage_percent(used, 0), 0.0);
    }

    #[test]
    fn normalization_is_idempotent(name in entity()) {
        let normalizer = PrefixNormalizer::builtin();
        let once = normalizer.normalize(&name);
        prop_assert_eq!(normalizer.normalize(&once), once.clone());
    }
}

/// Reference values from `round(used / defined * 100, 2)`; every odd count
/// over 32 lands exactly on a third-decimal tie.
const TIES: &[(usize, usize, f64)] = &[
    (1, 32, 3.12),
    (3, 32, 9.38),
    (5, 32, 15.62),
    (7, 32, 21.88),
    (9, 32, 28.12),
    (13, 32, 40.62),
    (21, 32, 65.62),
    (31, 32, 96.88),
    (1, 64, 1.56),
    (3, 64, 4.69),
    (5, 64, 7.81),
    (43, 64, 67.19),
];

#[test]
fn coverage_rounding_matches_reference_table() {
    for &(used, defined, expected) in TIES {
        let defined_list: Vec<String> = (0..defined).map(|i| format!("ex:e{i:03}")).collect();
        let used_list: Vec<String> = defined_list[..used].to_vec();
        let result = compare(&defined_list, &used_list);
        assert_eq!(result.coverage_percent, expected, "{used}/{defined}");
        assert_eq!(coverage_percent(used, defined), expected, "{used}/{defined}");
    }
}

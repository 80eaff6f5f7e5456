// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Class label to reference food name mapping

use nutrivision::nutrition::{map_to_reference_name, NameMapper, UNKNOWN_FOOD};
use nutrivision::vision::segmentation::DEFAULT_CLASS_NAMES;
use proptest::prelude::*;

#[test]
fn test_every_default_class_is_mapped() {
    let mapper = NameMapper::default();
    for class in DEFAULT_CLASS_NAMES {
        assert_ne!(mapper.map(class), UNKNOWN_FOOD, "{} is unmapped", class);
    }
    assert_eq!(mapper.map("fried noodle"), "noodle, rice");
    assert_eq!(mapper.map("mashed potato"), "potato, mashed");
}

#[test]
fn test_custom_entries() {
    let mapper = NameMapper::with_entries([("Durian", "durian, raw")]);
    assert_eq!(mapper.map("DURIAN"), "durian, raw");
    assert_eq!(mapper.map("banana"), UNKNOWN_FOOD);
}

proptest! {
    #[test]
    fn prop_mapping_is_case_insensitive(index in 0usize..10, upper in any::<bool>()) {
        let label = DEFAULT_CLASS_NAMES[index];
        let variant = if upper { label.to_uppercase() } else { label.to_string() };
        prop_assert_eq!(map_to_reference_name(&variant), map_to_reference_name(label));
    }

    #[test]
    fn prop_misses_map_to_unknown(label in "[0-9]{1,6}[a-z]{0,6}") {
        prop_assert_eq!(map_to_reference_name(&label), UNKNOWN_FOOD);
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Proportional scaling properties of the nutrient lookup

use nutrivision::{
    nutrition::{InMemorySource, Nutrient, NutrientError, NutrientService},
    utils::{Cell, Sheet},
};
use proptest::prelude::*;

fn service_with(food: &str, reference_weight: f64, values: [f64; 4]) -> NutrientService {
    let headers = ["Food", "Weight", "Calories", "Carbohydrate", "Protein", "Fat"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut row = vec![Cell::Text(food.to_string()), Cell::Number(reference_weight)];
    row.extend(values.iter().map(|v| Cell::Number(*v)));
    NutrientService::from_source(InMemorySource::new(Sheet::new(headers, vec![row])))
}

fn banana() -> NutrientService {
    service_with("banana", 100.0, [89.0, 23.0, 1.1, 0.3])
}

/// Swap the case of characters selected by `mask`
fn mixed_case(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #[test]
    fn prop_scaling_is_linear(w1 in 1.0f64..2000.0, w2 in 1.0f64..2000.0) {
        let service = banana();
        let a = service.lookup("banana", w1).unwrap();
        let b = service.lookup("banana", w2).unwrap();
        let ratio = w2 / w1;
        for nutrient in Nutrient::CORE {
            let va = a.calculated_nutrients[&nutrient];
            let vb = b.calculated_nutrients[&nutrient];
            // Both sides are rounded to 2 decimals
            let tolerance = 0.005 + 0.005 * ratio + 1e-9;
            prop_assert!(
                (vb - va * ratio).abs() <= tolerance,
                "{}: {} vs {} * {}", nutrient, vb, va, ratio
            );
        }
    }

    #[test]
    fn prop_reference_weight_is_identity(
        reference_weight in 1.0f64..1000.0,
        values in proptest::array::uniform4(0.0f64..5000.0),
    ) {
        let service = service_with("oats, rolled", reference_weight, values);
        let result = service.lookup("oats, rolled", reference_weight).unwrap();
        for (nutrient, expected) in Nutrient::CORE.into_iter().zip(values) {
            let actual = result.calculated_nutrients[&nutrient];
            prop_assert!((actual - expected).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn prop_matching_ignores_case_and_padding(
        mask in proptest::collection::vec(any::<bool>(), 1..8),
        left in 0usize..3,
        right in 0usize..3,
        weight in 1.0f64..500.0,
    ) {
        let service = banana();
        let query = format!(
            "{}{}{}",
            " ".repeat(left),
            mixed_case("banana", &mask),
            " ".repeat(right)
        );
        prop_assert_eq!(
            service.lookup(&query, weight).unwrap(),
            service.lookup("banana", weight).unwrap()
        );
    }

    #[test]
    fn prop_unknown_food_never_yields_values(name in "[a-z]{3,12}", weight in 1.0f64..500.0) {
        prop_assume!(name != "banana");
        let err = banana().lookup(&name, weight).unwrap_err();
        prop_assert!(matches!(err, NutrientError::FoodNotFound(ref food) if *food == name));
    }

    #[test]
    fn prop_invalid_selector_is_rejected(selector in "[A-Za-z ]{1,12}") {
        prop_assume!(!["Calories", "Carbohydrate", "Protein", "Fat"].contains(&selector.as_str()));
        let err = banana().lookup_nutrient("banana", 100.0, &selector).unwrap_err();
        prop_assert!(matches!(err, NutrientError::InvalidNutrient(_)), "unexpected {:?}", err);
    }
}

#[test]
fn test_banana_at_150_grams() {
    let result = banana().lookup("Banana", 150.0).unwrap();
    assert_eq!(result.food, "banana");
    assert_eq!(result.calculated_nutrients[&Nutrient::Calories], 133.5);
    assert_eq!(result.calculated_nutrients[&Nutrient::Carbohydrate], 34.5);
    assert_eq!(result.calculated_nutrients[&Nutrient::Protein], 1.65);
    assert_eq!(result.calculated_nutrients[&Nutrient::Fat], 0.45);
}

#[test]
fn test_composite_names_match_either_half() {
    let service = service_with("Pisang (Banana)", 100.0, [89.0, 23.0, 1.1, 0.3]);
    let by_first = service.lookup("pisang", 100.0).unwrap();
    let by_second = service.lookup("BANANA", 100.0).unwrap();
    let by_full = service.lookup("pisang (banana)", 100.0).unwrap();
    assert_eq!(by_first, by_second);
    assert_eq!(by_first, by_full);
    assert_eq!(by_first.food, "pisang (banana)");
}

#[test]
fn test_non_finite_weights_rejected() {
    for weight in [f64::NAN, f64::INFINITY, -1.0, 0.0] {
        assert!(matches!(
            banana().lookup("banana", weight),
            Err(NutrientError::InvalidWeight(_))
        ));
    }
}

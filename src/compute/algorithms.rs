//! Post-filter helpers: distances and attribute predicates.

use cellindex_types::filter::{FilterCondition, FilterKeys, Occur};
use cellindex_types::point::Coordinates;
use geo::{Distance, Haversine};
use std::cmp::Ordering;

/// Great-circle distance between two points in meters.
///
/// # Examples
///
/// ```
/// use cellindex::compute::algorithms::distance_meters;
/// use cellindex::Coordinates;
///
/// let dc = Coordinates::new(38.90, -77.03);
/// let nyc = Coordinates::new(40.71, -74.00);
/// let d = distance_meters(&dc, &nyc);
/// assert!(d > 320_000.0 && d < 340_000.0);
/// assert_eq!(distance_meters(&dc, &dc), 0.0);
/// ```
pub fn distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// Evaluates filter conditions against a point's attributes.
///
/// Every `Must` condition has to match. If any `Should` conditions are
/// present, at least one of them has to match; an empty `Should` group
/// excludes nothing.
pub fn matches_filters(filter_keys: &FilterKeys, conditions: &[FilterCondition]) -> bool {
    let mut has_should = false;
    let mut should_matched = false;

    for condition in conditions {
        match condition.occur {
            Occur::Must => {
                if !condition.matches(filter_keys) {
                    return false;
                }
            }
            Occur::Should => {
                has_should = true;
                if !should_matched && condition.matches(filter_keys) {
                    should_matched = true;
                }
            }
        }
    }

    !has_should || should_matched
}

/// Orders `(distance, key)` pairs nearest first, ties broken by key.
pub fn cmp_by_distance(a: (f64, &str), b: (f64, &str)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellindex_types::filter::FilterField;

    fn place(provider: &str, primary_type: Option<&str>) -> FilterKeys {
        let mut keys = FilterKeys::new();
        keys.insert("provider".into(), provider.into());
        if let Some(t) = primary_type {
            keys.insert("primaryType".into(), FilterField::from(t));
        }
        keys
    }

    #[test]
    fn test_no_conditions_match_everything() {
        assert!(matches_filters(&place("google", None), &[]));
    }

    #[test]
    fn test_must_conditions_are_anded() {
        let keys = place("google", Some("cafe"));
        assert!(matches_filters(
            &keys,
            &[
                FilterCondition::must("provider", "google"),
                FilterCondition::must("primaryType", "cafe"),
            ]
        ));
        assert!(!matches_filters(
            &keys,
            &[
                FilterCondition::must("provider", "google"),
                FilterCondition::must("primaryType", "bar"),
            ]
        ));
    }

    #[test]
    fn test_should_conditions_are_ored() {
        let keys = place("manual", Some("cafe"));
        let conditions = [
            FilterCondition::should("provider", "google"),
            FilterCondition::should("provider", "manual"),
        ];
        assert!(matches_filters(&keys, &conditions));
        assert!(!matches_filters(&place("crawl", None), &conditions));
    }

    #[test]
    fn test_must_and_should_combined() {
        let conditions = [
            FilterCondition::must("primaryType", "cafe"),
            FilterCondition::should("provider", "google"),
            FilterCondition::should("provider", "manual"),
        ];
        assert!(matches_filters(&place("google", Some("cafe")), &conditions));
        assert!(!matches_filters(&place("google", Some("bar")), &conditions));
        assert!(!matches_filters(&place("crawl", Some("cafe")), &conditions));
    }

    #[test]
    fn test_distance_ordering_breaks_ties_by_key() {
        assert_eq!(cmp_by_distance((1.0, "b"), (2.0, "a")), Ordering::Less);
        assert_eq!(cmp_by_distance((1.0, "b"), (1.0, "a")), Ordering::Greater);
        assert_eq!(cmp_by_distance((1.0, "a"), (1.0, "a")), Ordering::Equal);
    }
}

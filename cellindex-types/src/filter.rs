use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar attribute value attached to an indexed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// An attribute slot: either a single scalar or an array of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterField {
    One(FilterValue),
    Many(Vec<FilterValue>),
}

impl FilterField {
    /// A scalar field equals the value; an array field contains it.
    pub fn matches(&self, value: &FilterValue) -> bool {
        match self {
            Self::One(v) => v == value,
            Self::Many(values) => values.iter().any(|v| v == value),
        }
    }
}

impl From<FilterValue> for FilterField {
    fn from(value: FilterValue) -> Self {
        Self::One(value)
    }
}

impl From<&str> for FilterField {
    fn from(value: &str) -> Self {
        Self::One(value.into())
    }
}

impl From<String> for FilterField {
    fn from(value: String) -> Self {
        Self::One(value.into())
    }
}

impl From<f64> for FilterField {
    fn from(value: f64) -> Self {
        Self::One(value.into())
    }
}

impl From<bool> for FilterField {
    fn from(value: bool) -> Self {
        Self::One(value.into())
    }
}

impl From<Vec<FilterValue>> for FilterField {
    fn from(values: Vec<FilterValue>) -> Self {
        Self::Many(values)
    }
}

/// Attribute name to value mapping evaluated by query filters.
pub type FilterKeys = BTreeMap<String, FilterField>;

/// How a filter condition participates in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occur {
    /// Every `Must` condition has to match.
    #[default]
    Must,
    /// At least one `Should` condition has to match, if any are given.
    Should,
}

/// A single equality predicate over a point's filter keys.
///
/// # Examples
///
/// ```
/// use cellindex_types::filter::{FilterCondition, FilterKeys, Occur};
///
/// let cond = FilterCondition::must("provider", "google");
/// assert_eq!(cond.occur, Occur::Must);
/// assert_eq!(cond.filter_key, "provider");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub filter_key: String,
    pub filter_value: FilterValue,
    #[serde(default)]
    pub occur: Occur,
}

impl FilterCondition {
    pub fn new(
        filter_key: impl Into<String>,
        filter_value: impl Into<FilterValue>,
        occur: Occur,
    ) -> Self {
        Self {
            filter_key: filter_key.into(),
            filter_value: filter_value.into(),
            occur,
        }
    }

    pub fn must(filter_key: impl Into<String>, filter_value: impl Into<FilterValue>) -> Self {
        Self::new(filter_key, filter_value, Occur::Must)
    }

    pub fn should(filter_key: impl Into<String>, filter_value: impl Into<FilterValue>) -> Self {
        Self::new(filter_key, filter_value, Occur::Should)
    }

    /// Whether the attributes satisfy this single predicate.
    ///
    /// A missing attribute only matches a `Null` value.
    pub fn matches(&self, filter_keys: &FilterKeys) -> bool {
        match filter_keys.get(&self.filter_key) {
            Some(field) => field.matches(&self.filter_value),
            None => self.filter_value == FilterValue::Null,
        }
    }
}

//! Tag-based item selection

use std::collections::HashMap;

use serde::Deserialize;

/// Required tag pairs an item must carry to be selected.
///
/// An empty filter selects every item, including items without tags.
/// A non-empty filter selects an item only when each required pair is present
/// with an identical value. No prefix matching, no case folding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TagFilter(HashMap<String, String>);

impl TagFilter {
    /// Filter that selects everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required tag pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check an item's tags against the filter
    pub fn matches(&self, tags: Option<&HashMap<String, String>>) -> bool {
        if self.0.is_empty() {
            return true;
        }

        match tags {
            Some(tags) => self
                .0
                .iter()
                .all(|(key, value)| tags.get(key).is_some_and(|actual| actual == value)),
            None => false,
        }
    }
}

impl From<HashMap<String, String>> for TagFilter {
    fn from(tags: HashMap<String, String>) -> Self {
        Self(tags)
    }
}

impl<K, V> FromIterator<(K, V)> for TagFilter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = TagFilter::new();
        assert!(filter.matches(None));
        assert!(filter.matches(Some(&HashMap::new())));
        assert!(filter.matches(Some(&tags(&[("env", "dev")]))));
    }

    #[test]
    fn test_required_pair_must_be_present() {
        let filter = TagFilter::new().with("env", "prod");
        assert!(filter.matches(Some(&tags(&[("env", "prod")]))));
        assert!(!filter.matches(Some(&tags(&[("env", "dev")]))));
        assert!(!filter.matches(Some(&tags(&[("role", "prod")]))));
    }

    #[test]
    fn test_untagged_item_never_matches_non_empty_filter() {
        let filter = TagFilter::new().with("env", "prod");
        assert!(!filter.matches(None));
        assert!(!filter.matches(Some(&HashMap::new())));
    }

    #[test]
    fn test_superset_of_tags_matches() {
        let filter = TagFilter::new().with("env", "prod").with("team", "staking");
        let item = tags(&[("env", "prod"), ("team", "staking"), ("extra", "x")]);
        assert!(filter.matches(Some(&item)));

        let partial = tags(&[("env", "prod")]);
        assert!(!filter.matches(Some(&partial)));
    }

    #[test]
    fn test_exact_value_equality() {
        let filter = TagFilter::new().with("env", "prod");
        assert!(!filter.matches(Some(&tags(&[("env", "PROD")]))));
        assert!(!filter.matches(Some(&tags(&[("env", "production")]))));
        assert!(!filter.matches(Some(&tags(&[("env", "prod ")]))));
    }

    #[test]
    fn test_from_iterator() {
        let filter: TagFilter = [("env", "prod"), ("zone", "eu")].into_iter().collect();
        assert_eq!(filter.len(), 2);
        assert!(filter.matches(Some(&tags(&[("env", "prod"), ("zone", "eu")]))));
    }
}

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Mapping from every original tag to its canonical (title-cased) tag.
///
/// Produced once per batch by tag unification so that a given original tag
/// always lands on the same canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMapping(HashMap<String, String>);

/// A tag had no entry in the mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tag '{0}' is missing from the unification mapping")]
pub struct UnmappedTag(pub String);

impl TagMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical form of `tag`, if the mapping has one.
    pub fn canonical(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    /// Records `original` as mapping to `canonical`.
    pub fn insert(&mut self, original: impl Into<String>, canonical: impl Into<String>) {
        self.0.insert(original.into(), canonical.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct canonical tags.
    pub fn canonical_count(&self) -> usize {
        self.0.values().collect::<HashSet<_>>().len()
    }

    /// Returns true if every tag maps to itself.
    pub fn is_identity(&self) -> bool {
        self.0.iter().all(|(original, canonical)| original == canonical)
    }

    /// Maps every tag to its canonical form.
    ///
    /// Tags that collapse to the same canonical form appear once, in the
    /// position of their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns `UnmappedTag` for the first tag without an entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use postags::TagMapping;
    ///
    /// let mut mapping = TagMapping::new();
    /// mapping.insert("Jobseekers", "Job Search");
    /// mapping.insert("Job Hunting", "Job Search");
    /// mapping.insert("Motivation", "Motivation");
    ///
    /// let tags = vec!["Jobseekers".to_string(), "Job Hunting".to_string(), "Motivation".to_string()];
    /// assert_eq!(mapping.remap(&tags).unwrap(), vec!["Job Search", "Motivation"]);
    /// ```
    pub fn remap(&self, tags: &[String]) -> Result<Vec<String>, UnmappedTag> {
        let mut seen = HashSet::new();
        let mut remapped = Vec::with_capacity(tags.len());
        for tag in tags {
            let canonical = self
                .canonical(tag)
                .ok_or_else(|| UnmappedTag(tag.clone()))?;
            if seen.insert(canonical) {
                remapped.push(canonical.to_string());
            }
        }
        Ok(remapped)
    }
}

impl FromIterator<(String, String)> for TagMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> TagMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remap_replaces_tags_with_canonical_forms() {
        let mapping = mapping(&[("JobSearch", "Job Search"), ("Motivation", "Motivation")]);
        let result = mapping.remap(&tags(&["JobSearch", "Motivation"])).unwrap();
        assert_eq!(result, vec!["Job Search", "Motivation"]);
    }

    #[test]
    fn remap_collapses_synonyms_into_one_entry() {
        let mapping = mapping(&[
            ("Personal Growth", "Self Improvement"),
            ("Personal Development", "Self Improvement"),
        ]);
        let result = mapping
            .remap(&tags(&["Personal Growth", "Personal Development"]))
            .unwrap();
        assert_eq!(result, vec!["Self Improvement"]);
    }

    #[test]
    fn remap_reports_missing_tag() {
        let mapping = mapping(&[("Scam Alert", "Scams")]);
        let err = mapping.remap(&tags(&["Scam Alert", "Job Scam"])).unwrap_err();
        assert_eq!(err, UnmappedTag("Job Scam".to_string()));
    }

    #[test]
    fn remap_of_empty_tags_is_empty() {
        assert!(TagMapping::new().remap(&[]).unwrap().is_empty());
    }

    #[test]
    fn deserializes_from_plain_json_object() {
        let mapping: TagMapping =
            serde_json::from_str(r#"{"Jobseekers": "Job Search", "Drive": "Motivation"}"#).unwrap();
        assert_eq!(mapping.canonical("Drive"), Some("Motivation"));
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.canonical_count(), 2);
    }

    #[test]
    fn rejects_non_string_values() {
        let result: Result<TagMapping, _> = serde_json::from_str(r#"{"Drive": ["Motivation"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn canonical_count_merges_duplicates() {
        let mapping = mapping(&[
            ("Jobseekers", "Job Search"),
            ("Job Hunting", "Job Search"),
            ("Motivation", "Motivation"),
        ]);
        assert_eq!(mapping.canonical_count(), 2);
        assert!(!mapping.is_identity());
    }

    #[test]
    fn identity_mapping_is_detected() {
        let mapping = mapping(&[("Job Search", "Job Search"), ("Motivation", "Motivation")]);
        assert!(mapping.is_identity());
    }
}

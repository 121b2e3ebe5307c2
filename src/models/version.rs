//! Version history models.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::WorkingData;

/// Metadata of one named version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    pub number: u64,
    pub description: String,
    pub created_at: String,
    pub text_count: usize,
    pub image_count: usize,
}

/// On-disk version file: metadata plus the working data snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    #[serde(flatten)]
    pub entry: VersionEntry,
    pub data: WorkingData,
}

/// Form body for creating a version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersionForm {
    #[serde(default)]
    pub description: String,
}

/// Form body for restoring a version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreVersionForm {
    #[serde(default)]
    pub version_id: String,
}

/// Query string for comparing two versions.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub a: String,
    #[serde(default)]
    pub b: String,
}

/// Old and new value of a changed key.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValueChange {
    pub from: String,
    pub to: String,
}

/// Key-level difference between two string maps.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FieldDiff {
    pub added: BTreeMap<String, String>,
    pub removed: BTreeMap<String, String>,
    pub changed: BTreeMap<String, ValueChange>,
}

impl FieldDiff {
    /// Diff `from` against `to`: `added` holds keys only present in `to`.
    pub fn between(from: &BTreeMap<String, String>, to: &BTreeMap<String, String>) -> Self {
        let mut diff = FieldDiff::default();
        let keys: BTreeSet<&String> = from.keys().chain(to.keys()).collect();

        for key in keys {
            match (from.get(key), to.get(key)) {
                (None, Some(new)) => {
                    diff.added.insert(key.clone(), new.clone());
                }
                (Some(old), None) => {
                    diff.removed.insert(key.clone(), old.clone());
                }
                (Some(old), Some(new)) if old != new => {
                    diff.changed.insert(
                        key.clone(),
                        ValueChange {
                            from: old.clone(),
                            to: new.clone(),
                        },
                    );
                }
                _ => {}
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Structured diff between two snapshots.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub from: String,
    pub to: String,
    pub texts: FieldDiff,
    pub images: FieldDiff,
    pub identical: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_field_diff_classifies_keys() {
        let a = map(&[("title", "Hello"), ("footer", "Bye"), ("same", "x")]);
        let b = map(&[("title", "Hi"), ("subtitle", "New"), ("same", "x")]);

        let diff = FieldDiff::between(&a, &b);

        assert_eq!(diff.added, map(&[("subtitle", "New")]));
        assert_eq!(diff.removed, map(&[("footer", "Bye")]));
        assert_eq!(diff.changed.len(), 1);
        assert_eq!(diff.changed["title"].from, "Hello");
        assert_eq!(diff.changed["title"].to, "Hi");
    }

    #[test]
    fn test_field_diff_reverse_swaps_added_and_removed() {
        let a = map(&[("one", "1"), ("two", "2")]);
        let b = map(&[("two", "22"), ("three", "3")]);

        let forward = FieldDiff::between(&a, &b);
        let backward = FieldDiff::between(&b, &a);

        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
        assert_eq!(
            forward.changed.keys().collect::<Vec<_>>(),
            backward.changed.keys().collect::<Vec<_>>()
        );
        assert_eq!(backward.changed["two"].from, "22");
    }

    #[test]
    fn test_field_diff_identical_maps() {
        let a = map(&[("k", "v")]);
        assert!(FieldDiff::between(&a, &a).is_empty());
    }
}

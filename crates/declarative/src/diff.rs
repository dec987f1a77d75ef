//! Structural diff between declared and remote state
//!
//! One keyed algorithm serves every configuration domain. A domain
//! describes how to key its elements, how to describe them, and which
//! properties differ between two elements sharing a key; [`detect_diff`]
//! does the rest.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Kind of difference for one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Declared but not present remotely
    Added,
    /// Present on both sides with differing properties
    Modified,
    /// Present remotely but no longer declared
    Deleted,
}

impl DiffKind {
    /// Symbol used when rendering a diff
    pub fn symbol(&self) -> char {
        match self {
            Self::Added => '+',
            Self::Modified => '~',
            Self::Deleted => '-',
        }
    }
}

/// One property that differs between remote and declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    pub property: String,
    /// Remote (current) value
    pub from: String,
    /// Declared (desired) value
    pub to: String,
}

impl PropertyChange {
    pub fn new(property: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.property, self.from, self.to)
    }
}

/// A single difference for one keyed element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry<K> {
    pub kind: DiffKind,
    /// Identifying key of the element (code, name, ...)
    pub key: K,
    /// Human-readable description of the change
    pub description: String,
    /// Property-level changes (only for `Modified`)
    pub changes: Vec<PropertyChange>,
}

/// Counts per diff category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl DiffSummary {
    /// Create a summary from a list of entries
    pub fn from_entries<K>(entries: &[DiffEntry<K>]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry.kind {
                DiffKind::Added => summary.added += 1,
                DiffKind::Modified => summary.modified += 1,
                DiffKind::Deleted => summary.deleted += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Result of diffing one domain
///
/// Warnings are informational and never counted in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult<K> {
    pub entries: Vec<DiffEntry<K>>,
    pub summary: DiffSummary,
    pub warnings: Vec<String>,
}

impl<K> DiffResult<K> {
    /// Build a result, deriving the summary from the entries
    pub fn new(entries: Vec<DiffEntry<K>>, warnings: Vec<String>) -> Self {
        let summary = DiffSummary::from_entries(&entries);
        Self {
            entries,
            summary,
            warnings,
        }
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind
    pub fn of_kind(&self, kind: DiffKind) -> impl Iterator<Item = &DiffEntry<K>> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Append entries and warnings from another result
    pub fn extend(&mut self, other: DiffResult<K>) {
        self.entries.extend(other.entries);
        self.warnings.extend(other.warnings);
        self.summary = DiffSummary::from_entries(&self.entries);
    }
}

impl<K> Default for DiffResult<K> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Which side of a diff a set of elements came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Declared,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Declared => write!(f, "declared"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

/// A configuration domain that can be diffed
pub trait DiffDomain {
    /// Element type compared by this domain
    type Item;
    /// Identifying key of an element
    type Key: Clone + Eq + Hash + fmt::Display;

    /// Domain name used in warnings
    fn name(&self) -> &'static str;

    /// Key of an element
    fn key(&self, item: &Self::Item) -> Self::Key;

    /// Short description of an element for added/deleted entries
    fn describe(&self, item: &Self::Item) -> String;

    /// Properties that differ between the declared and remote element
    ///
    /// An empty list means the elements are equivalent.
    fn compare(&self, declared: &Self::Item, remote: &Self::Item) -> Vec<PropertyChange>;

    /// Domain-specific warnings for one side
    fn warnings(&self, _items: &[&Self::Item], _side: Side) -> Vec<String> {
        Vec::new()
    }
}

/// Diff declared elements against remote elements
///
/// Entries follow declared order for additions and modifications, then
/// remote order for deletions. When a key appears more than once on one
/// side, the first occurrence is used and a warning is recorded.
pub fn detect_diff<'a, D, I, R>(domain: &D, declared: I, remote: R) -> DiffResult<D::Key>
where
    D: DiffDomain,
    D::Item: 'a,
    I: IntoIterator<Item = &'a D::Item>,
    R: IntoIterator<Item = &'a D::Item>,
{
    let declared: Vec<&D::Item> = declared.into_iter().collect();
    let remote: Vec<&D::Item> = remote.into_iter().collect();

    let mut warnings = Vec::new();
    let declared_index = index_by_key(domain, &declared, Side::Declared, &mut warnings);
    let remote_index = index_by_key(domain, &remote, Side::Remote, &mut warnings);
    warnings.extend(domain.warnings(&declared, Side::Declared));
    warnings.extend(domain.warnings(&remote, Side::Remote));

    let remote_by_key: HashMap<&D::Key, &D::Item> = remote_index.iter().map(|(k, item)| (k, *item)).collect();
    let declared_keys: HashSet<&D::Key> = declared_index.iter().map(|(k, _)| k).collect();

    let mut entries = Vec::new();

    for (key, item) in &declared_index {
        match remote_by_key.get(key) {
            None => entries.push(DiffEntry {
                kind: DiffKind::Added,
                key: key.clone(),
                description: domain.describe(item),
                changes: Vec::new(),
            }),
            Some(current) => {
                let changes = domain.compare(item, current);
                if !changes.is_empty() {
                    let description = changes
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    entries.push(DiffEntry {
                        kind: DiffKind::Modified,
                        key: key.clone(),
                        description,
                        changes,
                    });
                }
            }
        }
    }

    for (key, item) in &remote_index {
        if !declared_keys.contains(key) {
            entries.push(DiffEntry {
                kind: DiffKind::Deleted,
                key: key.clone(),
                description: domain.describe(item),
                changes: Vec::new(),
            });
        }
    }

    for warning in &warnings {
        log::warn!("{}: {}", domain.name(), warning);
    }

    DiffResult::new(entries, warnings)
}

/// Key elements in order, keeping the first occurrence of each key
fn index_by_key<'a, D: DiffDomain>(
    domain: &D,
    items: &[&'a D::Item],
    side: Side,
    warnings: &mut Vec<String>,
) -> Vec<(D::Key, &'a D::Item)> {
    let mut seen: HashMap<D::Key, usize> = HashMap::new();
    let mut index = Vec::with_capacity(items.len());
    for item in items {
        let key = domain.key(item);
        let count = seen.entry(key.clone()).or_default();
        *count += 1;
        if *count == 1 {
            index.push((key, *item));
        }
    }

    let mut duplicates: BTreeSet<String> = BTreeSet::new();
    for (key, count) in &seen {
        if *count > 1 {
            duplicates.insert(key.to_string());
        }
    }
    for key in duplicates {
        warnings.push(format!(
            "{} {} key '{}' appears more than once; only the first is compared",
            side,
            domain.name(),
            key
        ));
    }

    index
}

/// Group entries by kind, preserving order within each group
pub fn group_by_kind<K>(entries: &[DiffEntry<K>]) -> HashMap<DiffKind, Vec<&DiffEntry<K>>> {
    let mut groups: HashMap<DiffKind, Vec<&DiffEntry<K>>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.kind).or_default().push(entry);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Setting {
        name: &'static str,
        value: &'static str,
        label: &'static str,
    }

    fn setting(name: &'static str, value: &'static str) -> Setting {
        Setting {
            name,
            value,
            label: name,
        }
    }

    struct Settings;

    impl DiffDomain for Settings {
        type Item = Setting;
        type Key = String;

        fn name(&self) -> &'static str {
            "settings"
        }

        fn key(&self, item: &Setting) -> String {
            item.name.to_string()
        }

        fn describe(&self, item: &Setting) -> String {
            format!("{} = {}", item.name, item.value)
        }

        fn compare(&self, declared: &Setting, remote: &Setting) -> Vec<PropertyChange> {
            let mut changes = Vec::new();
            if declared.value != remote.value {
                changes.push(PropertyChange::new("value", remote.value, declared.value));
            }
            if declared.label != remote.label {
                changes.push(PropertyChange::new("label", remote.label, declared.label));
            }
            changes
        }

        fn warnings(&self, items: &[&Setting], side: Side) -> Vec<String> {
            let mut labels: Vec<&str> = items.iter().map(|s| s.label).collect();
            labels.sort_unstable();
            labels
                .windows(2)
                .filter(|w| w[0] == w[1])
                .map(|w| format!("{side} label '{}' is ambiguous", w[0]))
                .collect()
        }
    }

    #[test]
    fn test_identical_states_are_empty() {
        let items = vec![setting("a", "1"), setting("b", "2")];
        let result = detect_diff(&Settings, &items, &items);
        assert!(result.is_empty());
        assert_eq!(result.summary, DiffSummary::default());
        assert!(!result.summary.has_changes());
    }

    #[test]
    fn test_declared_only_is_added() {
        let declared = vec![setting("a", "1"), setting("b", "2")];
        let remote = vec![setting("a", "1")];
        let result = detect_diff(&Settings, &declared, &remote);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].kind, DiffKind::Added);
        assert_eq!(result.entries[0].key, "b");
        assert_eq!(result.summary.added, 1);
    }

    #[test]
    fn test_remote_only_is_deleted() {
        let declared = vec![setting("a", "1")];
        let remote = vec![setting("a", "1"), setting("gone", "x")];
        let result = detect_diff(&Settings, &declared, &remote);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].kind, DiffKind::Deleted);
        assert_eq!(result.summary.deleted, 1);
    }

    #[test]
    fn test_single_property_change_is_modified() {
        let declared = vec![setting("a", "new")];
        let remote = vec![setting("a", "old")];
        let result = detect_diff(&Settings, &declared, &remote);
        assert_eq!(result.summary.modified, 1);
        assert_eq!(result.summary.total(), 1);
        let entry = &result.entries[0];
        assert_eq!(entry.changes, vec![PropertyChange::new("value", "old", "new")]);
        assert_eq!(entry.description, "value: old -> new");
    }

    #[test]
    fn test_large_sets_keep_declared_then_remote_order() {
        let name = |i: usize| -> &'static str { format!("k{i:05}").leak() };
        let declared: Vec<Setting> = (0..5000).rev().map(|i| setting(name(i), "1")).collect();
        let remote: Vec<Setting> = (2500..7500).map(|i| setting(name(i), if i % 2 == 0 { "1" } else { "2" })).collect();

        let result = detect_diff(&Settings, &declared, &remote);
        assert_eq!(result.summary.added, 2500);
        assert_eq!(result.summary.modified, 1250);
        assert_eq!(result.summary.deleted, 2500);
        assert_eq!(result.entries[0].key, "k04999");
        assert_eq!(result.entries.last().map(|e| e.key.as_str()), Some("k07499"));
    }

    #[test]
    fn test_entry_order() {
        let declared = vec![setting("z", "1"), setting("a", "2"), setting("m", "3")];
        let remote = vec![setting("m", "0"), setting("q", "9"), setting("b", "9")];
        let result = detect_diff(&Settings, &declared, &remote);
        let keys: Vec<(DiffKind, &str)> = result
            .entries
            .iter()
            .map(|e| (e.kind, e.key.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (DiffKind::Added, "z"),
                (DiffKind::Added, "a"),
                (DiffKind::Modified, "m"),
                (DiffKind::Deleted, "q"),
                (DiffKind::Deleted, "b"),
            ]
        );
    }

    #[test]
    fn test_duplicates_warn_without_counting() {
        let declared = vec![setting("a", "1"), setting("a", "2")];
        let remote = vec![setting("a", "1")];
        let result = detect_diff(&Settings, &declared, &remote);
        assert!(result.is_empty());
        assert_eq!(result.summary.total(), 0);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("declared settings key 'a'"));
    }

    #[test]
    fn test_domain_warnings_collected() {
        let mut twin = setting("b", "2");
        twin.label = "a";
        let declared = vec![setting("a", "1"), twin];
        let result = detect_diff(&Settings, &declared, &declared);
        assert_eq!(
            result.warnings,
            vec![
                "declared label 'a' is ambiguous".to_string(),
                "remote label 'a' is ambiguous".to_string(),
            ]
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_group_by_kind() {
        let declared = vec![setting("new", "1"), setting("same", "1")];
        let remote = vec![setting("same", "2"), setting("old", "1")];
        let result = detect_diff(&Settings, &declared, &remote);
        let groups = group_by_kind(&result.entries);
        assert_eq!(groups[&DiffKind::Added].len(), 1);
        assert_eq!(groups[&DiffKind::Modified].len(), 1);
        assert_eq!(groups[&DiffKind::Deleted].len(), 1);
    }

    #[test]
    fn test_extend_recomputes_summary() {
        let mut first = detect_diff(&Settings, &vec![setting("a", "1")], &Vec::new());
        let second = detect_diff(&Settings, &Vec::new(), &vec![setting("b", "1")]);
        first.extend(second);
        assert_eq!(first.summary.added, 1);
        assert_eq!(first.summary.deleted, 1);
    }
}

//! Diff domains for form fields and layout
//!
//! Field comparison follows what a declared document means: properties
//! it leaves out are not compared, labels ignore surrounding whitespace,
//! and multi-value defaults compare as sets. Subtable members are keyed
//! by their own code so a change inside a subtable shows up both on the
//! member and on the subtable that holds it. A field that moves between
//! the top level and a subtable is reported with a `subtable` change.

use crate::field::FieldDefinition;
use crate::layout::{Layout, LayoutSlot};
use crate::schema::{FieldSet, Schema};
use declarative::{DiffDomain, DiffResult, PropertyChange, Side, detect_diff};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Properties whose array values compare as sets
const SET_VALUED: [&str; 2] = ["defaultValue", "entities"];

/// Fields of one form, keyed by field code
pub struct FieldsDomain<'a> {
    declared: &'a FieldSet,
    remote: &'a FieldSet,
}

impl<'a> FieldsDomain<'a> {
    pub fn new(declared: &'a FieldSet, remote: &'a FieldSet) -> Self {
        Self { declared, remote }
    }

    fn parent_of(&self, code: &str) -> Option<&str> {
        self.declared
            .parent_of(code)
            .or_else(|| self.remote.parent_of(code))
    }
}

impl DiffDomain for FieldsDomain<'_> {
    type Item = FieldDefinition;
    type Key = String;

    fn name(&self) -> &'static str {
        "fields"
    }

    fn key(&self, item: &FieldDefinition) -> String {
        item.code.clone()
    }

    fn describe(&self, item: &FieldDefinition) -> String {
        let base = format!("{} '{}'", item.field_type(), item.label.trim());
        match self.parent_of(&item.code) {
            Some(parent) => format!("{base} in subtable {parent}"),
            None => base,
        }
    }

    fn compare(&self, declared: &FieldDefinition, remote: &FieldDefinition) -> Vec<PropertyChange> {
        let mut changes = Vec::new();
        let wanted = self.declared.parent_of(&declared.code);
        let current = self.remote.parent_of(&remote.code);
        if wanted != current {
            changes.push(PropertyChange::new("subtable", owner(current), owner(wanted)));
        }
        changes.extend(compare_fields(declared, remote));
        changes
    }

    fn warnings(&self, items: &[&FieldDefinition], side: Side) -> Vec<String> {
        if side != Side::Declared {
            return Vec::new();
        }

        let mut by_label: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for item in items {
            let label = item.label.trim();
            if !label.is_empty() {
                by_label.entry(label).or_default().push(&item.code);
            }
        }
        by_label
            .into_iter()
            .filter(|(_, codes)| codes.len() > 1)
            .map(|(label, codes)| {
                format!("fields {} share the label '{label}'", codes.join(", "))
            })
            .collect()
    }
}

/// Properties that differ between a declared field and its remote counterpart
pub fn compare_fields(declared: &FieldDefinition, remote: &FieldDefinition) -> Vec<PropertyChange> {
    if declared.field_type() != remote.field_type() {
        return vec![PropertyChange::new(
            "type",
            remote.field_type().tag(),
            declared.field_type().tag(),
        )];
    }

    let mut changes = Vec::new();

    let (wanted, current) = (declared.label.trim(), remote.label.trim());
    if wanted != current {
        changes.push(PropertyChange::new("label", quote(current), quote(wanted)));
    }

    if let Some(wanted) = declared.no_label {
        let current = remote.no_label.unwrap_or(false);
        if wanted != current {
            changes.push(PropertyChange::new("noLabel", current.to_string(), wanted.to_string()));
        }
    }

    let remote_props = wire_properties(remote);
    for (name, wanted) in wire_properties(declared) {
        let current = remote_props.get(&name).unwrap_or(&Value::Null);
        if !same_property(&name, &wanted, current) {
            changes.push(PropertyChange::new(name, render(current), render(&wanted)));
        }
    }

    if let (Some(wanted), Some(current)) = (declared.subtable_fields(), remote.subtable_fields()) {
        changes.extend(compare_members(wanted, current));
    }

    changes
}

fn compare_members(
    wanted: &BTreeMap<String, FieldDefinition>,
    current: &BTreeMap<String, FieldDefinition>,
) -> Vec<PropertyChange> {
    let mut changes = Vec::new();

    if !wanted.keys().eq(current.keys()) {
        let codes = |m: &BTreeMap<String, FieldDefinition>| m.keys().cloned().collect::<Vec<_>>().join(", ");
        changes.push(PropertyChange::new("fields", codes(current), codes(wanted)));
    }

    for (code, member) in wanted {
        if let Some(existing) = current.get(code) {
            for change in compare_fields(member, existing) {
                changes.push(PropertyChange::new(
                    format!("fields.{code}.{}", change.property),
                    change.from,
                    change.to,
                ));
            }
        }
    }

    changes
}

/// Modelled properties together with carried unmodelled members
fn wire_properties(field: &FieldDefinition) -> serde_json::Map<String, Value> {
    let mut properties = field.extra.clone();
    properties.extend(field.kind.properties());
    properties
}

fn owner(parent: Option<&str>) -> String {
    parent.map_or_else(|| "(top level)".to_string(), str::to_string)
}

fn same_property(name: &str, wanted: &Value, current: &Value) -> bool {
    match (wanted, current) {
        (Value::Array(a), Value::Array(b)) if SET_VALUED.contains(&name) => {
            let canonical = |values: &[Value]| values.iter().map(Value::to_string).collect::<BTreeSet<_>>();
            canonical(a) == canonical(b)
        }
        _ => wanted == current,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "(unset)".to_string(),
        other => other.to_string(),
    }
}

fn quote(s: &str) -> String {
    format!("'{s}'")
}

/// Layout elements and containers, keyed by identity
pub struct LayoutDomain;

impl DiffDomain for LayoutDomain {
    type Item = LayoutSlot;
    type Key = String;

    fn name(&self) -> &'static str {
        "layout"
    }

    fn key(&self, item: &LayoutSlot) -> String {
        item.key.clone()
    }

    fn describe(&self, item: &LayoutSlot) -> String {
        format!("{} at {}", item.kind, item.position)
    }

    fn compare(&self, declared: &LayoutSlot, remote: &LayoutSlot) -> Vec<PropertyChange> {
        let mut changes = Vec::new();
        if declared.position != remote.position {
            changes.push(PropertyChange::new(
                "position",
                remote.position.clone(),
                declared.position.clone(),
            ));
        }
        // An unstated size leaves the current one alone
        if let Some(wanted) = &declared.size
            && Some(wanted) != remote.size.as_ref()
        {
            let current = remote
                .size
                .as_ref()
                .map_or_else(|| "(default)".to_string(), ToString::to_string);
            changes.push(PropertyChange::new("size", current, wanted.to_string()));
        }
        changes
    }
}

/// Diff of a complete form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub fields: DiffResult<String>,
    pub layout: DiffResult<String>,
    /// Rows, groups, or element order differ (sizes ignored)
    pub layout_changed: bool,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.layout_needs_update()
    }

    /// Whether the declared layout must be written
    pub fn layout_needs_update(&self) -> bool {
        self.layout_changed || !self.layout.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.fields.warnings.iter().chain(&self.layout.warnings)
    }
}

/// Diff declared fields against remote fields
pub fn diff_fields(declared: &FieldSet, remote: &FieldSet) -> DiffResult<String> {
    detect_diff(&FieldsDomain::new(declared, remote), declared.all(), remote.all())
}

/// Diff declared layout against remote layout
pub fn diff_layout(declared: &Layout, remote: &Layout) -> DiffResult<String> {
    let (declared, remote) = (declared.slots(), remote.slots());
    detect_diff(&LayoutDomain, &declared, &remote)
}

/// Whether two layouts differ structurally
pub fn layout_changed(declared: &Layout, remote: &Layout) -> bool {
    declared.signature() != remote.signature()
}

/// Diff a complete declared form against the remote one
pub fn diff_schema(declared: &Schema, remote: &Schema) -> SchemaDiff {
    SchemaDiff {
        fields: diff_fields(&declared.fields, &remote.fields),
        layout: diff_layout(&declared.layout, &remote.layout),
        layout_changed: layout_changed(&declared.layout, &remote.layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{fields_from_wire, layout_from_wire};
    use declarative::DiffKind;
    use serde_json::json;

    fn fields(value: Value) -> FieldSet {
        fields_from_wire(value.as_object().unwrap()).unwrap()
    }

    fn layout(value: Value) -> Layout {
        layout_from_wire(value.as_array().unwrap()).unwrap()
    }

    fn remote_fields() -> FieldSet {
        fields(json!({
            "title": {"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title", "required": true,
                      "unique": false, "maxLength": "64"},
            "tags": {"type": "CHECK_BOX", "code": "tags", "label": "Tags",
                     "options": {"a": {"label": "a", "index": "0"}, "b": {"label": "b", "index": "1"}},
                     "defaultValue": ["a", "b"]},
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "qty": {"type": "NUMBER", "code": "qty", "label": "Qty"},
                "price": {"type": "NUMBER", "code": "price", "label": "Price", "unit": "JPY"}
            }},
            "legacy": {"type": "DATE", "code": "legacy", "label": "Legacy"}
        }))
    }

    #[test]
    fn test_identical_is_empty() {
        let set = remote_fields();
        let diff = diff_fields(&set, &set);
        assert!(diff.is_empty());
        assert!(!diff.summary.has_changes());
    }

    #[test]
    fn test_added_modified_deleted() {
        let declared = fields(json!({
            "title": {"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Subject"},
            "tags": {"type": "CHECK_BOX", "code": "tags", "label": "Tags"},
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "qty": {"type": "NUMBER", "code": "qty", "label": "Qty"},
                "price": {"type": "NUMBER", "code": "price", "label": "Price", "unit": "JPY"}
            }},
            "notes": {"type": "MULTI_LINE_TEXT", "code": "notes", "label": "Notes"}
        }));
        let diff = diff_fields(&declared, &remote_fields());

        assert_eq!(diff.summary.added, 1);
        assert_eq!(diff.summary.modified, 1);
        assert_eq!(diff.summary.deleted, 1);
        assert_eq!(diff.summary.total(), diff.entries.len());

        let modified = diff.of_kind(DiffKind::Modified).next().unwrap();
        assert_eq!(modified.key, "title");
        assert_eq!(modified.description, "label: 'Title' -> 'Subject'");

        let deleted = diff.of_kind(DiffKind::Deleted).next().unwrap();
        assert_eq!(deleted.key, "legacy");
        assert_eq!(deleted.description, "DATE 'Legacy'");
    }

    #[test]
    fn test_label_whitespace_and_no_label_default() {
        let remote = fields(json!({"a": {"type": "DATE", "code": "a", "label": "Due"}}));
        let declared = fields(json!({"a": {"type": "DATE", "code": "a", "label": "  Due ", "noLabel": false}}));
        assert!(diff_fields(&declared, &remote).is_empty());

        let hidden = fields(json!({"a": {"type": "DATE", "code": "a", "label": "Due", "noLabel": true}}));
        let diff = diff_fields(&hidden, &remote);
        assert_eq!(diff.entries[0].changes, vec![PropertyChange::new("noLabel", "false", "true")]);
    }

    #[test]
    fn test_multi_value_default_is_a_set() {
        let declared = fields(json!({
            "tags": {"type": "CHECK_BOX", "code": "tags", "label": "Tags", "defaultValue": ["b", "a"]}
        }));
        let remote = fields(json!({
            "tags": {"type": "CHECK_BOX", "code": "tags", "label": "Tags", "defaultValue": ["a", "b"]}
        }));
        assert!(diff_fields(&declared, &remote).is_empty());
    }

    #[test]
    fn test_option_index_matters() {
        let declared = fields(json!({
            "size": {"type": "DROP_DOWN", "code": "size", "label": "Size",
                     "options": {"S": {"label": "S", "index": "1"}, "M": {"label": "M", "index": "0"}}}
        }));
        let remote = fields(json!({
            "size": {"type": "DROP_DOWN", "code": "size", "label": "Size",
                     "options": {"S": {"label": "S", "index": "0"}, "M": {"label": "M", "index": "1"}}}
        }));
        let diff = diff_fields(&declared, &remote);
        assert_eq!(diff.summary.modified, 1);
        assert_eq!(diff.entries[0].changes[0].property, "options");
    }

    #[test]
    fn test_type_change_is_single_change() {
        let declared = fields(json!({"x": {"type": "NUMBER", "code": "x", "label": "X", "unit": "kg"}}));
        let remote = fields(json!({"x": {"type": "SINGLE_LINE_TEXT", "code": "x", "label": "Y"}}));
        let diff = diff_fields(&declared, &remote);
        assert_eq!(
            diff.entries[0].changes,
            vec![PropertyChange::new("type", "SINGLE_LINE_TEXT", "NUMBER")]
        );
    }

    #[test]
    fn test_subtable_member_change() {
        let declared = fields(json!({
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "qty": {"type": "NUMBER", "code": "qty", "label": "Quantity"},
                "price": {"type": "NUMBER", "code": "price", "label": "Price"},
                "discount": {"type": "NUMBER", "code": "discount", "label": "Discount"}
            }}
        }));
        let remote = fields(json!({
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "qty": {"type": "NUMBER", "code": "qty", "label": "Qty"},
                "price": {"type": "NUMBER", "code": "price", "label": "Price", "unit": "JPY"}
            }}
        }));
        let diff = diff_fields(&declared, &remote);

        let keys: Vec<(DiffKind, &str)> = diff.entries.iter().map(|e| (e.kind, e.key.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (DiffKind::Modified, "items"),
                (DiffKind::Added, "discount"),
                (DiffKind::Modified, "qty"),
            ]
        );
        assert_eq!(diff.entries[1].description, "NUMBER 'Discount' in subtable items");

        let items = &diff.entries[0];
        assert_eq!(items.changes[0].property, "fields");
        assert_eq!(items.changes[0].from, "price, qty");
        assert_eq!(items.changes[0].to, "discount, price, qty");
        assert_eq!(items.changes[1].property, "fields.qty.label");
    }

    #[test]
    fn test_move_out_of_subtable_is_a_change() {
        let declared = fields(json!({
            "qty": {"type": "NUMBER", "code": "qty", "label": "Qty"},
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "sku": {"type": "SINGLE_LINE_TEXT", "code": "sku", "label": "SKU"}
            }}
        }));
        let remote = fields(json!({
            "items": {"type": "SUBTABLE", "code": "items", "label": "Items", "fields": {
                "qty": {"type": "NUMBER", "code": "qty", "label": "Qty"},
                "sku": {"type": "SINGLE_LINE_TEXT", "code": "sku", "label": "SKU"}
            }}
        }));

        let diff = diff_fields(&declared, &remote);
        let qty = diff.entries.iter().find(|e| e.key == "qty").unwrap();
        assert_eq!(qty.kind, DiffKind::Modified);
        assert_eq!(qty.changes, vec![PropertyChange::new("subtable", "items", "(top level)")]);

        // And back the other way
        let reverse = diff_fields(&remote, &declared);
        let qty = reverse.entries.iter().find(|e| e.key == "qty").unwrap();
        assert_eq!(qty.changes[0], PropertyChange::new("subtable", "(top level)", "items"));
    }

    #[test]
    fn test_unmodelled_members_compared_when_declared() {
        let remote = fields(json!({"t": {"type": "SINGLE_LINE_TEXT", "code": "t", "label": "T"}}));
        let declared = fields(json!({"t": {"type": "SINGLE_LINE_TEXT", "code": "t", "label": "T",
                                          "maxlength": "10"}}));
        let diff = diff_fields(&declared, &remote);
        assert_eq!(
            diff.entries[0].changes,
            vec![PropertyChange::new("maxlength", "(unset)", "\"10\"")]
        );
    }

    #[test]
    fn test_numbers_and_numeric_strings_are_equal() {
        let declared = fields(json!({"n": {"type": "NUMBER", "code": "n", "label": "N", "minValue": 0}}));
        let remote = fields(json!({"n": {"type": "NUMBER", "code": "n", "label": "N", "minValue": "0"}}));
        assert!(diff_fields(&declared, &remote).is_empty());
    }

    #[test]
    fn test_duplicate_declared_labels_warn() {
        let declared = fields(json!({
            "a": {"type": "DATE", "code": "a", "label": "Date"},
            "b": {"type": "TIME", "code": "b", "label": "Date "}
        }));
        let diff = diff_fields(&declared, &FieldSet::new());
        assert_eq!(diff.warnings, vec!["fields a, b share the label 'Date'"]);
        assert_eq!(diff.summary.added, 2);
    }

    fn remote_layout() -> Layout {
        layout(json!([
            {"type": "ROW", "fields": [
                {"type": "SINGLE_LINE_TEXT", "code": "title", "size": {"width": "200"}},
                {"type": "SPACER", "elementId": "gap"}
            ]},
            {"type": "ROW", "fields": [{"type": "DATE", "code": "due"}]}
        ]))
    }

    #[test]
    fn test_layout_identical() {
        let diff = diff_layout(&remote_layout(), &remote_layout());
        assert!(diff.is_empty());
        assert!(!layout_changed(&remote_layout(), &remote_layout()));
    }

    #[test]
    fn test_layout_size_only() {
        let declared = layout(json!([
            {"type": "ROW", "fields": [
                {"type": "SINGLE_LINE_TEXT", "code": "title", "size": {"width": "320"}},
                {"type": "SPACER", "elementId": "gap"}
            ]},
            {"type": "ROW", "fields": [{"type": "DATE", "code": "due"}]}
        ]));
        let diff = diff_layout(&declared, &remote_layout());
        assert!(!layout_changed(&declared, &remote_layout()));
        assert_eq!(diff.entries.len(), 1);
        assert_eq!(diff.entries[0].changes, vec![PropertyChange::new("size", "width=200", "width=320")]);
    }

    #[test]
    fn test_layout_move_and_removal() {
        let declared = layout(json!([
            {"type": "ROW", "fields": [{"type": "DATE", "code": "due"}]},
            {"type": "ROW", "fields": [{"type": "SINGLE_LINE_TEXT", "code": "title"}]}
        ]));
        let diff = diff_layout(&declared, &remote_layout());
        assert!(layout_changed(&declared, &remote_layout()));

        let due = diff.entries.iter().find(|e| e.key == "due").unwrap();
        assert_eq!(due.changes, vec![PropertyChange::new("position", "row 2/column 1", "row 1/column 1")]);
        let gap = diff.entries.iter().find(|e| e.key == "spacer:gap").unwrap();
        assert_eq!(gap.kind, DiffKind::Deleted);
    }

    #[test]
    fn test_schema_diff() {
        let remote = Schema {
            fields: remote_fields(),
            layout: remote_layout(),
        };
        assert!(diff_schema(&remote, &remote).is_empty());

        let mut declared = remote.clone();
        declared.layout.items.reverse();
        let diff = diff_schema(&declared, &remote);
        assert!(diff.fields.is_empty());
        assert!(diff.layout_changed);
        assert!(diff.layout_needs_update());
        assert!(!diff.is_empty());
    }
}

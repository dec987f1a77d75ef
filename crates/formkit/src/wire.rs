//! Conversion between the typed model and the service's JSON shapes
//!
//! Reading is strict: an unknown type tag, a missing required member, or
//! a member of the wrong shape is an error rather than something to skip.
//! System fields are the one exception; they are read-only and dropped
//! from the field model.

use crate::backend::{WireFields, WireLayout};
use crate::element::{ElementTag, FieldType};
use crate::error::{Error, Result};
use crate::field::{FieldDefinition, FieldKind, SubtableProps};
use crate::layout::{ElementSize, Layout, LayoutElement, LayoutItem};
use crate::schema::FieldSet;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Members shared by every field definition
const COMMON_MEMBERS: [&str; 4] = ["type", "code", "label", "noLabel"];

/// Convert a wire field map into a field set
///
/// System fields are dropped. Fields are added in code order.
pub fn fields_from_wire(fields: &WireFields) -> Result<FieldSet> {
    let mut set = FieldSet::new();
    let mut dropped = 0;
    for value in fields.values() {
        match parse_field(value, "field definition")? {
            Some(field) => {
                set.insert(field);
            }
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("Dropped {dropped} system field(s) from the field model");
    }
    Ok(set)
}

/// Convert a single wire field definition
///
/// Returns `None` for system fields.
pub fn field_from_wire(value: &Value) -> Result<Option<FieldDefinition>> {
    parse_field(value, "field definition")
}

/// Convert fields into a wire field map keyed by code
pub fn fields_to_wire<'a>(fields: impl IntoIterator<Item = &'a FieldDefinition>) -> WireFields {
    fields
        .into_iter()
        .map(|f| (f.code.clone(), field_to_wire(f)))
        .collect()
}

/// Convert one field into its wire definition
pub fn field_to_wire(field: &FieldDefinition) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), Value::from(field.field_type().tag()));
    object.insert("code".into(), Value::from(field.code.clone()));
    object.insert("label".into(), Value::from(field.label.clone()));
    if let Some(no_label) = field.no_label {
        object.insert("noLabel".into(), Value::from(no_label));
    }
    object.extend(field.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    object.extend(field.kind.properties());
    if let Some(inner) = field.subtable_fields() {
        object.insert("fields".into(), Value::Object(fields_to_wire(inner.values())));
    }
    Value::Object(object)
}

fn parse_field(value: &Value, context: &'static str) -> Result<Option<FieldDefinition>> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::malformed(context, format!("expected an object, found {value}")))?;
    let tag = required_str(object, "type", context)?;

    let field_type = match ElementTag::parse(tag) {
        Some(ElementTag::Field(field_type)) => field_type,
        Some(ElementTag::System(_)) => return Ok(None),
        Some(_) => {
            return Err(Error::UnexpectedElementType {
                tag: tag.to_string(),
                context,
            });
        }
        None => {
            return Err(Error::UnknownElementType {
                tag: tag.to_string(),
                context,
            });
        }
    };

    let code = required_str(object, "code", context)?.to_string();
    let label = optional_str(object, "label", &code)?.unwrap_or_default();
    let no_label = match object.get("noLabel") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => return Err(Error::malformed(&code, format!("noLabel must be a boolean, found {other}"))),
    };

    let mut rest: Map<String, Value> = object
        .iter()
        .filter(|(k, _)| !COMMON_MEMBERS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let kind = match field_type {
        FieldType::SingleLineText => FieldKind::SingleLineText(props(&code, &rest)?),
        FieldType::MultiLineText => FieldKind::MultiLineText(props(&code, &rest)?),
        FieldType::RichText => FieldKind::RichText(props(&code, &rest)?),
        FieldType::Number => FieldKind::Number(props(&code, &rest)?),
        FieldType::Calc => FieldKind::Calc(props(&code, &rest)?),
        FieldType::CheckBox => FieldKind::CheckBox(props(&code, &rest)?),
        FieldType::RadioButton => FieldKind::RadioButton(props(&code, &rest)?),
        FieldType::DropDown => FieldKind::DropDown(props(&code, &rest)?),
        FieldType::MultiSelect => FieldKind::MultiSelect(props(&code, &rest)?),
        FieldType::Date => FieldKind::Date(props(&code, &rest)?),
        FieldType::Time => FieldKind::Time(props(&code, &rest)?),
        FieldType::DateTime => FieldKind::DateTime(props(&code, &rest)?),
        FieldType::Link => FieldKind::Link(props(&code, &rest)?),
        FieldType::UserSelect => FieldKind::UserSelect(props(&code, &rest)?),
        FieldType::OrganizationSelect => FieldKind::OrganizationSelect(props(&code, &rest)?),
        FieldType::GroupSelect => FieldKind::GroupSelect(props(&code, &rest)?),
        FieldType::File => FieldKind::File(props(&code, &rest)?),
        FieldType::Group => FieldKind::Group(props(&code, &rest)?),
        FieldType::Subtable => FieldKind::Subtable(subtable(&code, &rest)?),
        FieldType::ReferenceTable => {
            if !rest.contains_key("referenceTable") {
                return Err(Error::MissingProperty {
                    element: code,
                    property: "referenceTable",
                });
            }
            FieldKind::ReferenceTable(props(&code, &rest)?)
        }
    };

    // Whatever the typed properties did not take is carried as is
    let known = kind.properties();
    rest.retain(|member, _| !known.contains_key(member));
    if kind.field_type() == FieldType::Subtable {
        rest.remove("fields");
    }
    if !rest.is_empty() {
        log::debug!(
            "Field {code}: keeping unmodelled member(s) {}",
            rest.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(Some(FieldDefinition {
        code,
        label,
        no_label,
        kind,
        extra: rest,
    }))
}

fn props<T: DeserializeOwned>(code: &str, rest: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(rest.clone())).map_err(|e| Error::malformed(code, e.to_string()))
}

fn subtable(code: &str, rest: &Map<String, Value>) -> Result<SubtableProps> {
    let members = match rest.get("fields") {
        Some(Value::Object(members)) => members,
        Some(other) => {
            return Err(Error::malformed(code, format!("subtable fields must be an object, found {other}")));
        }
        None => {
            return Err(Error::MissingProperty {
                element: code.to_string(),
                property: "fields",
            });
        }
    };

    let mut fields = BTreeMap::new();
    for value in members.values() {
        let Some(field) = parse_field(value, "subtable field")? else {
            continue;
        };
        if field.field_type().is_container() {
            return Err(Error::UnexpectedElementType {
                tag: field.field_type().tag().to_string(),
                context: "subtable field",
            });
        }
        fields.insert(field.code.clone(), field);
    }
    Ok(SubtableProps { fields })
}

/// Convert a wire layout into the typed layout
pub fn layout_from_wire(items: &[Value]) -> Result<Layout> {
    items.iter().map(parse_item).collect::<Result<Vec<_>>>().map(Layout::new)
}

/// Convert the typed layout into wire items
pub fn layout_to_wire(layout: &Layout) -> WireLayout {
    layout.items.iter().map(item_to_wire).collect()
}

fn parse_item(value: &Value) -> Result<LayoutItem> {
    let context = "layout item";
    let object = value
        .as_object()
        .ok_or_else(|| Error::malformed(context, format!("expected an object, found {value}")))?;
    let tag = required_str(object, "type", context)?;

    match tag {
        "ROW" => Ok(LayoutItem::Row(parse_elements(object, "fields", "ROW")?)),
        "GROUP" => {
            let code = required_str(object, "code", context)?.to_string();
            let rows = required_array(object, "layout", &code)?
                .iter()
                .map(|row| match parse_item(row)? {
                    LayoutItem::Row(elements) => Ok(elements),
                    _ => Err(Error::malformed(&code, "group layout may only contain rows")),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(LayoutItem::Group { code, rows })
        }
        "SUBTABLE" => {
            let code = required_str(object, "code", context)?.to_string();
            let elements = parse_elements(object, "fields", &code)?;
            Ok(LayoutItem::Subtable { code, elements })
        }
        "REFERENCE_TABLE" => {
            let code = required_str(object, "code", context)?.to_string();
            let size = parse_size(object, &code)?;
            Ok(LayoutItem::ReferenceTable { code, size })
        }
        _ => Err(Error::UnknownElementType {
            tag: tag.to_string(),
            context,
        }),
    }
}

fn parse_elements(object: &Map<String, Value>, member: &'static str, owner: &str) -> Result<Vec<LayoutElement>> {
    required_array(object, member, owner)?
        .iter()
        .map(parse_element)
        .collect()
}

fn parse_element(value: &Value) -> Result<LayoutElement> {
    let context = "layout element";
    let object = value
        .as_object()
        .ok_or_else(|| Error::malformed(context, format!("expected an object, found {value}")))?;
    let tag = required_str(object, "type", context)?;
    let size = parse_size(object, tag)?;
    let element_id = optional_str(object, "elementId", tag)?;

    match ElementTag::parse(tag) {
        Some(ElementTag::Field(field_type)) if !field_type.is_container() => Ok(LayoutElement::Field {
            field_type,
            code: required_str(object, "code", tag)?.to_string(),
            size,
        }),
        Some(ElementTag::System(system_type)) => Ok(LayoutElement::System {
            system_type,
            code: optional_str(object, "code", tag)?,
            size,
        }),
        Some(ElementTag::Label) => Ok(LayoutElement::Label {
            label: required_str(object, "label", tag)?.to_string(),
            element_id,
            size,
        }),
        Some(ElementTag::Spacer) => Ok(LayoutElement::Spacer { element_id, size }),
        Some(ElementTag::Hr) => Ok(LayoutElement::Hr { element_id, size }),
        Some(ElementTag::Field(_)) => Err(Error::UnexpectedElementType {
            tag: tag.to_string(),
            context,
        }),
        None => Err(Error::UnknownElementType {
            tag: tag.to_string(),
            context,
        }),
    }
}

fn parse_size(object: &Map<String, Value>, owner: &str) -> Result<Option<ElementSize>> {
    match object.get("size") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| Error::malformed(owner, format!("invalid size: {e}"))),
    }
}

fn item_to_wire(item: &LayoutItem) -> Value {
    let mut object = Map::new();
    match item {
        LayoutItem::Row(elements) => {
            object.insert("type".into(), Value::from("ROW"));
            object.insert("fields".into(), elements_to_wire(elements));
        }
        LayoutItem::Group { code, rows } => {
            object.insert("type".into(), Value::from("GROUP"));
            object.insert("code".into(), Value::from(code.clone()));
            let rows = rows
                .iter()
                .map(|elements| item_to_wire(&LayoutItem::Row(elements.clone())))
                .collect();
            object.insert("layout".into(), Value::Array(rows));
        }
        LayoutItem::Subtable { code, elements } => {
            object.insert("type".into(), Value::from("SUBTABLE"));
            object.insert("code".into(), Value::from(code.clone()));
            object.insert("fields".into(), elements_to_wire(elements));
        }
        LayoutItem::ReferenceTable { code, size } => {
            object.insert("type".into(), Value::from("REFERENCE_TABLE"));
            object.insert("code".into(), Value::from(code.clone()));
            insert_size(&mut object, size.as_ref());
        }
    }
    Value::Object(object)
}

fn elements_to_wire(elements: &[LayoutElement]) -> Value {
    Value::Array(elements.iter().map(element_to_wire).collect())
}

fn element_to_wire(element: &LayoutElement) -> Value {
    fn insert_id(object: &mut Map<String, Value>, id: &Option<String>) {
        if let Some(id) = id {
            object.insert("elementId".into(), Value::from(id.clone()));
        }
    }

    let mut object = Map::new();
    match element {
        LayoutElement::Field { field_type, code, .. } => {
            object.insert("type".into(), Value::from(field_type.tag()));
            object.insert("code".into(), Value::from(code.clone()));
        }
        LayoutElement::System { system_type, code, .. } => {
            object.insert("type".into(), Value::from(system_type.tag()));
            if let Some(code) = code {
                object.insert("code".into(), Value::from(code.clone()));
            }
        }
        LayoutElement::Label { label, element_id, .. } => {
            object.insert("type".into(), Value::from("LABEL"));
            object.insert("label".into(), Value::from(label.clone()));
            insert_id(&mut object, element_id);
        }
        LayoutElement::Spacer { element_id, .. } => {
            object.insert("type".into(), Value::from("SPACER"));
            insert_id(&mut object, element_id);
        }
        LayoutElement::Hr { element_id, .. } => {
            object.insert("type".into(), Value::from("HR"));
            insert_id(&mut object, element_id);
        }
    }
    insert_size(&mut object, element.size());
    Value::Object(object)
}

fn insert_size(object: &mut Map<String, Value>, size: Option<&ElementSize>) {
    if let Some(size) = size
        && let Ok(value) = serde_json::to_value(size)
    {
        object.insert("size".into(), value);
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, member: &'static str, owner: &str) -> Result<&'a str> {
    match object.get(member) {
        Some(Value::String(s)) => Ok(s),
        None | Some(Value::Null) => Err(Error::MissingProperty {
            element: owner.to_string(),
            property: member,
        }),
        Some(other) => Err(Error::malformed(owner, format!("{member} must be a string, found {other}"))),
    }
}

fn optional_str(object: &Map<String, Value>, member: &'static str, owner: &str) -> Result<Option<String>> {
    match object.get(member) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::malformed(owner, format!("{member} must be a string, found {other}"))),
    }
}

fn required_array<'a>(object: &'a Map<String, Value>, member: &'static str, owner: &str) -> Result<&'a Vec<Value>> {
    match object.get(member) {
        Some(Value::Array(items)) => Ok(items),
        None | Some(Value::Null) => Err(Error::MissingProperty {
            element: owner.to_string(),
            property: member,
        }),
        Some(other) => Err(Error::malformed(owner, format!("{member} must be an array, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(value: Value) {
        let field = field_from_wire(&value).unwrap().unwrap();
        assert_eq!(field_to_wire(&field), value, "round trip of {}", field.code);
    }

    #[test]
    fn test_every_field_type_round_trips() {
        let samples = vec![
            json!({"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title", "required": true,
                   "maxLength": "64", "unique": false}),
            json!({"type": "MULTI_LINE_TEXT", "code": "notes", "label": "Notes", "defaultValue": "n/a"}),
            json!({"type": "RICH_TEXT", "code": "body", "label": "Body", "noLabel": true}),
            json!({"type": "NUMBER", "code": "qty", "label": "Qty", "minValue": "0", "digit": true,
                   "unit": "pcs", "unitPosition": "AFTER"}),
            json!({"type": "CALC", "code": "total", "label": "Total", "expression": "qty * price",
                   "format": "NUMBER_DIGIT", "displayScale": "2"}),
            json!({"type": "CHECK_BOX", "code": "tags", "label": "Tags", "align": "HORIZONTAL",
                   "options": {"a": {"label": "a", "index": "0"}, "b": {"label": "b", "index": "1"}},
                   "defaultValue": ["a"]}),
            json!({"type": "RADIO_BUTTON", "code": "size", "label": "Size", "required": true,
                   "options": {"S": {"label": "S", "index": "0"}}, "defaultValue": "S"}),
            json!({"type": "DROP_DOWN", "code": "tier", "label": "Tier",
                   "options": {"gold": {"label": "gold", "index": "0"}}, "defaultValue": ""}),
            json!({"type": "MULTI_SELECT", "code": "areas", "label": "Areas", "defaultValue": []}),
            json!({"type": "DATE", "code": "due", "label": "Due", "defaultNowValue": true}),
            json!({"type": "TIME", "code": "at", "label": "At"}),
            json!({"type": "DATETIME", "code": "when", "label": "When", "unique": true}),
            json!({"type": "LINK", "code": "site", "label": "Site", "protocol": "WEB"}),
            json!({"type": "USER_SELECT", "code": "owner", "label": "Owner",
                   "entities": [{"type": "USER", "code": "sato"}],
                   "defaultValue": [{"type": "FUNCTION", "code": "LOGINUSER()"}]}),
            json!({"type": "ORGANIZATION_SELECT", "code": "org", "label": "Org"}),
            json!({"type": "GROUP_SELECT", "code": "team", "label": "Team"}),
            json!({"type": "FILE", "code": "attachment", "label": "Attachment", "thumbnailSize": "150"}),
            json!({"type": "GROUP", "code": "details", "label": "Details", "openGroup": false}),
        ];
        for sample in samples {
            round_trip(sample);
        }
    }

    #[test]
    fn test_unmodelled_members_are_kept() {
        let value = json!({"type": "SINGLE_LINE_TEXT", "code": "t", "label": "T", "maxlength": "10",
                           "required": true});
        let field = field_from_wire(&value).unwrap().unwrap();
        assert_eq!(field.extra.get("maxlength"), Some(&json!("10")));
        assert!(!field.extra.contains_key("required"));
        round_trip(value);

        round_trip(json!({"type": "SUBTABLE", "code": "items", "label": "Items", "enabled": true,
                          "fields": {"n": {"type": "NUMBER", "code": "n", "label": "N", "hint": 3}}}));
    }

    #[test]
    fn test_numeric_members_normalize_to_strings() {
        let field = field_from_wire(&json!({"type": "NUMBER", "code": "n", "label": "N", "minValue": 0}))
            .unwrap()
            .unwrap();
        assert!(field.extra.is_empty());
        assert_eq!(field_to_wire(&field)["minValue"], json!("0"));
    }

    #[test]
    fn test_subtable_round_trip_with_absent_optionals() {
        round_trip(json!({
            "type": "SUBTABLE",
            "code": "items",
            "label": "",
            "fields": {
                "price": {"type": "NUMBER", "code": "price", "label": "Price"},
                "sku": {"type": "SINGLE_LINE_TEXT", "code": "sku", "label": "SKU", "required": true}
            }
        }));
    }

    #[test]
    fn test_reference_table_round_trip() {
        round_trip(json!({
            "type": "REFERENCE_TABLE",
            "code": "orders",
            "label": "Orders",
            "noLabel": false,
            "referenceTable": {
                "relatedApp": {"app": "34"},
                "condition": {"field": "customer_id", "relatedField": "customer"}
            }
        }));
        round_trip(json!({
            "type": "REFERENCE_TABLE",
            "code": "recent",
            "label": "Recent",
            "referenceTable": {
                "relatedApp": {"app": "34", "code": "orders"},
                "condition": {"field": "customer_id", "relatedField": "customer"},
                "filterCond": "status in (\"open\")",
                "displayFields": ["order_no", "total"],
                "sort": "date desc",
                "size": "5"
            }
        }));
    }

    #[test]
    fn test_lookup_round_trip() {
        round_trip(json!({
            "type": "SINGLE_LINE_TEXT",
            "code": "customer",
            "label": "Customer",
            "lookup": {
                "relatedApp": {"app": "12"},
                "relatedKeyField": "name",
                "fieldMappings": [{"field": "phone", "relatedField": "tel"}],
                "lookupPickerFields": ["name", "tel"]
            }
        }));
    }

    #[test]
    fn test_single_choice_list_default_reduced() {
        let field = field_from_wire(&json!({
            "type": "DROP_DOWN", "code": "tier", "label": "Tier", "defaultValue": ["gold", "silver"]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(field_to_wire(&field)["defaultValue"], json!("gold"));
    }

    #[test]
    fn test_unknown_tag_is_error() {
        let err = field_from_wire(&json!({"type": "HOLOGRAM", "code": "x", "label": "X"})).unwrap_err();
        assert!(matches!(err, Error::UnknownElementType { ref tag, .. } if tag == "HOLOGRAM"));
        assert_eq!(err.category(), crate::ErrorCategory::System);
    }

    #[test]
    fn test_decoration_is_not_a_field() {
        let err = field_from_wire(&json!({"type": "LABEL", "code": "x", "label": "X"})).unwrap_err();
        assert!(matches!(err, Error::UnexpectedElementType { .. }));
    }

    #[test]
    fn test_system_fields_dropped() {
        let wire = json!({
            "record_no": {"type": "RECORD_NUMBER", "code": "record_no", "label": "Record number"},
            "creator": {"type": "CREATOR", "code": "creator", "label": "Created by"},
            "title": {"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title"}
        });
        let set = fields_from_wire(wire.as_object().unwrap()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("title"));
        assert!(!set.contains("creator"));
    }

    #[test]
    fn test_missing_members() {
        let err = field_from_wire(&json!({"type": "NUMBER", "label": "X"})).unwrap_err();
        assert!(matches!(err, Error::MissingProperty { property: "code", .. }));

        let err = field_from_wire(&json!({"type": "REFERENCE_TABLE", "code": "r", "label": "R"})).unwrap_err();
        assert!(matches!(err, Error::MissingProperty { property: "referenceTable", .. }));

        let err = field_from_wire(&json!({"type": "SUBTABLE", "code": "t", "label": "T"})).unwrap_err();
        assert!(matches!(err, Error::MissingProperty { property: "fields", .. }));
    }

    #[test]
    fn test_nested_subtable_rejected() {
        let err = field_from_wire(&json!({
            "type": "SUBTABLE", "code": "outer", "label": "Outer",
            "fields": {"inner": {"type": "SUBTABLE", "code": "inner", "label": "Inner", "fields": {}}}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedElementType { .. }));
    }

    #[test]
    fn test_layout_round_trip() {
        let wire = json!([
            {"type": "ROW", "fields": [
                {"type": "SINGLE_LINE_TEXT", "code": "title", "size": {"width": "240"}},
                {"type": "LABEL", "label": "<b>Info</b>", "elementId": "l1", "size": {"width": "100"}},
                {"type": "SPACER", "elementId": "s1", "size": {"width": "20", "height": "10"}},
                {"type": "RECORD_NUMBER", "code": "record_no"}
            ]},
            {"type": "ROW", "fields": [{"type": "HR", "size": {"width": "600"}}]},
            {"type": "GROUP", "code": "details", "layout": [
                {"type": "ROW", "fields": [
                    {"type": "MULTI_LINE_TEXT", "code": "notes", "size": {"width": "400", "innerHeight": "120"}}
                ]}
            ]},
            {"type": "SUBTABLE", "code": "items", "fields": [
                {"type": "NUMBER", "code": "qty", "size": {"width": "80"}}
            ]},
            {"type": "REFERENCE_TABLE", "code": "orders"}
        ]);
        let items = wire.as_array().unwrap();
        let layout = layout_from_wire(items).unwrap();
        assert_eq!(layout.items.len(), 5);
        assert_eq!(Value::Array(layout_to_wire(&layout)), wire);
    }

    #[test]
    fn test_layout_unknown_tags() {
        let err = layout_from_wire(&[json!({"type": "COLUMN", "fields": []})]).unwrap_err();
        assert!(matches!(err, Error::UnknownElementType { context: "layout item", .. }));

        let err = layout_from_wire(&[json!({"type": "ROW", "fields": [{"type": "WIDGET"}]})]).unwrap_err();
        assert!(matches!(err, Error::UnknownElementType { context: "layout element", .. }));
    }

    #[test]
    fn test_group_may_only_hold_rows() {
        let err = layout_from_wire(&[json!({
            "type": "GROUP", "code": "g",
            "layout": [{"type": "REFERENCE_TABLE", "code": "r"}]
        })])
        .unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }
}

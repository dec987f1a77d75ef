//! Typed field definitions
//!
//! Each field type carries its own property struct. Every property is
//! optional and omitted from the wire form when absent, so a definition
//! that states only a few properties round-trips without gaining any.
//! Members the property structs do not model are kept in
//! [`FieldDefinition::extra`] and written back unchanged.
//!
//! Numeric properties (`minValue`, `maxLength`, `displayScale`, option
//! `index`, ...) are held as strings, the form the service itself writes.
//! A bare JSON number is accepted and normalized, so `0` and `"0"` are the
//! same value.

use crate::element::FieldType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One field of an application form
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Unique field code
    pub code: String,
    pub label: String,
    /// Hide the label on the form
    pub no_label: Option<bool>,
    pub kind: FieldKind,
    /// Wire members no property struct models, kept as read
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(code: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            no_label: None,
            kind,
            extra: Map::new(),
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Inner fields, if this is a subtable
    pub fn subtable_fields(&self) -> Option<&BTreeMap<String, FieldDefinition>> {
        match &self.kind {
            FieldKind::Subtable(table) => Some(&table.fields),
            _ => None,
        }
    }
}

/// Field type together with its type-specific properties
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    SingleLineText(TextProps),
    MultiLineText(LongTextProps),
    RichText(LongTextProps),
    Number(NumberProps),
    Calc(CalcProps),
    CheckBox(MultiChoiceProps),
    RadioButton(SingleChoiceProps),
    DropDown(SingleChoiceProps),
    MultiSelect(MultiChoiceProps),
    Date(DateTimeProps),
    Time(DateTimeProps),
    DateTime(DateTimeProps),
    Link(LinkProps),
    UserSelect(EntitySelectProps),
    OrganizationSelect(EntitySelectProps),
    GroupSelect(EntitySelectProps),
    File(FileProps),
    Group(GroupProps),
    Subtable(SubtableProps),
    ReferenceTable(ReferenceTableProps),
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::SingleLineText(_) => FieldType::SingleLineText,
            Self::MultiLineText(_) => FieldType::MultiLineText,
            Self::RichText(_) => FieldType::RichText,
            Self::Number(_) => FieldType::Number,
            Self::Calc(_) => FieldType::Calc,
            Self::CheckBox(_) => FieldType::CheckBox,
            Self::RadioButton(_) => FieldType::RadioButton,
            Self::DropDown(_) => FieldType::DropDown,
            Self::MultiSelect(_) => FieldType::MultiSelect,
            Self::Date(_) => FieldType::Date,
            Self::Time(_) => FieldType::Time,
            Self::DateTime(_) => FieldType::DateTime,
            Self::Link(_) => FieldType::Link,
            Self::UserSelect(_) => FieldType::UserSelect,
            Self::OrganizationSelect(_) => FieldType::OrganizationSelect,
            Self::GroupSelect(_) => FieldType::GroupSelect,
            Self::File(_) => FieldType::File,
            Self::Group(_) => FieldType::Group,
            Self::Subtable(_) => FieldType::Subtable,
            Self::ReferenceTable(_) => FieldType::ReferenceTable,
        }
    }

    /// Type-specific properties as a JSON object
    ///
    /// Absent properties are not present in the map. Subtable inner
    /// fields are not included.
    pub fn properties(&self) -> Map<String, Value> {
        match self {
            Self::SingleLineText(p) => to_object(p),
            Self::MultiLineText(p) | Self::RichText(p) => to_object(p),
            Self::Number(p) => to_object(p),
            Self::Calc(p) => to_object(p),
            Self::CheckBox(p) | Self::MultiSelect(p) => to_object(p),
            Self::RadioButton(p) | Self::DropDown(p) => to_object(p),
            Self::Date(p) | Self::Time(p) | Self::DateTime(p) => to_object(p),
            Self::Link(p) => to_object(p),
            Self::UserSelect(p) | Self::OrganizationSelect(p) | Self::GroupSelect(p) => {
                to_object(p)
            }
            Self::File(p) => to_object(p),
            Self::Group(p) => to_object(p),
            Self::Subtable(_) => Map::new(),
            Self::ReferenceTable(p) => to_object(p),
        }
    }
}

fn to_object<T: Serialize>(props: &T) -> Map<String, Value> {
    match serde_json::to_value(props) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// `SINGLE_LINE_TEXT`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    /// Auto-calculation formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_expression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Lookup>,
}

/// `MULTI_LINE_TEXT` and `RICH_TEXT`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTextProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// `NUMBER`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
    /// Thousands separator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digit: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub display_scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Lookup>,
}

/// `CALC`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub display_scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_expression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_position: Option<String>,
}

/// One choice of a selection field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    /// Display position
    #[serde(deserialize_with = "scalar")]
    pub index: String,
}

/// `RADIO_BUTTON` and `DROP_DOWN`
///
/// The default value is always a single string on this side; a list on
/// the wire is reduced to its first element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleChoiceProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, SelectOption>>,
    #[serde(default, deserialize_with = "single_choice", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

/// `CHECK_BOX` and `MULTI_SELECT`
///
/// The default value is always a list; a scalar on the wire becomes a
/// one-element list (or an empty one if it is the empty string).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChoiceProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, SelectOption>>,
    #[serde(default, deserialize_with = "multi_choice", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

/// `DATE`, `TIME` and `DATETIME`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_now_value: Option<bool>,
}

/// `LINK`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    /// `WEB`, `CALL` or `MAIL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// A user, group, or organization reference
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

/// `USER_SELECT`, `ORGANIZATION_SELECT` and `GROUP_SELECT`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySelectProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Selectable candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Vec<Entity>>,
}

/// `FILE`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub thumbnail_size: Option<String>,
}

/// `GROUP`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_group: Option<bool>,
}

/// `SUBTABLE`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtableProps {
    /// Inner fields keyed by code
    pub fields: BTreeMap<String, FieldDefinition>,
}

/// Another application a lookup or reference table points at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedApp {
    #[serde(deserialize_with = "scalar")]
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Copies a value from the related app into a field of this app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub field: String,
    pub related_field: String,
}

/// Lookup descriptor on text and number fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookup {
    pub related_app: RelatedApp,
    pub related_key_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mappings: Option<Vec<FieldMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_picker_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Which related records a reference table shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCondition {
    pub field: String,
    pub related_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTable {
    pub related_app: RelatedApp,
    pub condition: ReferenceCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Records shown per page
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// `REFERENCE_TABLE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTableProps {
    pub reference_table: ReferenceTable,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<String>),
    One(String),
}

/// The service writes numeric properties as strings; accept bare numbers too
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

pub(crate) fn opt_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

fn single_choice<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(s) => s,
            OneOrMany::Many(list) => list.into_iter().next().unwrap_or_default(),
        }),
    )
}

fn multi_choice<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::Many(list) => list,
            OneOrMany::One(s) if s.is_empty() => Vec::new(),
            OneOrMany::One(s) => vec![s],
        }),
    )
}

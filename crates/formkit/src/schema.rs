//! Field sets and complete form schemas

use crate::field::FieldDefinition;
use crate::layout::Layout;
use std::collections::BTreeMap;

/// All fields of a form
///
/// Top-level fields keep their insertion order. Fields inside a subtable
/// are reachable by code as well, and remember which subtable holds them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<FieldDefinition>,
    parents: BTreeMap<String, String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level field, returning any field it replaced
    pub fn insert(&mut self, field: FieldDefinition) -> Option<FieldDefinition> {
        if let Some(inner) = field.subtable_fields() {
            for code in inner.keys() {
                self.parents.insert(code.clone(), field.code.clone());
            }
        }

        match self.fields.iter_mut().find(|f| f.code == field.code) {
            Some(existing) => {
                let replaced = std::mem::replace(existing, field);
                if let Some(old_inner) = replaced.subtable_fields() {
                    let still_inner = existing.subtable_fields();
                    for inner_code in old_inner.keys() {
                        if still_inner.is_none_or(|m| !m.contains_key(inner_code)) {
                            self.parents.remove(inner_code);
                        }
                    }
                }
                log::debug!("Replaced field '{}'", existing.code);
                Some(replaced)
            }
            None => {
                self.fields.push(field);
                None
            }
        }
    }

    /// Look up any field by code, including subtable members
    pub fn get(&self, code: &str) -> Option<&FieldDefinition> {
        match self.parents.get(code) {
            Some(parent) => self
                .top_level_field(parent)
                .and_then(|p| p.subtable_fields())
                .and_then(|inner| inner.get(code)),
            None => self.top_level_field(code),
        }
    }

    fn top_level_field(&self, code: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Subtable holding `code`, if it is a subtable member
    pub fn parent_of(&self, code: &str) -> Option<&str> {
        self.parents.get(code).map(String::as_str)
    }

    /// Top-level fields in insertion order
    pub fn top_level(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    /// Every field, each subtable followed by its members
    pub fn all(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().flat_map(|field| {
            std::iter::once(field).chain(field.subtable_fields().into_iter().flat_map(|m| m.values()))
        })
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldDefinition> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldDefinition>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

/// Fields and layout of one form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: FieldSet,
    pub layout: Layout,
}

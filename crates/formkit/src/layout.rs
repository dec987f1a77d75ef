//! Form layout model
//!
//! A layout is an ordered list of items. Rows hold elements left to
//! right; groups hold rows; subtables hold one row of their inner
//! fields; reference tables stand alone.

use crate::element::{FieldType, SystemType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display size of a layout element; every dimension is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSize {
    #[serde(default, deserialize_with = "crate::field::opt_scalar", skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "crate::field::opt_scalar", skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "crate::field::opt_scalar", skip_serializing_if = "Option::is_none")]
    pub inner_height: Option<String>,
}

impl ElementSize {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.inner_height.is_none()
    }
}

impl fmt::Display for ElementSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("width", &self.width),
            ("height", &self.height),
            ("innerHeight", &self.inner_height),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
        .collect();

        if parts.is_empty() {
            write!(f, "(default)")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// One element inside a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutElement {
    /// Reference to a field by code
    Field {
        field_type: FieldType,
        code: String,
        size: Option<ElementSize>,
    },
    /// Placeholder for a read-only system field
    System {
        system_type: SystemType,
        code: Option<String>,
        size: Option<ElementSize>,
    },
    Label {
        label: String,
        element_id: Option<String>,
        size: Option<ElementSize>,
    },
    Spacer {
        element_id: Option<String>,
        size: Option<ElementSize>,
    },
    Hr {
        element_id: Option<String>,
        size: Option<ElementSize>,
    },
}

impl LayoutElement {
    pub fn field(field_type: FieldType, code: impl Into<String>) -> Self {
        Self::Field {
            field_type,
            code: code.into(),
            size: None,
        }
    }

    pub fn size(&self) -> Option<&ElementSize> {
        match self {
            Self::Field { size, .. }
            | Self::System { size, .. }
            | Self::Label { size, .. }
            | Self::Spacer { size, .. }
            | Self::Hr { size, .. } => size.as_ref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Field { .. } => "field",
            Self::System { .. } => "system field",
            Self::Label { .. } => "label",
            Self::Spacer { .. } => "spacer",
            Self::Hr { .. } => "hr",
        }
    }

    /// Stable identity, independent of position when possible
    fn identity(&self) -> Option<String> {
        match self {
            Self::Field { code, .. } => Some(code.clone()),
            Self::System { system_type, .. } => Some(format!("system:{system_type}")),
            Self::Label { label, .. } => Some(format!("label:{}", label.trim())),
            Self::Spacer { element_id, .. } => element_id.as_ref().map(|id| format!("spacer:{id}")),
            Self::Hr { element_id, .. } => element_id.as_ref().map(|id| format!("hr:{id}")),
        }
    }

    fn key(&self, position: &str) -> String {
        self.identity()
            .unwrap_or_else(|| format!("{}@{position}", self.kind()))
    }

    fn signature_token(&self) -> String {
        self.identity().unwrap_or_else(|| self.kind().to_string())
    }
}

/// One top-level layout item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutItem {
    Row(Vec<LayoutElement>),
    Group {
        code: String,
        rows: Vec<Vec<LayoutElement>>,
    },
    Subtable {
        code: String,
        elements: Vec<LayoutElement>,
    },
    ReferenceTable {
        code: String,
        size: Option<ElementSize>,
    },
}

/// A flattened, keyed view of one element or container for diffing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSlot {
    pub key: String,
    /// Where the element sits, e.g. `row 2/column 1`
    pub position: String,
    pub size: Option<ElementSize>,
    pub kind: &'static str,
}

/// Complete form layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub items: Vec<LayoutItem>,
}

impl Layout {
    pub fn new(items: Vec<LayoutItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every element and container, in layout order
    pub fn slots(&self) -> Vec<LayoutSlot> {
        let mut slots = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            let row = format!("row {}", i + 1);
            match item {
                LayoutItem::Row(elements) => push_elements(&mut slots, &row, elements),
                LayoutItem::Group { code, rows } => {
                    slots.push(LayoutSlot {
                        key: code.clone(),
                        position: row,
                        size: None,
                        kind: "group",
                    });
                    for (j, elements) in rows.iter().enumerate() {
                        push_elements(&mut slots, &format!("{code}/row {}", j + 1), elements);
                    }
                }
                LayoutItem::Subtable { code, elements } => {
                    slots.push(LayoutSlot {
                        key: code.clone(),
                        position: row,
                        size: None,
                        kind: "subtable",
                    });
                    push_elements(&mut slots, code, elements);
                }
                LayoutItem::ReferenceTable { code, size } => slots.push(LayoutSlot {
                    key: code.clone(),
                    position: row,
                    size: size.clone(),
                    kind: "reference table",
                }),
            }
        }
        slots
    }

    /// Ordered structure with nesting and without sizes
    ///
    /// Two layouts with equal signatures differ at most in element sizes.
    pub fn signature(&self) -> Vec<String> {
        let row_token = |elements: &[LayoutElement]| {
            let tokens: Vec<String> = elements.iter().map(LayoutElement::signature_token).collect();
            format!("[{}]", tokens.join(","))
        };

        self.items
            .iter()
            .map(|item| match item {
                LayoutItem::Row(elements) => format!("row{}", row_token(elements)),
                LayoutItem::Group { code, rows } => {
                    let rows: Vec<String> = rows.iter().map(|r| row_token(r)).collect();
                    format!("group:{code}{{{}}}", rows.join(""))
                }
                LayoutItem::Subtable { code, elements } => {
                    format!("subtable:{code}{}", row_token(elements))
                }
                LayoutItem::ReferenceTable { code, .. } => format!("reference_table:{code}"),
            })
            .collect()
    }

    /// Codes of all fields placed on the form, containers included
    pub fn field_codes(&self) -> Vec<&str> {
        fn push_row<'a>(codes: &mut Vec<&'a str>, elements: &'a [LayoutElement]) {
            for element in elements {
                if let LayoutElement::Field { code, .. } = element {
                    codes.push(code.as_str());
                }
            }
        }

        let mut codes = Vec::new();
        for item in &self.items {
            match item {
                LayoutItem::Row(elements) => push_row(&mut codes, elements),
                LayoutItem::Group { code, rows } => {
                    codes.push(code);
                    for row in rows {
                        push_row(&mut codes, row);
                    }
                }
                LayoutItem::Subtable { code, elements } => {
                    codes.push(code);
                    push_row(&mut codes, elements);
                }
                LayoutItem::ReferenceTable { code, .. } => codes.push(code),
            }
        }
        codes
    }
}

fn push_elements(slots: &mut Vec<LayoutSlot>, prefix: &str, elements: &[LayoutElement]) {
    for (i, element) in elements.iter().enumerate() {
        let position = format!("{prefix}/column {}", i + 1);
        slots.push(LayoutSlot {
            key: element.key(&position),
            size: element.size().cloned(),
            kind: element.kind(),
            position,
        });
    }
}

//! Element type tags
//!
//! The remote service tags every field definition and layout element
//! with a type string. The set is closed: anything not listed here is
//! rejected at the conversion boundary.

use std::fmt;

/// Mutable field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    SingleLineText,
    MultiLineText,
    RichText,
    Number,
    Calc,
    CheckBox,
    RadioButton,
    DropDown,
    MultiSelect,
    Date,
    Time,
    DateTime,
    Link,
    UserSelect,
    OrganizationSelect,
    GroupSelect,
    File,
    Group,
    Subtable,
    ReferenceTable,
}

impl FieldType {
    pub const ALL: [FieldType; 20] = [
        Self::SingleLineText,
        Self::MultiLineText,
        Self::RichText,
        Self::Number,
        Self::Calc,
        Self::CheckBox,
        Self::RadioButton,
        Self::DropDown,
        Self::MultiSelect,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Link,
        Self::UserSelect,
        Self::OrganizationSelect,
        Self::GroupSelect,
        Self::File,
        Self::Group,
        Self::Subtable,
        Self::ReferenceTable,
    ];

    /// Wire tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SingleLineText => "SINGLE_LINE_TEXT",
            Self::MultiLineText => "MULTI_LINE_TEXT",
            Self::RichText => "RICH_TEXT",
            Self::Number => "NUMBER",
            Self::Calc => "CALC",
            Self::CheckBox => "CHECK_BOX",
            Self::RadioButton => "RADIO_BUTTON",
            Self::DropDown => "DROP_DOWN",
            Self::MultiSelect => "MULTI_SELECT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Link => "LINK",
            Self::UserSelect => "USER_SELECT",
            Self::OrganizationSelect => "ORGANIZATION_SELECT",
            Self::GroupSelect => "GROUP_SELECT",
            Self::File => "FILE",
            Self::Group => "GROUP",
            Self::Subtable => "SUBTABLE",
            Self::ReferenceTable => "REFERENCE_TABLE",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Types laid out as their own layout item rather than in a row
    ///
    /// Containers cannot be placed inside a row or a subtable.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Group | Self::Subtable | Self::ReferenceTable)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Read-only fields maintained by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemType {
    RecordNumber,
    Id,
    Revision,
    Creator,
    CreatedTime,
    Modifier,
    UpdatedTime,
    Status,
    StatusAssignee,
    Category,
}

impl SystemType {
    pub const ALL: [SystemType; 10] = [
        Self::RecordNumber,
        Self::Id,
        Self::Revision,
        Self::Creator,
        Self::CreatedTime,
        Self::Modifier,
        Self::UpdatedTime,
        Self::Status,
        Self::StatusAssignee,
        Self::Category,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::RecordNumber => "RECORD_NUMBER",
            Self::Id => "__ID__",
            Self::Revision => "__REVISION__",
            Self::Creator => "CREATOR",
            Self::CreatedTime => "CREATED_TIME",
            Self::Modifier => "MODIFIER",
            Self::UpdatedTime => "UPDATED_TIME",
            Self::Status => "STATUS",
            Self::StatusAssignee => "STATUS_ASSIGNEE",
            Self::Category => "CATEGORY",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Any tag the service may put on a definition or layout element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementTag {
    Field(FieldType),
    System(SystemType),
    Label,
    Spacer,
    Hr,
}

impl ElementTag {
    /// Classify a wire tag, `None` if it is not a known tag
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "LABEL" => Some(Self::Label),
            "SPACER" => Some(Self::Spacer),
            "HR" => Some(Self::Hr),
            _ => FieldType::from_tag(tag)
                .map(Self::Field)
                .or_else(|| SystemType::from_tag(tag).map(Self::System)),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Field(t) => t.tag(),
            Self::System(t) => t.tag(),
            Self::Label => "LABEL",
            Self::Spacer => "SPACER",
            Self::Hr => "HR",
        }
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

//! Field catalog types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical kind of an interactive form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldKind {
    /// Free text entry
    Text,
    /// Two-state toggle
    CheckBox,
    /// Mutually exclusive set of toggles
    RadioGroup,
    /// Combo box (single selection, collapsed list)
    Dropdown,
    /// Scrollable list box
    OptionList,
    /// Push button; the only kind that carries an image appearance natively
    Button,
    /// Digital signature slot
    Signature,
}

impl FieldKind {
    /// All seven kinds, in declaration order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Text,
        FieldKind::CheckBox,
        FieldKind::RadioGroup,
        FieldKind::Dropdown,
        FieldKind::OptionList,
        FieldKind::Button,
        FieldKind::Signature,
    ];

    /// Canonicalize a native type tag.
    ///
    /// Trailing digits are variant discriminators and are stripped, as is a
    /// leading `PDF` class prefix, so `"PDFTextField2"`, `"TextField"` and
    /// `"Tx"` all map to [`FieldKind::Text`]. Returns `None` for tags that do
    /// not name one of the seven kinds.
    pub fn from_native_tag(tag: &str) -> Option<Self> {
        let trimmed = tag.trim().trim_end_matches(|c: char| c.is_ascii_digit());
        let base = trimmed.strip_prefix("PDF").unwrap_or(trimmed);

        match base.to_ascii_lowercase().as_str() {
            "textfield" | "text" | "tx" => Some(FieldKind::Text),
            "checkbox" | "check" => Some(FieldKind::CheckBox),
            "radiogroup" | "radio" => Some(FieldKind::RadioGroup),
            "dropdown" | "combobox" | "combo" => Some(FieldKind::Dropdown),
            "optionlist" | "listbox" | "list" => Some(FieldKind::OptionList),
            "button" | "pushbutton" => Some(FieldKind::Button),
            "signature" | "sig" => Some(FieldKind::Signature),
            _ => None,
        }
    }

    /// Name used in catalogs and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::CheckBox => "CheckBox",
            FieldKind::RadioGroup => "RadioGroup",
            FieldKind::Dropdown => "Dropdown",
            FieldKind::OptionList => "OptionList",
            FieldKind::Button => "Button",
            FieldKind::Signature => "Signature",
        }
    }

    /// Whether descriptors of this kind carry an option list.
    pub fn is_enumerable(self) -> bool {
        matches!(
            self,
            FieldKind::RadioGroup | FieldKind::Dropdown | FieldKind::OptionList
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::from_native_tag(s).ok_or_else(|| format!("unknown field type tag: {}", s))
    }
}

impl TryFrom<String> for FieldKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A named, typed slot within a template that can receive a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Fully qualified field name, unique within a template
    pub name: String,

    /// Canonical field kind
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Ordered option values, present for enumerable kinds only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

const IMAGE_NAME_HINTS: [&str; 7] = [
    "logo",
    "image",
    "background",
    "picture",
    "photo",
    "banner",
    "icon",
];

const MULTILINE_NAME_HINTS: [&str; 3] = ["description", "comment", "notes"];

impl FieldDescriptor {
    /// Create a descriptor without options.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: None,
        }
    }

    /// Attach an option list. Ignored for kinds that are not enumerable.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        if self.kind.is_enumerable() {
            self.options = Some(options);
        } else {
            log::debug!(
                "Dropping options for non-enumerable field {} ({})",
                self.name,
                self.kind
            );
        }
        self
    }

    /// Human-readable label: camelCase split into words.
    ///
    /// `"mainHeadline"` becomes `"main Headline"`.
    pub fn display_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 4);
        for c in self.name.chars() {
            if c.is_ascii_uppercase() {
                out.push(' ');
            }
            out.push(c);
        }
        out.trim().to_string()
    }

    /// Whether a form layer should offer an image upload for this field.
    pub fn accepts_image(&self) -> bool {
        if self.kind == FieldKind::Button {
            return true;
        }
        let name = self.name.to_lowercase();
        IMAGE_NAME_HINTS.iter().any(|hint| name.contains(hint))
    }

    /// Whether a form layer should render a multi-line editor.
    pub fn is_multiline_hint(&self) -> bool {
        let name = self.name.to_lowercase();
        MULTILINE_NAME_HINTS.iter().any(|hint| name.contains(hint))
    }
}

/// Ordered field list for one template, in source declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Later duplicates of a name are dropped.
    pub fn push(&mut self, field: FieldDescriptor) {
        if self.contains(&field.name) {
            log::warn!("Duplicate field name {} ignored", field.name);
            return;
        }
        self.fields.push(field);
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check whether a field name is in the catalog.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the catalog has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields per kind.
    pub fn count_by_kind(&self) -> BTreeMap<FieldKind, usize> {
        let mut counts = BTreeMap::new();
        for field in &self.fields {
            *counts.entry(field.kind).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<FieldDescriptor> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        let mut catalog = FieldCatalog::new();
        for field in iter {
            catalog.push(field);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

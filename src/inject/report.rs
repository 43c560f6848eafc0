//! Per-field results of an injection pass.

use serde::Serialize;

use crate::error::Error;
use crate::model::Rect;

/// How a value ended up in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum AppliedAs {
    /// Written as the text field's value
    Text,
    /// Set as a push button's appearance
    ControlAppearance,
    /// Drawn directly onto a page over the widget rectangle
    PagePlacement { page: u32, rect: Rect },
}

/// Why a field was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No value, or a blank one
    NoValue,
    /// Text value for a field that does not take text
    NotTextCapable,
    /// The field raised an error; see the report's warnings
    Failed,
}

/// Outcome for one catalog field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    Applied(AppliedAs),
    Skipped(SkipReason),
}

impl FieldOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FieldOutcome::Applied(_))
    }
}

/// Category of a recorded field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    FieldResolution,
    UnsupportedImageFormat,
    ImageDecode,
    MissingWidgetGeometry,
    Injection,
}

impl From<&Error> for WarningKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::FieldNotFound(_) | Error::InvalidField(_) => WarningKind::FieldResolution,
            Error::UnsupportedImageFormat(_) => WarningKind::UnsupportedImageFormat,
            Error::ImageDecode(_) => WarningKind::ImageDecode,
            Error::MissingWidgetGeometry(_) => WarningKind::MissingWidgetGeometry,
            _ => WarningKind::Injection,
        }
    }
}

/// A field-level failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWarning {
    pub field: String,
    pub kind: WarningKind,
    pub message: String,
}

/// Field name paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub name: String,
    pub outcome: FieldOutcome,
}

/// Everything an injection pass did, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InjectionReport {
    pub fields: Vec<FieldReport>,
    pub warnings: Vec<FieldWarning>,
}

impl InjectionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, name: &str, outcome: FieldOutcome) {
        self.fields.push(FieldReport {
            name: name.to_string(),
            outcome,
        });
    }

    pub(crate) fn fail(&mut self, name: &str, err: &Error) {
        self.warnings.push(FieldWarning {
            field: name.to_string(),
            kind: WarningKind::from(err),
            message: err.to_string(),
        });
        self.record(name, FieldOutcome::Skipped(SkipReason::Failed));
    }

    /// Outcome recorded for a field.
    pub fn outcome(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.outcome)
    }

    /// Number of fields that received a value.
    pub fn applied_count(&self) -> usize {
        self.fields.iter().filter(|f| f.outcome.is_applied()).count()
    }

    /// Number of fields left untouched.
    pub fn skipped_count(&self) -> usize {
        self.fields.len() - self.applied_count()
    }

    /// True when no field failed.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// True when at least one text value was written.
    pub fn wrote_text(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.outcome == FieldOutcome::Applied(AppliedAs::Text))
    }
}

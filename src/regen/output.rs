//! Published regeneration results and preview inspection.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::form::FormDocument;
use crate::inject::InjectionReport;

/// Scale at which preview consumers render the first page.
pub const PREVIEW_SCALE: f32 = 0.8;

/// Bytes produced by one regeneration run.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Sequence number of the run that produced the bytes
    pub seq: u64,
    pub template_id: String,
    pub bytes: Arc<[u8]>,
    pub report: InjectionReport,
}

impl GeneratedOutput {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message for whoever presents notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Dismiss after this long; `None` keeps it until dismissed
    pub auto_hide: Option<Duration>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>, auto_hide: Duration) -> Self {
        Self {
            severity,
            message: message.into(),
            auto_hide: Some(auto_hide),
        }
    }
}

/// First-page facts a preview consumer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewInfo {
    pub page_count: u32,
    /// Width and height of page 1 in points
    pub first_page: (f32, f32),
}

impl PreviewInfo {
    /// First-page size at `scale`.
    pub fn scaled(&self, scale: f32) -> (f32, f32) {
        (self.first_page.0 * scale, self.first_page.1 * scale)
    }

    /// First-page size at [`PREVIEW_SCALE`].
    pub fn preview_size(&self) -> (f32, f32) {
        self.scaled(PREVIEW_SCALE)
    }
}

/// What a preview consumer can do with the current output.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewStatus {
    /// Nothing published yet, or the output was invalidated
    NoPreview,
    Ready(PreviewInfo),
    /// Bytes are present but do not decode
    Invalid(String),
}

/// Classify an output for preview.
pub fn inspect_output(output: Option<&GeneratedOutput>) -> PreviewStatus {
    let Some(output) = output else {
        return PreviewStatus::NoPreview;
    };
    let doc = match FormDocument::load(&output.bytes) {
        Ok(doc) => doc,
        Err(e) => return PreviewStatus::Invalid(e.to_string()),
    };
    if doc.page_count() == 0 {
        return PreviewStatus::Invalid("document has no pages".to_string());
    }
    match doc.page_size(1) {
        Ok(first_page) => PreviewStatus::Ready(PreviewInfo {
            page_count: doc.page_count(),
            first_page,
        }),
        Err(e) => PreviewStatus::Invalid(e.to_string()),
    }
}

//! Debounced regeneration of the filled document.
//!
//! [`RegenerationController`] re-runs fetch, inject, and serialize after the
//! catalog or value map changes, coalescing bursts of edits into one run
//! once the quiescence window passes without further changes.

mod controller;
mod output;
mod scheduler;

pub use controller::{RegenConfig, RegenerationController, DEFAULT_AUTO_HIDE, DEFAULT_QUIESCENCE};
pub use output::{
    inspect_output, GeneratedOutput, Notification, PreviewInfo, PreviewStatus, Severity,
    PREVIEW_SCALE,
};
pub use scheduler::{DebounceSlot, Phase};

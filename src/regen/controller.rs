//! Debounced regeneration controller.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use super::output::{GeneratedOutput, Notification, Severity};
use super::scheduler::{DebounceSlot, Phase};
use crate::error::{Error, Result};
use crate::extract::extract_fields;
use crate::inject::FillOptions;
use crate::model::{FieldCatalog, FieldValue, Template, ValueMap};
use crate::pipeline::fill_template;
use crate::provider::TemplateProvider;

/// Default quiescence window.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(1500);

/// Default notification lifetime.
pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_secs(6);

const NOTIFICATION_CAPACITY: usize = 32;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct RegenConfig {
    /// Delay after the last change before a run starts
    pub quiescence: Duration,

    /// Lifetime attached to notifications
    pub auto_hide: Duration,

    /// Options for every run
    pub fill: FillOptions,
}

impl RegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set quiescence window.
    pub fn with_quiescence(mut self, window: Duration) -> Self {
        self.quiescence = window;
        self
    }

    /// Set notification lifetime.
    pub fn with_auto_hide(mut self, duration: Duration) -> Self {
        self.auto_hide = duration;
        self
    }

    /// Set fill options.
    pub fn with_fill_options(mut self, fill: FillOptions) -> Self {
        self.fill = fill;
        self
    }
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            auto_hide: DEFAULT_AUTO_HIDE,
            fill: FillOptions::default(),
        }
    }
}

/// State shared between the controller and its detached runs.
struct Shared {
    output: watch::Sender<Option<GeneratedOutput>>,
    generating: watch::Sender<bool>,
    notifications: broadcast::Sender<Notification>,
    next_seq: AtomicU64,
    last_published: AtomicU64,
    in_flight: AtomicUsize,
    auto_hide: Duration,
}

impl Shared {
    fn notify(&self, severity: Severity, message: impl Into<String>) {
        // Nobody listening is fine
        let _ = self
            .notifications
            .send(Notification::new(severity, message, self.auto_hide));
    }

    /// Take the next sequence number. Every run scheduled earlier is
    /// superseded from this point on.
    fn take_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Clear the output and supersede every run scheduled so far.
    fn invalidate(&self) {
        self.take_seq();
        self.output.send_replace(None);
    }

    /// Publish a run's result if no run was scheduled after it.
    fn publish(&self, seq: u64, output: Option<GeneratedOutput>) -> bool {
        self.output.send_if_modified(|current| {
            if seq < self.next_seq.load(Ordering::SeqCst)
                || seq <= self.last_published.load(Ordering::SeqCst)
            {
                log::debug!("Discarding result of superseded run #{}", seq);
                return false;
            }
            self.last_published.store(seq, Ordering::SeqCst);
            *current = output;
            true
        })
    }

    fn begin_run(&self) -> RunGuard<'_> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.generating.send_replace(true);
        }
        RunGuard(self)
    }

    fn end_run(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.generating.send_replace(false);
        }
    }
}

/// Keeps a run counted as in flight until dropped, including on unwind.
struct RunGuard<'a>(&'a Shared);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.end_run();
    }
}

/// Snapshot handed to one run.
struct RunJob<P: ?Sized> {
    seq: u64,
    provider: Arc<P>,
    shared: Arc<Shared>,
    template: Option<Template>,
    catalog: Arc<FieldCatalog>,
    values: ValueMap,
    fill: FillOptions,
}

impl<P: TemplateProvider + ?Sized> RunJob<P> {
    async fn run(self) {
        let seq = self.seq;
        let _guard = self.shared.begin_run();
        log::debug!("Regeneration run #{} started", seq);

        match self.execute(seq).await {
            Ok(output) => {
                self.shared.publish(seq, output);
            }
            Err(Error::Encode(msg)) => {
                log::error!("Run #{} could not encode output, keeping previous: {}", seq, msg);
            }
            Err(e) => {
                log::error!("Run #{} failed: {}", seq, e);
                if self.shared.publish(seq, None) {
                    self.shared.notify(Severity::Error, e.to_string());
                }
            }
        }

        log::debug!("Regeneration run #{} finished", seq);
    }

    async fn execute(&self, seq: u64) -> Result<Option<GeneratedOutput>> {
        let Some(template) = &self.template else {
            return Ok(None);
        };
        if self.catalog.is_empty() {
            return Ok(None);
        }

        let bytes = self.provider.fetch(template).await?;
        let filled = fill_template(&bytes, &self.catalog, &self.values, &self.fill)?;
        Ok(Some(GeneratedOutput {
            seq,
            template_id: template.id.clone(),
            bytes: Arc::from(filled.bytes),
            report: filled.report,
        }))
    }
}

/// Owns the selected template, its field catalog, and the value map, and
/// regenerates the output document after changes settle.
///
/// Must be used inside a tokio runtime.
pub struct RegenerationController<P: TemplateProvider + ?Sized + 'static> {
    provider: Arc<P>,
    config: RegenConfig,
    shared: Arc<Shared>,
    template: Option<Template>,
    catalog: Arc<FieldCatalog>,
    values: ValueMap,
    slot: DebounceSlot,
}

impl<P: TemplateProvider + ?Sized + 'static> RegenerationController<P> {
    /// Create a controller fetching templates from `provider`.
    pub fn new(provider: Arc<P>, config: RegenConfig) -> Self {
        let (output, _) = watch::channel(None);
        let (generating, _) = watch::channel(false);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let shared = Arc::new(Shared {
            output,
            generating,
            notifications,
            next_seq: AtomicU64::new(0),
            last_published: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            auto_hide: config.auto_hide,
        });

        Self {
            provider,
            slot: DebounceSlot::new(config.quiescence),
            config,
            shared,
            template: None,
            catalog: Arc::new(FieldCatalog::new()),
            values: ValueMap::new(),
        }
    }

    /// Switch to `template`.
    ///
    /// The current output is invalidated and the value map cleared before
    /// anything is fetched. The new catalog is extracted from freshly
    /// fetched bytes; on failure the catalog is left empty, an error
    /// notification is sent, and the error is returned.
    pub async fn select_template(&mut self, template: Template) -> Result<&FieldCatalog> {
        self.slot.cancel();
        self.shared.invalidate();
        self.values.clear();
        self.catalog = Arc::new(FieldCatalog::new());
        log::info!("Selected template {} ({})", template.id, template.name);
        self.template = Some(template.clone());

        let result = match self.provider.fetch(&template).await {
            Ok(bytes) => extract_fields(&bytes),
            Err(e) => Err(e),
        };

        match result {
            Ok(catalog) => {
                log::debug!("Template {} has {} fields", template.id, catalog.len());
                self.catalog = Arc::new(catalog);
                self.schedule();
                Ok(self.catalog.as_ref())
            }
            Err(e) => {
                log::error!("Could not load template {}: {}", template.id, e);
                self.shared.notify(Severity::Error, e.to_string());
                self.schedule();
                Err(e)
            }
        }
    }

    /// Set or clear one field's value and schedule regeneration.
    pub fn set_value(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        self.values.apply(name, value);
        self.schedule();
    }

    /// Replace the whole value map and schedule regeneration.
    pub fn replace_values(&mut self, values: ValueMap) {
        self.values = values;
        self.schedule();
    }

    /// Clear all values and the current output.
    pub fn reset(&mut self) {
        self.values.clear();
        self.shared.invalidate();
        self.shared
            .notify(Severity::Success, "Form reset successfully!");
        self.schedule();
    }

    /// Run the pipeline now, bypassing the debounce, and return the bytes.
    ///
    /// Unlike background runs, failures are returned and reported.
    pub async fn export(&self) -> Result<Vec<u8>> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| Error::Other("no template selected".to_string()))?;

        let result = async {
            let bytes = self.provider.fetch(template).await?;
            fill_template(&bytes, &self.catalog, &self.values, &self.config.fill)
        }
        .await;

        match result {
            Ok(filled) => Ok(filled.bytes),
            Err(e) => {
                log::error!("Export of {} failed: {}", template.id, e);
                self.shared.notify(Severity::Error, format!("Export failed: {}", e));
                Err(e)
            }
        }
    }

    /// Currently selected template.
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Field catalog of the selected template.
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn config(&self) -> &RegenConfig {
        &self.config
    }

    /// Whether a run is waiting for its quiescence window.
    pub fn phase(&self) -> Phase {
        self.slot.phase()
    }

    /// Latest published output.
    pub fn output(&self) -> Option<GeneratedOutput> {
        self.shared.output.borrow().clone()
    }

    pub fn subscribe_output(&self) -> watch::Receiver<Option<GeneratedOutput>> {
        self.shared.output.subscribe()
    }

    /// True while at least one run is in flight.
    pub fn subscribe_generating(&self) -> watch::Receiver<bool> {
        self.shared.generating.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    fn schedule(&mut self) {
        let job = RunJob {
            seq: self.shared.take_seq(),
            provider: self.provider.clone(),
            shared: self.shared.clone(),
            template: self.template.clone(),
            catalog: self.catalog.clone(),
            values: self.values.clone(),
            fill: self.config.fill.clone(),
        };
        self.slot.schedule(job.run());
    }
}

//! A stage shared between a settings thread and a report thread.
//!
//! The mutex is the only synchronisation point. `process` holds it for the
//! whole report, so a concurrent `configure` lands either before or after
//! that report, never in the middle of it.

use crate::error::SettingsResult;
use crate::report::DeviceReport;
use crate::settings::FilterSettings;
use crate::sink::ReportSink;
use crate::stage::{ConfigureOutcome, FormulaStage};
use crate::state::StageSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a [`FormulaStage`].
#[derive(Debug, Clone)]
pub struct SharedStage {
    inner: Arc<Mutex<FormulaStage>>,
}

impl SharedStage {
    /// Wrap a stage.
    #[must_use]
    pub fn new(stage: FormulaStage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stage)),
        }
    }

    /// See [`FormulaStage::configure`].
    ///
    /// Compilation runs under the lock; settings changes are rare and the
    /// formulas are short.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` under the same conditions as
    /// [`FormulaStage::configure`].
    pub fn configure(&self, settings: &FilterSettings) -> SettingsResult<ConfigureOutcome> {
        self.inner.lock().configure(settings)
    }

    /// See [`FormulaStage::process`].
    pub fn process(&self, report: &mut DeviceReport) {
        self.inner.lock().process(report);
    }

    /// See [`FormulaStage::consume`]. The sink runs after the lock is
    /// released.
    pub fn consume<S: ReportSink>(&self, mut report: DeviceReport, sink: &mut S) {
        self.process(&mut report);
        sink.emit(report);
    }

    /// See [`FormulaStage::snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        self.inner.lock().snapshot()
    }

    /// Run `f` with exclusive access to the stage.
    pub fn with<R>(&self, f: impl FnOnce(&mut FormulaStage) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<FormulaStage> for SharedStage {
    fn from(stage: FormulaStage) -> Self {
        Self::new(stage)
    }
}

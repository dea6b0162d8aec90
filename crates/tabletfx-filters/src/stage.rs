//! The formula filter stage.
//!
//! # Report-Rate Guarantees
//!
//! - **No parsing, no name lookup** in [`FormulaStage::process`]
//! - **No heap allocations** in `process` once the stage is configured: the
//!   value buffer and evaluation stack are sized by `configure`
//! - **No panics**: numeric edge cases become NaN or infinity in the output
//! - **Whole-set swap**: `configure` replaces every channel at once, so a
//!   report never sees a mix of old and new formulas

use crate::channel::Channel;
use crate::compiler::{ChannelCompiler, CompiledChannels};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::SettingsResult;
use crate::hash::settings_hash;
use crate::history::HistoryState;
use crate::report::{DeviceReport, TabletSpec};
use crate::settings::FilterSettings;
use crate::sink::ReportSink;
use std::fmt;
use tabletfx_expr::{EvalStack, FormulaError};
use tracing::debug;

/// A channel running on the identity fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFallback {
    /// Affected channel
    pub channel: Channel,
    /// Rejected formula text
    pub formula: String,
    /// Why it was rejected
    pub error: FormulaError,
}

/// What [`FormulaStage::configure`] did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigureOutcome {
    /// False when the settings hash matched and nothing was recompiled
    pub recompiled: bool,
    /// Channels currently on the identity fallback
    pub fallbacks: Vec<ChannelFallback>,
}

impl ConfigureOutcome {
    /// Whether every owned channel runs its configured formula.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Rewrites report fields with per-channel formulas.
///
/// A new stage is uncompiled and forwards reports untouched. After a
/// successful [`configure`](Self::configure) every owned channel has a
/// compiled expression (the configured formula or its identity fallback)
/// and [`process`](Self::process) applies them.
///
/// # Example
///
/// ```
/// use tabletfx_filters::prelude::*;
///
/// let mut stage = FormulaStage::new(TabletSpec::new(15200.0, 9500.0, 8191));
/// stage.configure(&FilterSettings::default().with_formula(Channel::X, "x + (x - lx) * 0.5"))?;
///
/// let mut out: Vec<DeviceReport> = Vec::new();
/// stage.consume(DeviceReport::at(100.0, 10.0), &mut out);
/// stage.consume(DeviceReport::at(200.0, 10.0), &mut out);
///
/// assert_eq!(out[0].position.map(|p| p.x), Some(150.0));
/// assert_eq!(out[1].position.map(|p| p.x), Some(250.0));
/// # Ok::<(), SettingsError>(())
/// ```
pub struct FormulaStage {
    pub(crate) spec: TabletSpec,
    pub(crate) compiled: Option<CompiledChannels>,
    pub(crate) history: HistoryState,
    values: Vec<f64>,
    stack: EvalStack,
    compiler: ChannelCompiler,
    diagnostics: Box<dyn Diagnostics>,
    pub(crate) reports_consumed: u64,
}

impl FormulaStage {
    /// Create an uncompiled stage for a device.
    #[must_use]
    pub fn new(spec: TabletSpec) -> Self {
        Self {
            spec,
            compiled: None,
            history: HistoryState::default(),
            values: Vec::new(),
            stack: EvalStack::new(),
            compiler: ChannelCompiler::new(),
            diagnostics: Box::new(TracingDiagnostics),
            reports_consumed: 0,
        }
    }

    /// Report formula rejections to `diagnostics` instead of `tracing`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Apply new settings.
    ///
    /// Settings whose hash matches the current compiled set are a no-op.
    /// Otherwise every owned channel is recompiled and the new set replaces
    /// the old one in a single assignment. History survives a recompile
    /// unless the variant or sample count changed.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if validation fails or an identity fallback
    /// does not compile. The stage keeps its previous compiled set.
    pub fn configure(&mut self, settings: &FilterSettings) -> SettingsResult<ConfigureOutcome> {
        if let Some(current) = &self.compiled
            && current.settings_hash() == settings_hash(settings)
        {
            debug!("Settings unchanged, hash: {:x}", current.settings_hash());
            return Ok(ConfigureOutcome {
                recompiled: false,
                fallbacks: fallbacks_of(current),
            });
        }

        let compiled = self.compiler.compile(settings, self.diagnostics.as_ref())?;
        let outcome = ConfigureOutcome {
            recompiled: true,
            fallbacks: fallbacks_of(&compiled),
        };
        self.swap_at_report_boundary(compiled);
        Ok(outcome)
    }

    fn swap_at_report_boundary(&mut self, compiled: CompiledChannels) {
        let variant = compiled.variant();
        let reshaped = self.compiled.as_ref().map(CompiledChannels::variant) != Some(variant);
        if reshaped {
            self.history = HistoryState::new(variant.sample_capacity());
            debug!("History reset for {variant}");
        }

        self.values.reserve(variant.arity().saturating_sub(self.values.len()));
        if self.stack.capacity() < compiled.max_stack() {
            self.stack = EvalStack::with_capacity(compiled.max_stack());
        }

        self.compiled = Some(compiled);
    }

    /// Transform one report in place.
    ///
    /// Channels the report has no field for are skipped and the field stays
    /// absent. History advances once, after every channel has run.
    pub fn process(&mut self, report: &mut DeviceReport) {
        self.reports_consumed += 1;

        let Some(compiled) = &self.compiled else {
            return;
        };

        let raw = *report;
        compiled
            .variant()
            .gather(&raw, &self.history, &self.spec, &mut self.values);

        let mut computed = *self.history.last_computed();
        for entry in compiled.channels() {
            let channel = entry.channel();
            if !raw.has(channel.capability()) {
                continue;
            }

            let value = entry.expression().call_with(&self.values, &mut self.stack);
            channel.write(report, value);

            match channel {
                Channel::X => computed.x = value,
                Channel::Y => computed.y = value,
                Channel::Pressure => computed.pressure = value,
                Channel::TiltX | Channel::TiltY => {}
            }
        }

        self.history.update(&raw, &computed);
    }

    /// Transform a report and emit it downstream exactly once.
    pub fn consume<S: ReportSink>(&mut self, mut report: DeviceReport, sink: &mut S) {
        self.process(&mut report);
        sink.emit(report);
    }

    /// Device limits exposed as `mx`, `my` and `mp`.
    #[must_use]
    pub fn tablet_spec(&self) -> &TabletSpec {
        &self.spec
    }

    /// Replace the device limits, for example after a tablet swap.
    pub fn set_tablet_spec(&mut self, spec: TabletSpec) {
        self.spec = spec;
    }

    /// Current history.
    #[must_use]
    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    /// Forget all previous reports.
    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    /// The compiled channel set, once configured.
    #[must_use]
    pub fn compiled(&self) -> Option<&CompiledChannels> {
        self.compiled.as_ref()
    }
}

fn fallbacks_of(compiled: &CompiledChannels) -> Vec<ChannelFallback> {
    compiled
        .channels()
        .iter()
        .filter_map(|entry| {
            entry.fallback().map(|error| ChannelFallback {
                channel: entry.channel(),
                formula: entry.formula().to_string(),
                error: error.clone(),
            })
        })
        .collect()
}

impl fmt::Debug for FormulaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaStage")
            .field("spec", &self.spec)
            .field("compiled", &self.compiled)
            .field("reports_consumed", &self.reports_consumed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use crate::report::Vec2;
    use crate::settings::VariantKind;

    fn spec() -> TabletSpec {
        TabletSpec::new(1000.0, 500.0, 1023)
    }

    fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected Err: {e:?}"),
        }
    }

    #[test]
    fn test_uncompiled_stage_forwards_untouched() {
        let mut stage = FormulaStage::new(spec());
        let mut out: Vec<DeviceReport> = Vec::new();
        let report = DeviceReport::at(3.0, 4.0).with_pressure(9);
        stage.consume(report, &mut out);

        assert_eq!(out, vec![report]);
        assert_eq!(stage.history(), &HistoryState::default());
        assert!(stage.compiled().is_none());
    }

    #[test]
    fn test_unchanged_settings_skip_recompile() {
        let mut stage = FormulaStage::new(spec());
        let settings = FilterSettings::default().with_formula(Channel::X, "x * 2");

        assert!(must(stage.configure(&settings)).recompiled);
        let outcome = must(stage.configure(&settings.clone()));
        assert!(!outcome.recompiled);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_unchanged_settings_report_existing_fallbacks() {
        let mut stage = FormulaStage::new(spec());
        let settings = FilterSettings::default().with_formula(Channel::X, "nope");

        assert_eq!(must(stage.configure(&settings)).fallbacks.len(), 1);
        let again = must(stage.configure(&settings));
        assert!(!again.recompiled);
        assert_eq!(again.fallbacks[0].channel, Channel::X);
    }

    #[test]
    fn test_invalid_settings_keep_previous_set() {
        let mut stage = FormulaStage::new(spec());
        must(stage.configure(&FilterSettings::default().with_formula(Channel::X, "x + 1")));
        let before = stage.compiled().unwrap().settings_hash();

        let bad = FilterSettings::for_variant(VariantKind::MultiSample).with_samples(0);
        assert!(matches!(
            stage.configure(&bad),
            Err(SettingsError::InvalidSampleCount { .. })
        ));
        assert_eq!(stage.compiled().unwrap().settings_hash(), before);

        let mut report = DeviceReport::at(1.0, 1.0);
        stage.process(&mut report);
        assert_eq!(report.position, Some(Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn test_history_survives_same_shape_recompile() {
        let mut stage = FormulaStage::new(spec());
        must(stage.configure(&FilterSettings::default()));
        stage.process(&mut DeviceReport::at(7.0, 8.0));

        must(stage.configure(&FilterSettings::default().with_formula(Channel::X, "lx")));
        let mut report = DeviceReport::at(9.0, 9.0);
        stage.process(&mut report);
        assert_eq!(report.position.unwrap().x, 7.0);
    }

    #[test]
    fn test_history_resets_on_variant_change() {
        let mut stage = FormulaStage::new(spec());
        must(stage.configure(&FilterSettings::default()));
        stage.process(&mut DeviceReport::at(7.0, 8.0));

        let extended = FilterSettings::for_variant(VariantKind::Extended);
        must(stage.configure(&extended));
        assert_eq!(stage.history().last_raw().position, Vec2::ZERO);
    }

    #[test]
    fn test_history_resets_on_sample_count_change() {
        let mut stage = FormulaStage::new(spec());
        let settings = FilterSettings::for_variant(VariantKind::MultiSample).with_samples(2);
        must(stage.configure(&settings));
        stage.process(&mut DeviceReport::at(1.0, 1.0));
        assert_eq!(stage.history().samples().len(), 1);

        must(stage.configure(&settings.with_samples(3)));
        assert_eq!(stage.history().samples().capacity(), 3);
        assert!(stage.history().samples().is_empty());
    }

    #[test]
    fn test_computed_values_feed_next_report() {
        let mut stage = FormulaStage::new(spec());
        let settings = FilterSettings::for_variant(VariantKind::Extended)
            .with_formula(Channel::X, "x + 10")
            .with_formula(Channel::Y, "cx");
        must(stage.configure(&settings));

        let mut first = DeviceReport::at(1.0, 1.0);
        stage.process(&mut first);
        // cx is still zero for the first report
        assert_eq!(first.position, Some(Vec2::new(11.0, 0.0)));

        let mut second = DeviceReport::at(5.0, 5.0);
        stage.process(&mut second);
        assert_eq!(second.position, Some(Vec2::new(15.0, 11.0)));
    }

    #[test]
    fn test_tablet_spec_update_visible_to_formulas() {
        let mut stage = FormulaStage::new(spec());
        must(stage.configure(&FilterSettings::default().with_formula(Channel::X, "mx - x")));
        stage.set_tablet_spec(TabletSpec::new(2000.0, 500.0, 1023));

        let mut report = DeviceReport::at(500.0, 0.0);
        stage.process(&mut report);
        assert_eq!(report.position.unwrap().x, 1500.0);
        assert_eq!(stage.tablet_spec().max_x, 2000.0);
    }

    #[test]
    fn test_reset_history() {
        let mut stage = FormulaStage::new(spec());
        must(stage.configure(&FilterSettings::default()));
        stage.process(&mut DeviceReport::at(4.0, 4.0));
        stage.reset_history();
        assert_eq!(stage.history().last_raw().position, Vec2::ZERO);
    }

    #[test]
    fn test_debug_output() {
        let stage = FormulaStage::new(spec());
        let text = format!("{stage:?}");
        assert!(text.starts_with("FormulaStage {"));
        assert!(text.contains("reports_consumed: 0"));
    }
}

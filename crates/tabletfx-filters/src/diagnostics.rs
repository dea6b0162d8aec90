//! Where formula failures are reported.

use crate::channel::Channel;
use std::fmt;
use tabletfx_expr::FormulaError;
use tracing::error;

/// Observer for formulas rejected during configuration.
///
/// Called once per failing channel, before the compiled set is swapped in.
/// Implementations must not block; they run on the configuring thread while
/// it holds the stage.
pub trait Diagnostics: Send + fmt::Debug {
    /// `formula` for `channel` failed and the identity formula replaced it.
    fn formula_rejected(&self, channel: Channel, formula: &str, error: &FormulaError);
}

/// Reports rejections as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn formula_rejected(&self, channel: Channel, formula: &str, error: &FormulaError) {
        error!(
            channel = %channel,
            formula,
            error = %error,
            "Formula rejected, using identity for {channel}"
        );
    }
}

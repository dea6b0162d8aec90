//! Formula-Driven Report Filters for TabletFX
//!
//! This crate provides the filter stage that rewrites tablet report fields
//! with user-authored formulas, one formula per output channel, evaluated
//! for every report the device produces.
//!
//! # Overview
//!
//! - **FilterSettings**: Per-channel formula text, variant and sample count
//! - **FilterVariant**: Variable schema and owned channels (basic,
//!   extended, multi-sample)
//! - **ChannelCompiler**: Settings to compiled channel set, with identity
//!   fallback for rejected formulas
//! - **HistoryState**: Previous raw and computed values plus the sample ring
//! - **FormulaStage**: Applies the compiled set to each report and forwards
//!   it to a [`ReportSink`]
//! - **SharedStage**: Mutex-guarded handle for cross-thread reconfiguration
//!
//! # Architecture
//!
//! ```text
//! FilterSettings → ChannelCompiler → CompiledChannels ─┐
//!                        ↓                             ↓ swap
//!                 SettingsValidator     DeviceReport → FormulaStage → ReportSink
//!                                                          ↕
//!                                                     HistoryState
//! ```
//!
//! # Failure Policy
//!
//! A formula that fails to parse or compile never stops the report stream.
//! The channel runs its identity formula (`x`, `y`, `p`, `tx` or `ty`) and
//! the failure goes to the stage's [`Diagnostics`].
//!
//! # Example
//!
//! ```
//! use tabletfx_filters::prelude::*;
//!
//! let settings = FilterSettings::from_yaml_str(
//!     "variant: multi_sample\nsamples: 2\nx: (x + x0 + x1) / 3\ny: (y + y0 + y1) / 3\n",
//! )?;
//!
//! let mut stage = FormulaStage::new(TabletSpec::new(15200.0, 9500.0, 8191));
//! let outcome = stage.configure(&settings)?;
//! assert!(outcome.is_clean());
//!
//! let mut out: Vec<DeviceReport> = Vec::new();
//! for x in [300.0, 600.0, 900.0] {
//!     stage.consume(DeviceReport::at(x, 30.0), &mut out);
//! }
//! assert_eq!(out[2].position, Some(Vec2::new(600.0, 30.0)));
//! # Ok::<(), SettingsError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bindings;
pub mod channel;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod hash;
pub mod history;
pub mod prelude;
pub mod report;
pub mod settings;
pub mod shared;
pub mod sink;
pub mod stage;
pub mod state;

pub use bindings::{BASIC_VARIABLES, EXTENDED_VARIABLES, FilterVariant};
pub use channel::Channel;
pub use compiler::{ChannelCompiler, CompiledChannel, CompiledChannels};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use error::{SettingsError, SettingsResult};
pub use hash::settings_hash;
pub use history::{ComputedSample, HistoryState, RawSample, SampleRing};
pub use report::{Capability, DeviceReport, TabletSpec, Vec2};
pub use settings::{
    FilterSettings, MAX_FORMULA_LEN, MAX_SAMPLES, MIN_SAMPLES, SettingsValidator, VariantKind,
};
pub use shared::SharedStage;
pub use sink::{FnSink, ReportSink};
pub use stage::{ChannelFallback, ConfigureOutcome, FormulaStage};
pub use state::{ChannelSnapshot, StageSnapshot, StageState};

//! Prelude for tabletfx-filters
//!
//! This module provides convenient re-exports of commonly used types.
//!
//! # Example
//!
//! ```
//! use tabletfx_filters::prelude::*;
//!
//! let mut stage = FormulaStage::new(TabletSpec::new(100.0, 100.0, 0));
//! assert!(stage.configure(&FilterSettings::default()).is_ok());
//! ```

pub use crate::bindings::FilterVariant;
pub use crate::channel::Channel;
pub use crate::error::SettingsError;
pub use crate::report::{DeviceReport, TabletSpec, Vec2};
pub use crate::settings::{FilterSettings, VariantKind};
pub use crate::shared::SharedStage;
pub use crate::sink::{FnSink, ReportSink};
pub use crate::stage::{ConfigureOutcome, FormulaStage};
pub use crate::state::StageState;

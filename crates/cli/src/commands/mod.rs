//! Command implementations for tabletfxctl CLI

pub mod check;
pub mod eval;
pub mod replay;

use clap::ValueEnum;
use tabletfx_filters::VariantKind;

/// Variant selector on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// x y lx ly mx my
    Basic,
    /// Position, pressure, tilt, distance and last computed values
    Extended,
    /// x y mx my plus x0 y0 ... for the last N positions
    MultiSample,
}

impl From<VariantArg> for VariantKind {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Basic => VariantKind::Basic,
            VariantArg::Extended => VariantKind::Extended,
            VariantArg::MultiSample => VariantKind::MultiSample,
        }
    }
}

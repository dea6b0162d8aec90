//! Output channels a formula can drive.

use crate::report::{Capability, DeviceReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One report field written by its own formula.
///
/// Channels are evaluated in declaration order: X, Y, pressure, tilt X,
/// tilt Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Position X
    X,
    /// Position Y
    Y,
    /// Tip pressure
    Pressure,
    /// Tilt X
    TiltX,
    /// Tilt Y
    TiltY,
}

impl Channel {
    /// Every channel, in evaluation order.
    pub const ALL: [Channel; 5] = [
        Channel::X,
        Channel::Y,
        Channel::Pressure,
        Channel::TiltX,
        Channel::TiltY,
    ];

    /// The variable that passes this channel through unchanged.
    #[must_use]
    pub fn identity_variable(self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Pressure => "p",
            Channel::TiltX => "tx",
            Channel::TiltY => "ty",
        }
    }

    /// The report capability this channel reads and writes.
    #[must_use]
    pub fn capability(self) -> Capability {
        match self {
            Channel::X | Channel::Y => Capability::Position,
            Channel::Pressure => Capability::Pressure,
            Channel::TiltX | Channel::TiltY => Capability::Tilt,
        }
    }

    /// Human-readable label used in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Channel::X => "X",
            Channel::Y => "Y",
            Channel::Pressure => "Pressure",
            Channel::TiltX => "Tilt X",
            Channel::TiltY => "Tilt Y",
        }
    }

    /// Write `value` into this channel's field of `report`.
    ///
    /// Does nothing when the report lacks the field. Pressure is an integer
    /// field: the value is rounded and clamped, and a non-finite value
    /// leaves the existing pressure in place.
    pub fn write(self, report: &mut DeviceReport, value: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let narrowed = value as f32;
        match self {
            Channel::X => {
                if let Some(position) = report.position.as_mut() {
                    position.x = narrowed;
                }
            }
            Channel::Y => {
                if let Some(position) = report.position.as_mut() {
                    position.y = narrowed;
                }
            }
            Channel::Pressure => {
                if let Some(pressure) = report.pressure.as_mut()
                    && value.is_finite()
                {
                    *pressure = pressure_from(value);
                }
            }
            Channel::TiltX => {
                if let Some(tilt) = report.tilt.as_mut() {
                    tilt.x = narrowed;
                }
            }
            Channel::TiltY => {
                if let Some(tilt) = report.tilt.as_mut() {
                    tilt.y = narrowed;
                }
            }
        }
    }
}

/// Round and clamp a finite value into the pressure range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pressure_from(value: f64) -> u32 {
    // clamped to the u32 range first, so the cast is exact
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

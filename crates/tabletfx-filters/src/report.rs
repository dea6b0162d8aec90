//! Tablet report model.
//!
//! A report carries only the capabilities the device produced; every field
//! is optional and the filter never fills in one that is absent.

use serde::{Deserialize, Serialize};

/// A 2D value in device units.
///
/// Non-finite components serialize as the strings `"NaN"`, `"inf"` and
/// `"-inf"`, so a formula result that overflowed survives a JSON round trip.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component
    #[serde(with = "component")]
    pub x: f32,
    /// Vertical component
    #[serde(with = "component")]
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Create a vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

mod component {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Component {
        Number(f32),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else {
            serializer.collect_str(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        match Component::deserialize(deserializer)? {
            Component::Number(value) => Ok(value),
            Component::Text(text) => text
                .trim()
                .parse()
                .map_err(|_parse_error| D::Error::custom(format!("invalid component '{text}'"))),
        }
    }
}

/// Report capabilities a channel may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Absolute pen position
    Position,
    /// Tip pressure
    Pressure,
    /// Pen tilt
    Tilt,
    /// Hover distance above the surface
    HoverDistance,
}

/// One report from a digitizer.
///
/// # Example
///
/// ```
/// use tabletfx_filters::{Capability, DeviceReport};
///
/// let report = DeviceReport::at(1200.0, 800.0).with_pressure(512);
/// assert!(report.has(Capability::Position));
/// assert!(report.has(Capability::Pressure));
/// assert!(!report.has(Capability::Tilt));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceReport {
    /// Absolute position, when the report carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    /// Raw tip pressure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<u32>,
    /// Tilt in device units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<Vec2>,
    /// Raw hover distance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_distance: Option<u32>,
}

impl DeviceReport {
    /// A report with no capabilities, such as an auxiliary button report.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            position: None,
            pressure: None,
            tilt: None,
            hover_distance: None,
        }
    }

    /// A position-only report.
    #[must_use]
    pub const fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some(Vec2::new(x, y)),
            ..Self::empty()
        }
    }

    /// Add pressure.
    #[must_use]
    pub const fn with_pressure(mut self, pressure: u32) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Add tilt.
    #[must_use]
    pub const fn with_tilt(mut self, x: f32, y: f32) -> Self {
        self.tilt = Some(Vec2::new(x, y));
        self
    }

    /// Add hover distance.
    #[must_use]
    pub const fn with_hover_distance(mut self, distance: u32) -> Self {
        self.hover_distance = Some(distance);
        self
    }

    /// Whether the report carries `capability`.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Position => self.position.is_some(),
            Capability::Pressure => self.pressure.is_some(),
            Capability::Tilt => self.tilt.is_some(),
            Capability::HoverDistance => self.hover_distance.is_some(),
        }
    }
}

/// Digitizer and pen limits reported by the device.
///
/// Exposed to formulas as `mx`, `my` and `mp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabletSpec {
    /// Maximum X position
    pub max_x: f32,
    /// Maximum Y position
    pub max_y: f32,
    /// Maximum pressure
    #[serde(default)]
    pub max_pressure: u32,
}

impl TabletSpec {
    /// Create a spec.
    #[must_use]
    pub const fn new(max_x: f32, max_y: f32, max_pressure: u32) -> Self {
        Self {
            max_x,
            max_y,
            max_pressure,
        }
    }
}

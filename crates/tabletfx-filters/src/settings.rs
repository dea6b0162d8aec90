//! Filter settings and their validation.
//!
//! Settings arrive from outside the stage as one formula string per
//! channel plus, for the multi-sample variant, a sample count. They can be
//! built in code or loaded from YAML or JSON:
//!
//! ```yaml
//! variant: extended
//! x: x + (x - lx) * 0.5
//! pressure: p * p / mp
//! ```
//!
//! Missing keys take their defaults: identity formulas and one sample.

use crate::bindings::FilterVariant;
use crate::channel::Channel;
use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted multi-sample count.
pub const MIN_SAMPLES: usize = 1;

/// Largest accepted multi-sample count.
pub const MAX_SAMPLES: usize = 256;

/// Longest accepted formula, in bytes.
pub const MAX_FORMULA_LEN: usize = 4096;

/// Variant selector as it appears in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// See [`FilterVariant::Basic`]
    #[default]
    Basic,
    /// See [`FilterVariant::Extended`]
    Extended,
    /// See [`FilterVariant::MultiSample`]
    MultiSample,
}

/// Per-channel formulas and variant selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Which variable set and channels to use
    pub variant: VariantKind,
    /// X formula
    pub x: String,
    /// Y formula
    pub y: String,
    /// Pressure formula, extended variant only
    pub pressure: String,
    /// Tilt X formula, extended variant only
    pub tilt_x: String,
    /// Tilt Y formula, extended variant only
    pub tilt_y: String,
    /// Ring capacity, multi-sample variant only
    pub samples: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            variant: VariantKind::Basic,
            x: Channel::X.identity_variable().to_string(),
            y: Channel::Y.identity_variable().to_string(),
            pressure: Channel::Pressure.identity_variable().to_string(),
            tilt_x: Channel::TiltX.identity_variable().to_string(),
            tilt_y: Channel::TiltY.identity_variable().to_string(),
            samples: 1,
        }
    }
}

impl FilterSettings {
    /// Default settings for `variant`.
    #[must_use]
    pub fn for_variant(variant: VariantKind) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Builder: set the formula for `channel`.
    #[must_use]
    pub fn with_formula(mut self, channel: Channel, formula: impl Into<String>) -> Self {
        self.set_formula(channel, formula);
        self
    }

    /// Builder: set the sample count.
    #[must_use]
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Formula text for `channel`.
    #[must_use]
    pub fn formula(&self, channel: Channel) -> &str {
        match channel {
            Channel::X => &self.x,
            Channel::Y => &self.y,
            Channel::Pressure => &self.pressure,
            Channel::TiltX => &self.tilt_x,
            Channel::TiltY => &self.tilt_y,
        }
    }

    /// Replace the formula for `channel`.
    pub fn set_formula(&mut self, channel: Channel, formula: impl Into<String>) {
        let slot = match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Pressure => &mut self.pressure,
            Channel::TiltX => &mut self.tilt_x,
            Channel::TiltY => &mut self.tilt_y,
        };
        *slot = formula.into();
    }

    /// The variant these settings select.
    ///
    /// The sample count only matters for the multi-sample variant.
    #[must_use]
    pub fn variant(&self) -> FilterVariant {
        match self.variant {
            VariantKind::Basic => FilterVariant::Basic,
            VariantKind::Extended => FilterVariant::Extended,
            VariantKind::MultiSample => FilterVariant::MultiSample {
                samples: self.samples,
            },
        }
    }

    /// Parse YAML settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Yaml` when the text is not valid settings.
    pub fn from_yaml_str(text: &str) -> SettingsResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse JSON settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Json` when the text is not valid settings.
    pub fn from_json_str(text: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load settings from a `.yaml`, `.yml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be read, has an
    /// unrecognised extension, or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(SettingsError::UnsupportedFormat(extension)),
        }
    }
}

/// Range checks applied before settings are compiled.
#[derive(Debug, Clone, Default)]
pub struct SettingsValidator;

impl SettingsValidator {
    /// Create a validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate settings.
    ///
    /// Only fields the selected variant uses are checked: the sample count
    /// for multi-sample, and the formulas of owned channels.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if:
    /// - The multi-sample count is outside `MIN_SAMPLES..=MAX_SAMPLES`
    /// - An owned channel's formula is longer than `MAX_FORMULA_LEN` bytes
    pub fn validate(&self, settings: &FilterSettings) -> SettingsResult<()> {
        if settings.variant == VariantKind::MultiSample
            && !(MIN_SAMPLES..=MAX_SAMPLES).contains(&settings.samples)
        {
            return Err(SettingsError::InvalidSampleCount {
                value: settings.samples,
                min: MIN_SAMPLES,
                max: MAX_SAMPLES,
            });
        }

        for &channel in settings.variant().channels() {
            let len = settings.formula(channel).len();
            if len > MAX_FORMULA_LEN {
                return Err(SettingsError::FormulaTooLong {
                    channel,
                    len,
                    limit: MAX_FORMULA_LEN,
                });
            }
        }

        Ok(())
    }
}

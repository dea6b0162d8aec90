//! Stage state snapshots for diagnostics.

use crate::bindings::FilterVariant;
use crate::channel::Channel;
use crate::stage::FormulaStage;
use serde::Serialize;

/// Lifecycle state of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// No settings applied yet; reports pass through untouched
    Uncompiled,
    /// Every owned channel has a compiled expression
    Ready,
}

/// One channel as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    /// Channel
    pub channel: Channel,
    /// Configured formula text
    pub formula: String,
    /// Expression actually evaluated
    pub active: String,
    /// Rejection message when the identity fallback is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Point-in-time view of a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSnapshot {
    /// Lifecycle state
    pub state: StageState,
    /// Variant display name, once configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Hash of the applied settings, once configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_hash: Option<u64>,
    /// Owned channels in evaluation order
    pub channels: Vec<ChannelSnapshot>,
    /// Reports seen since construction
    pub reports_consumed: u64,
}

impl StageSnapshot {
    /// Number of channels on the identity fallback.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.channels.iter().filter(|c| c.fallback.is_some()).count()
    }
}

impl FormulaStage {
    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> StageState {
        if self.compiled.is_some() {
            StageState::Ready
        } else {
            StageState::Uncompiled
        }
    }

    /// Variant of the applied settings.
    #[must_use]
    pub fn variant(&self) -> Option<FilterVariant> {
        self.compiled.as_ref().map(|c| c.variant())
    }

    /// Reports seen since construction.
    #[must_use]
    pub fn reports_consumed(&self) -> u64 {
        self.reports_consumed
    }

    /// Capture a snapshot for logging or display.
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        let channels = self
            .compiled
            .iter()
            .flat_map(|compiled| compiled.channels())
            .map(|entry| ChannelSnapshot {
                channel: entry.channel(),
                formula: entry.formula().to_string(),
                active: entry.expression().source().to_string(),
                fallback: entry.fallback().map(ToString::to_string),
            })
            .collect();

        StageSnapshot {
            state: self.state(),
            variant: self.variant().map(|v| v.to_string()),
            settings_hash: self.compiled.as_ref().map(|c| c.settings_hash()),
            channels,
            reports_consumed: self.reports_consumed,
        }
    }
}

//! Settings hash for change detection.
//!
//! The stage compares this hash against the one it last compiled to decide
//! whether a settings update needs a recompile.

use crate::settings::{FilterSettings, VariantKind};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Calculate a hash of the settings that affect compilation.
///
/// Only inputs the selected variant reads take part: the variant itself,
/// the sample count for multi-sample, and the formulas of owned channels.
/// Editing an unused formula therefore does not force a recompile.
#[must_use]
pub fn settings_hash(settings: &FilterSettings) -> u64 {
    let mut hasher = DefaultHasher::new();

    settings.variant.hash(&mut hasher);
    if settings.variant == VariantKind::MultiSample {
        settings.samples.hash(&mut hasher);
    }

    for &channel in settings.variant().channels() {
        channel.hash(&mut hasher);
        settings.formula(channel).hash(&mut hasher);
    }

    hasher.finish()
}

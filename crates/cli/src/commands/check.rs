//! Settings check command

use anyhow::Result;
use std::path::Path;
use tabletfx_filters::{ChannelCompiler, FilterSettings, TracingDiagnostics};
use tracing::info;

use crate::error::CliError;
use crate::output::{self, ChannelStatus, CheckReport};

/// Compile every owned channel and print its status.
///
/// Fails with [`CliError::ChannelsFellBack`] when any channel would run its
/// identity formula.
pub fn execute(path: &Path, json: bool) -> Result<()> {
    let settings = FilterSettings::from_path(path).map_err(CliError::from)?;
    info!("Checking {} ({:?} variant)", path.display(), settings.variant);

    let compiled = ChannelCompiler::new()
        .compile(&settings, &TracingDiagnostics)
        .map_err(CliError::from)?;

    let report = CheckReport {
        success: compiled.fallbacks().count() == 0,
        variant: compiled.variant().to_string(),
        settings_hash: format!("{:016x}", compiled.settings_hash()),
        channels: compiled
            .channels()
            .iter()
            .map(|entry| ChannelStatus {
                channel: entry.channel(),
                formula: entry.formula().to_string(),
                status: if entry.is_fallback() { "fallback" } else { "ok" },
                error: entry.fallback().map(ToString::to_string),
            })
            .collect(),
    };

    output::print_check_report(&report, json);

    let count = compiled.fallbacks().count();
    if count > 0 {
        return Err(CliError::ChannelsFellBack { count }.into());
    }
    Ok(())
}

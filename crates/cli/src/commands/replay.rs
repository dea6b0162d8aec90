//! Report replay command
//!
//! Reads one JSON report per line, runs it through a configured stage and
//! writes the transformed report as one JSON line to stdout.

use anyhow::Result;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tabletfx_filters::{DeviceReport, FilterSettings, FormulaStage, ReportSink, TabletSpec};
use tracing::{info, warn};

use crate::error::CliError;

/// Writes each emitted report as a JSON line, keeping the first failure.
struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
    error: Option<CliError>,
}

impl<W: Write> JsonLinesSink<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    fn write_line(&mut self, report: &DeviceReport) -> Result<(), CliError> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(mut self) -> Result<usize, CliError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn emit(&mut self, report: DeviceReport) {
        if self.error.is_some() {
            return;
        }
        match self.write_line(&report) {
            Ok(()) => self.written += 1,
            Err(error) => self.error = Some(error),
        }
    }
}

/// Load a tablet spec from JSON or YAML by extension.
fn load_spec(path: &Path) -> Result<TabletSpec, CliError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let text = std::fs::read_to_string(path)?;

    match extension.as_str() {
        "json" => Ok(serde_json::from_str(&text)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
        _ => Err(CliError::UnsupportedSpecFormat(extension)),
    }
}

/// Replay reports from `input` (or stdin) through a stage built from the
/// settings and spec files.
pub fn execute(settings_path: &Path, spec_path: &Path, input: Option<&Path>) -> Result<()> {
    let settings = FilterSettings::from_path(settings_path).map_err(CliError::from)?;
    let spec = load_spec(spec_path)?;

    let mut stage = FormulaStage::new(spec);
    let outcome = stage.configure(&settings).map_err(CliError::from)?;
    for fallback in &outcome.fallbacks {
        warn!(
            "{} runs the identity formula: {}",
            fallback.channel, fallback.error
        );
    }

    let stdout = io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock());

    match input {
        Some(path) => replay_lines(BufReader::new(File::open(path)?), &mut stage, &mut sink)?,
        None => replay_lines(io::stdin().lock(), &mut stage, &mut sink)?,
    }

    let written = sink.finish()?;
    info!("Replayed {written} report(s)");
    Ok(())
}

fn replay_lines<R: BufRead, S: ReportSink>(
    reader: R,
    stage: &mut FormulaStage,
    sink: &mut S,
) -> Result<(), CliError> {
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let report: DeviceReport =
            serde_json::from_str(trimmed).map_err(|source| CliError::InvalidReport {
                line: index + 1,
                source,
            })?;
        stage.consume(report, sink);
    }
    Ok(())
}

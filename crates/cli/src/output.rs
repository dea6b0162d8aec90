//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use serde::Serialize;
use serde_json::json;
use tabletfx_filters::Channel;

use crate::error::CliError;

/// Result of `check` for one channel.
#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub channel: Channel,
    pub formula: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub success: bool,
    pub variant: String,
    pub settings_hash: String,
    pub channels: Vec<ChannelStatus>,
}

/// Result of `eval`.
#[derive(Debug, Serialize)]
pub struct EvalResult {
    pub success: bool,
    pub formula: String,
    pub variant: String,
    pub result: f64,
    pub imaginary: f64,
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error),
            "causes": causes
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    // Print error chain if available
    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print the per-channel result of a settings check
pub fn print_check_report(report: &CheckReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format check report as JSON: {e}"),
        }
        return;
    }

    println!(
        "{} {} (hash {})",
        "Variant:".bold(),
        report.variant,
        report.settings_hash
    );
    for channel in &report.channels {
        let label = format!("{:<8}", channel.channel.label());
        match &channel.error {
            None => println!("  {} {} {}", "✓".green(), label, channel.formula),
            Some(error) => {
                println!(
                    "  {} {} {} {}",
                    "⚠".yellow(),
                    label,
                    channel.formula,
                    "(identity fallback)".yellow()
                );
                println!("      {error}");
            }
        }
    }
}

/// Print the value of an evaluated formula
pub fn print_eval_result(result: &EvalResult, json: bool) {
    if json {
        // NaN and infinities have no JSON number form
        let value = |v: f64| if v.is_finite() { json!(v) } else { json!(v.to_string()) };
        let output = json!({
            "success": result.success,
            "formula": result.formula,
            "variant": result.variant,
            "result": value(result.result),
            "imaginary": value(result.imaginary),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format eval result as JSON: {e}"),
        }
    } else if result.imaginary != 0.0 && !result.imaginary.is_nan() {
        println!(
            "{} {}",
            result.result,
            format!("(imaginary part {} dropped)", result.imaginary).dimmed()
        );
    } else {
        println!("{}", result.result);
    }
}

/// Get error type name for JSON output
fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::Settings(_)) => "Settings",
        Some(CliError::Formula(_)) => "Formula",
        Some(CliError::InvalidBinding(_)) => "InvalidBinding",
        Some(CliError::UnknownVariable { .. }) => "UnknownVariable",
        Some(CliError::ChannelsFellBack { .. }) => "ChannelsFellBack",
        Some(CliError::InvalidReport { .. }) => "InvalidReport",
        Some(CliError::UnsupportedSpecFormat(_)) => "UnsupportedSpecFormat",
        Some(CliError::IoError(_)) => "Io",
        Some(CliError::JsonError(_)) => "Json",
        Some(CliError::YamlError(_)) => "Yaml",
        None => "Unknown",
    }
}

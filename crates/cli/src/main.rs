//! tabletfxctl - TabletFX Formula Filter CLI
//!
//! Checks filter settings, evaluates single formulas, and replays recorded
//! tablet reports through a formula stage.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::VariantArg;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tabletfxctl")]
#[command(about = "TabletFX CLI - Check, evaluate and replay formula filters")]
#[command(version)]
#[command(long_about = "
tabletfxctl works with TabletFX formula filter settings without a running
tablet driver. It compiles settings the same way the filter stage does,
evaluates formulas against chosen variable values, and replays recorded
reports (one JSON object per line) through a configured stage.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every channel of a settings file and report fallbacks
    Check {
        /// Settings file (.yaml, .yml or .json)
        settings: PathBuf,
    },

    /// Compile one formula and evaluate it
    Eval {
        /// Formula text
        formula: String,
        /// Variable set to compile against
        #[arg(long, value_enum, default_value_t = VariantArg::Basic)]
        variant: VariantArg,
        /// Sample count for the multi-sample variant
        #[arg(long, default_value_t = 1)]
        samples: usize,
        /// Variable value as name=value; unset variables are 0
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Run JSON-lines reports through a configured stage
    Replay {
        /// Settings file (.yaml, .yml or .json)
        settings: PathBuf,
        /// Tablet spec file with max_x, max_y and max_pressure
        #[arg(long)]
        spec: PathBuf,
        /// Report file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tabletfxctl={log_level},tabletfx_filters={log_level},tabletfx_expr={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli);

    // Handle errors with appropriate exit codes
    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let cli_error = e.downcast_ref::<CliError>();

            // check has already printed its per-channel report
            let reported = matches!(cli_error, Some(CliError::ChannelsFellBack { .. }));
            if cli.json && !reported {
                output::print_error_json(&e);
            } else if !cli.json {
                output::print_error_human(&e);
            }

            let exit_code = cli_error.map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Check { settings } => commands::check::execute(settings, cli.json),
        Commands::Eval {
            formula,
            variant,
            samples,
            vars,
        } => commands::eval::execute(formula, *variant, *samples, vars, cli.json),
        Commands::Replay {
            settings,
            spec,
            input,
        } => commands::replay::execute(settings, spec, input.as_deref()),
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use config::{CliConfig, MessageFlags};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Sieve data validation engine.
#[derive(Parser)]
#[command(name = "sieve", version, about = "Sieve data validation engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a sieve.toml config file (default: ./sieve.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an input document against a rule document
    Validate {
        /// Path to the rule AST JSON file
        rules: PathBuf,
        /// Path to the input JSON file
        #[arg(long)]
        input: PathBuf,
        /// Locale YAML file merged over the bundled templates (repeatable)
        #[arg(long)]
        messages: Vec<PathBuf>,
        /// Locale to render messages in
        #[arg(long)]
        locale: Option<String>,
        /// Prefix messages with the rule's display name
        #[arg(long)]
        full: bool,
        /// Include hints for failing paths
        #[arg(long)]
        hints: bool,
    },

    /// Check a rule document against the rule AST schema and print its canonical form
    Check {
        /// Path to the rule AST JSON file
        rules: PathBuf,
    },

    /// Print the static hints of a rule document
    Hints {
        /// Path to the rule AST JSON file
        rules: PathBuf,
        /// Locale YAML file merged over the bundled templates (repeatable)
        #[arg(long)]
        messages: Vec<PathBuf>,
        /// Locale to render messages in
        #[arg(long)]
        locale: Option<String>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            rules,
            input,
            messages,
            locale,
            full,
            hints,
        } => {
            let flags = MessageFlags {
                messages,
                locale,
                full,
                hints,
            };
            let config = load_config(cli.config.as_deref(), &flags, cli.output, cli.quiet);
            commands::validate::cmd_validate(&rules, &input, &config, cli.output, cli.quiet);
        }
        Commands::Check { rules } => {
            commands::check::cmd_check(&rules, cli.output, cli.quiet);
        }
        Commands::Hints {
            rules,
            messages,
            locale,
        } => {
            let flags = MessageFlags {
                messages,
                locale,
                ..MessageFlags::default()
            };
            let config = load_config(cli.config.as_deref(), &flags, cli.output, cli.quiet);
            commands::hints::cmd_hints(&rules, &config, cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr, filtered by `SIEVE_LOG` (default `warn`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SIEVE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    explicit: Option<&Path>,
    flags: &MessageFlags,
    output: OutputFormat,
    quiet: bool,
) -> CliConfig {
    let mut config = match CliConfig::load(explicit) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    config.apply(flags);
    config
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}

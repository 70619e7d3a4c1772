pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{ArgGroup, Parser, Subcommand};
use stockwise_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use stockwise_core::stock::DrawMode;
use tracing::Level;

use crate::commands::recommend::{RecommendArgs, RecommendSource};
use crate::commands::synthesize::SynthesizeArgs;
use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "stockwise",
    about = "Stockwise catalog and recommendation CLI",
    long_about = "Synthesize catalog stock statuses, resolve alternatives for sold-out products, \
                  and render recommendation messages.",
    after_help = "Examples:\n  stockwise synthesize --seed 42 --dry-run\n  stockwise alternative 12\n  stockwise recommend --id 12\n  stockwise doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a stockwise.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Catalog CSV path, overriding config and env")]
    catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Assign a synthesized stock status to every catalog product")]
    Synthesize {
        #[arg(long, help = "Seed the draws for a reproducible run")]
        seed: Option<u64>,
        #[arg(long, help = "Label draw mode: two-draw or cumulative")]
        draw_mode: Option<DrawMode>,
        #[arg(long, help = "Report the distribution without writing the catalog")]
        dry_run: bool,
    },
    #[command(about = "Resolve a substitute for a catalog product")]
    Alternative {
        #[arg(help = "Catalog product id")]
        id: u64,
    },
    #[command(about = "Render the chat recommendation for a product")]
    #[command(group(ArgGroup::new("source").required(true).args(["id", "record"])))]
    Recommend {
        #[arg(long, help = "Catalog product id")]
        id: Option<u64>,
        #[arg(long, help = "File holding a `key: value` recommendation record")]
        record: Option<PathBuf>,
        #[arg(long, help = "User request shown ahead of the recommendation")]
        request: Option<String>,
        #[arg(long, help = "Emit message blocks as JSON")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog readability, and stock status coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                catalog_path: self.catalog.clone(),
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Commands report config failures themselves; logging falls back to defaults.
    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging)?;

    let result = match cli.command {
        Command::Synthesize { seed, draw_mode, dry_run } => {
            commands::synthesize::run(options, SynthesizeArgs { seed, draw_mode, dry_run })
        }
        Command::Alternative { id } => commands::alternative::run(options, id),
        Command::Recommend { id, record, request, json } => {
            let source = match (id, record) {
                (Some(id), _) => RecommendSource::Id(id),
                (None, Some(path)) => RecommendSource::RecordFile(path),
                (None, None) => return Err(anyhow!("either --id or --record is required")),
            };
            commands::recommend::run(options, RecommendArgs { source, request, json })
        }
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(options) },
        Command::Doctor { json } => {
            CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
    };

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let level = logging
        .level
        .parse::<Level>()
        .with_context(|| format!("invalid log level `{}`", logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use storemail_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use storemail_core::fixtures::DEFAULT_SEED;

use crate::commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "storemail",
    about = "Direct-mail campaign recommendations for retail stores",
    long_about = "Score campaign creatives against store performance history and size \
                  the next mailing for each store.",
    after_help = "Examples:\n  storemail seed > demo.json\n  \
                  storemail recommend --input demo.json\n  \
                  storemail recommend --input demo.json --store store_portland_central\n  \
                  storemail config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank campaigns for every store (or one store) in an input document")]
    Recommend {
        #[arg(long, help = "JSON document with stores, campaigns and geographic_patterns")]
        input: PathBuf,
        #[arg(long = "store", help = "Only score this store id")]
        store_id: Option<String>,
        #[arg(long = "config", help = "Explicit storemail.toml path")]
        config_path: Option<PathBuf>,
        #[arg(long, help = "Override the minimum overall score to keep a recommendation")]
        min_confidence: Option<f64>,
        #[arg(long, help = "Override the recommended quantity multiplier")]
        quantity_multiplier: Option<f64>,
    },
    #[command(about = "Print deterministic demo performance data as a recommend input document")]
    Seed {
        #[arg(long, default_value_t = DEFAULT_SEED, help = "Random seed for the simulation")]
        seed: u64,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config {
        #[arg(long = "config", help = "Explicit storemail.toml path")]
        config_path: Option<PathBuf>,
    },
}

impl Command {
    fn config_path(&self) -> Option<PathBuf> {
        match self {
            Self::Recommend { config_path, .. } | Self::Config { config_path } => {
                config_path.clone()
            }
            Self::Seed { .. } => None,
        }
    }
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // A broken config still gets default logging; the command reports the failure itself.
    let logging = AppConfig::load(LoadOptions {
        config_path: cli.command.config_path(),
        ..LoadOptions::default()
    })
    .map(|config| config.logging)
    .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging)?;

    let result = match cli.command {
        Command::Recommend {
            input,
            store_id,
            config_path,
            min_confidence,
            quantity_multiplier,
        } => commands::recommend::run(RecommendArgs {
            input,
            store_id,
            config_path,
            min_confidence,
            quantity_multiplier,
        }),
        Command::Seed { seed } => commands::seed::run(seed),
        Command::Config { config_path } => commands::config::run(config_path),
    };

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

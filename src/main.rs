use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sound_mind_api::{Config, ConfigOverrides, Credentials, Server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Multi-source content aggregation API
#[derive(Debug, Parser)]
#[command(name = "sound-mind-api", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Env file holding API keys
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory with the front-end assets
    #[arg(long)]
    static_dir: Option<String>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("sound_mind_api={level},tower_http={level},warn"))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    Credentials::load_env_file(&cli.env_file);

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config
        .apply_overrides(&ConfigOverrides {
            host: cli.host,
            port: cli.port,
            static_dir: cli.static_dir,
        })
        .context("invalid command line override")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!(
        "Sound Mind API v{} starting with credentials {:?}",
        env!("CARGO_PKG_VERSION"),
        config.credentials
    );

    Server::new(config).run().await?;
    Ok(())
}

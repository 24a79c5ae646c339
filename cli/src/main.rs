mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cmsglue_backend::config::AdapterKind;
use cmsglue_backend::Settings;

#[derive(Parser)]
#[command(name = "cmsglue")]
#[command(about = "cmsglue - database adapter, seeding and preview tooling for the content backend")]
struct Cli {
    /// Database adapter to use
    #[arg(long, global = true, value_enum, ignore_case = true, env = "DATABASE_ADAPTER")]
    adapter: Option<AdapterArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AdapterArg {
    #[value(alias = "neon", alias = "postgres")]
    Managed,
    #[value(alias = "memory")]
    Embedded,
}

impl From<AdapterArg> for AdapterKind {
    fn from(arg: AdapterArg) -> Self {
        match arg {
            AdapterArg::Managed => AdapterKind::Managed,
            AdapterArg::Embedded => AdapterKind::Embedded,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database adapter and print its descriptor
    Check,
    /// Create the default admin user if it does not exist
    Seed,
    /// Run the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(adapter) = cli.adapter {
        settings.adapter = adapter.into();
    }
    tracing::debug!(adapter = ?settings.adapter, "Settings loaded");

    match cli.command {
        Commands::Check => commands::check::run(settings).await,
        Commands::Seed => commands::seed::run(settings).await,
        Commands::Serve => commands::serve::run(settings).await,
    }
}

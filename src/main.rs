use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod services;

use commands::{BabyCommand, ConfigCommand, QuestionCommand, SleepCommand};
use config::Config;
use services::Services;

#[derive(Parser)]
#[command(name = "nestling")]
#[command(version)]
#[command(about = "Track babies, sleep and questions for the doctor", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage baby profiles
    Baby(BabyCommand),

    /// Track sleep
    Sleep(SleepCommand),

    /// Keep questions for the doctor
    Question(QuestionCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nestling=info,nestling_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Baby(cmd)) => {
            let services = Services::open(&config).await?;
            cmd.run(&services, &config).await?;
        }
        Some(Commands::Sleep(cmd)) => {
            let services = Services::open(&config).await?;
            cmd.run(&services, &config).await?;
        }
        Some(Commands::Question(cmd)) => {
            let services = Services::open(&config).await?;
            cmd.run(&services, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

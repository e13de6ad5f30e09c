//! jobsift CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use dotenv::dotenv;
use jobsift::{
    commands::{
        cmd_ask, cmd_chat, cmd_ingest, cmd_init, cmd_status, print_answer, print_ingest_outcome,
        print_init, print_status,
    },
    config::{Config, PipelineMode},
    error::Result,
    progress::LogWriterFactory,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "jobsift")]
#[command(version, about = "Ask questions about your job descriptions", long_about = None)]
struct Cli {
    /// Path to config file (default: ./jobsift.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Load, split and embed documents into a new vector store
    ///
    /// Does nothing when the store already exists.
    Ingest {
        /// Directory of .txt files (default: data/, else sample_data/)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Show the chunks the answer was generated from
        #[arg(short, long)]
        sources: bool,

        /// Pipeline design to use for this question
        #[arg(short, long, value_enum)]
        mode: Option<PipelineMode>,
    },

    /// Ask questions interactively
    Chat {
        /// Do not show sources after each answer
        #[arg(long)]
        hide_sources: bool,

        /// Pipeline design to use for this session
        #[arg(short, long, value_enum)]
        mode: Option<PipelineMode>,
    },

    /// Show configuration and vector store status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, log_json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(fmt::layer().json().with_writer(LogWriterFactory))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(LogWriterFactory))
            .init();
    }
}

async fn run() -> Result<()> {
    // Credentials may come from a .env file in the working directory
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            let config = cmd_init(&path, force)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_init(&config);
            }
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "jobsift", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { data_dir } => {
            let outcome = cmd_ingest(&config, data_dir.as_deref()).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_ingest_outcome(&outcome);
            }
        }

        Commands::Ask {
            question,
            sources,
            mode,
        } => {
            if let Some(mode) = mode {
                config.pipeline.mode = mode;
            }
            let result = cmd_ask(&config, &question).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_answer(&result, sources);
            }
        }

        Commands::Chat { hide_sources, mode } => {
            if let Some(mode) = mode {
                config.pipeline.mode = mode;
            }
            cmd_chat(&config, !hide_sources).await?;
        }

        Commands::Status => {
            let status = cmd_status(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Init { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

//! KubeClaw CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a default config file
//! - `serve`: Start the HTTP gateway and chat page
//! - `ask`: Answer one question from the terminal
//! - `tools`: Show the tool catalog offered to the model
//! - `doctor`: Diagnose config, cluster and provider

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kubeclaw",
    about = "KubeClaw — ask questions about your Kubernetes cluster in plain language",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to ~/.kubeclaw/config.toml
    Init,

    /// Start the HTTP gateway server
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask one question and print the answer
    Ask {
        /// The question, e.g. "list pods in namespace demo"
        question: String,

        /// Also print every message exchanged with the model
        #[arg(short, long)]
        transcript: bool,
    },

    /// List the tools the model may call
    Tools {
        /// Print the catalog as JSON, including parameter schemas
        #[arg(long)]
        json: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Ask {
            question,
            transcript,
        } => commands::ask::run(&question, transcript).await?,
        Commands::Tools { json } => commands::tools::run(json)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

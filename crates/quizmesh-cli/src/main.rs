//! QuizMesh CLI — command-line interface for quiz workflow orchestration.
//!
//! Reuses the same core orchestration logic (quizmesh-core) and server
//! bootstrap (quizmesh-server) that back the HTTP API.

use clap::{Parser, Subcommand};

use quizmesh_cli::commands;

/// QuizMesh CLI — Quiz workflow orchestrator
#[derive(Parser)]
#[command(name = "quizmesh", version, about = "QuizMesh CLI — Quiz workflow orchestrator")]
pub struct Cli {
    /// Path to a YAML orchestrator configuration file
    #[arg(long, env = "QUIZMESH_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the QuizMesh HTTP backend server
    Server {
        /// Host to bind to
        #[arg(long, env = "QUIZMESH_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "QUIZMESH_PORT", default_value_t = 3210)]
        port: u16,
        /// Skip the background discovery loop
        #[arg(long)]
        no_discovery: bool,
    },

    /// Probe the configured agents once and print the registry
    Discover,

    /// Generate a quiz through the manual → quiz workflow
    Quiz {
        /// Quiz topic
        topic: String,
        /// Number of questions
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Difficulty: easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: String,
    },

    /// Generate a study manual through the outline → manual workflow
    Manual {
        /// Manual topic
        topic: String,
    },

    /// Probe every agent's health endpoint and print a system health report
    Health,

    /// Run a raw orchestrator action
    Action {
        /// Action name (e.g. "get_agents")
        name: String,
        /// Action parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quizmesh_core=warn,quizmesh_server=info,quizmesh_cli=info".into()
            }),
        )
        .init();

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Server {
            host,
            port,
            no_discovery,
        } => commands::server::run(host, port, config_path, !no_discovery).await,

        Commands::Discover => {
            let state = commands::init_state(config_path);
            commands::discover::run(&state).await
        }

        Commands::Quiz {
            topic,
            count,
            difficulty,
        } => {
            let state = commands::init_state(config_path);
            commands::workflow::quiz(&state, &topic, count, &difficulty).await
        }

        Commands::Manual { topic } => {
            let state = commands::init_state(config_path);
            commands::workflow::manual(&state, &topic).await
        }

        Commands::Health => {
            let state = commands::init_state(config_path);
            commands::health::run(&state).await
        }

        Commands::Action { name, params } => {
            let state = commands::init_state(config_path);
            commands::action::call(&state, &name, &params).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

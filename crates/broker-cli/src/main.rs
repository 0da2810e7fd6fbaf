use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "brokerctl", about = "Operator CLI for the pool broker", version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write .broker/config.toml and engine descriptors.
    Configure {
        #[arg(short = 'i', long, default_value = "1")]
        instances: u32,
        #[arg(short = 'd', long, default_value = "4")]
        databases_per_instance: u32,
    },
    /// Prepare each engine's data directory.
    Build,
    /// Start engines and the broker daemon, and render the dashboard.
    Up {
        #[arg(short = 'i', long)]
        instances: Option<u32>,
        #[arg(short = 'd', long)]
        databases_per_instance: Option<u32>,
    },
    /// Stop all engines.
    Down,
    /// Print engine reachability and broker health.
    Status,
    /// Open an interactive psql session against one engine/database.
    Connect { port: u16, dbname: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,brokerctl=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Configure { instances, databases_per_instance } => {
            commands::configure::configure(instances, databases_per_instance)
        }
        Commands::Build => commands::build::build(),
        Commands::Up { instances, databases_per_instance } => commands::up::up(instances, databases_per_instance).await,
        Commands::Down => commands::down::down().await,
        Commands::Status => commands::status::status().await,
        Commands::Connect { port, dbname } => commands::connect::connect(port, &dbname),
    }
}

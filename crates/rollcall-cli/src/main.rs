use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rollcall-cli", version, about = "Rollcall maintenance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Maintenance window control
    Window {
        #[command(subcommand)]
        action: commands::window::WindowAction,
    },
    /// Request gate simulation
    Gate {
        #[command(subcommand)]
        action: commands::gate::GateAction,
    },
    /// Run the periodic evaluator until interrupted
    Watch {
        /// Override the evaluator interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Window { action } => commands::window::run(action),
        Commands::Gate { action } => commands::gate::run(action),
        Commands::Watch { interval } => commands::watch::run(interval),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "nextblock", version, about = "Time-block session tracker")]
struct Cli {
    /// Use the testing server port and honour the time-scale factor
    #[arg(long, global = true)]
    testing: bool,
    /// Debug logging (overridden by NEXTBLOCK_LOG / RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session from a YAML plan
    Start {
        /// Plan file
        plan: PathBuf,
    },
    /// Finish the current block and move to the next one
    #[command(alias = "advance")]
    Next,
    /// Show the current session
    Status {
        /// Print the heartbeat payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// End the session and remove its record
    Stop,
    /// Run the poll loop (default when no command is given)
    Watch,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command.unwrap_or(Commands::Watch) {
        Commands::Start { plan } => commands::session::start(&plan),
        Commands::Next => commands::session::next(),
        Commands::Status { json } => commands::session::status(json),
        Commands::Stop => commands::session::stop(),
        Commands::Watch => commands::watch::run(cli.testing),
        Commands::Config { action } => commands::config::run(action),
        Commands::Version => {
            println!("nextblock {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

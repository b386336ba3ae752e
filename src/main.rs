use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use focuspeer_lib::RunOptions;

/// Focus Peer - earn points for focused sessions
#[derive(Parser)]
#[command(name = "focuspeer")]
#[command(version)]
#[command(about = "Terminal client for Focus Peer sessions and points", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides settings and FOCUSPEER_BACKEND_URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Name to register with, overrides settings and FOCUSPEER_USER_NAME
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = RunOptions {
        config: cli.config,
        backend_url: cli.backend_url,
        name: cli.name,
    };

    match focuspeer_lib::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("focuspeer: {err:#}");
            ExitCode::FAILURE
        }
    }
}

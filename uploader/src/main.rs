mod config;
mod job;

use colored::Colorize;
use infrastructure_telemetry::initialize_telemetry;

#[tokio::main]
async fn main() {
    let config = match config::build_config() {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to build config".red());
            std::process::exit(2);
        }
    };

    if let Err(e) = initialize_telemetry(&config.common.telemetry) {
        eprintln!("{}: {e}", "Failed to initialize logger".red());
        std::process::exit(2);
    }

    match job::run(&config).await {
        Ok(id) => println!("{id}"),
        Err(e) => {
            eprintln!("{}: {e:#}", "Upload failed".red());
            std::process::exit(1);
        }
    }
}

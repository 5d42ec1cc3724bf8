//! Service host binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──▶ config loader ──▶ logging
//!                         │
//!                         ▼
//!              startup: ServiceCollection
//!              (Configuration, AppArgs, install_services, Worker)
//!                         │
//!                         ▼
//!              Host::new ─▶ ServiceRegistry (frozen) + hosted tasks
//!                         │
//!                         ▼
//!              Host::run ─▶ tasks(child token) ◀── SIGINT/SIGTERM
//!                         │
//!                         ▼
//!              RunReport ─▶ exit code
//! ```

use std::process::ExitCode;

use clap::Parser;

use service_host::cli::Cli;
use service_host::error::{HostError, EXIT_STARTUP};
use service_host::lifecycle::startup;
use service_host::observability::logging;
use service_host::services::AppArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let configuration = match startup::load_configuration(&cli) {
        Ok(configuration) => configuration,
        Err(e) => {
            logging::init_fallback();
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::from(e.exit_code());
        }
    };

    if cli.print_config {
        return match serde_json::to_string_pretty(configuration.values()) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render configuration: {}", e);
                ExitCode::from(EXIT_STARTUP)
            }
        };
    }

    if let Err(e) = logging::init(&configuration.settings().logging) {
        let e = HostError::from(e);
        eprintln!("{}", e);
        return ExitCode::from(e.exit_code());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %configuration.environment(),
        files = ?configuration.files(),
        "service-host starting"
    );

    let host = match startup::build_host(configuration, AppArgs(cli.args.clone())) {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build host");
            return ExitCode::from(e.exit_code());
        }
    };

    let report = host.run().await;

    tracing::info!(trigger = %report.trigger, "Shutdown complete");
    ExitCode::from(report.exit_code())
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Register the configuration, process arguments and application services
//! - Register the default worker as a hosted task
//! - Build the host (registry frozen, tasks instantiated)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and no task has run yet
//! - Loading and building are separate steps so logging can be set up from
//!   the loaded configuration before the host is built

use crate::cli::Cli;
use crate::config::{self, Configuration};
use crate::error::HostError;
use crate::lifecycle::host::Host;
use crate::services::{install_services, AppArgs, ServiceCollection};
use crate::tasks::Worker;

/// Load configuration from the sources named on the command line.
pub fn load_configuration(cli: &Cli) -> Result<Configuration, HostError> {
    Ok(config::load_configuration(&cli.config_source())?)
}

/// Register services and hosted tasks, then build the host.
pub fn build_host(configuration: Configuration, args: AppArgs) -> Result<Host, HostError> {
    let options = configuration.settings().host.clone();

    let services = ServiceCollection::new().add(configuration).add(args);
    let services =
        install_services(services).add_hosted_task(|registry| Ok(Worker::from_registry(registry)?));

    let host = Host::new(services, options)?;
    tracing::info!(
        host_id = %host.id(),
        tasks = ?host.registry().hosted_tasks(),
        "Host configured"
    );
    Ok(host)
}

/// Load configuration and build the host in one step.
pub fn configure(cli: &Cli) -> Result<Host, HostError> {
    let configuration = load_configuration(cli)?;
    build_host(configuration, AppArgs(cli.args.clone()))
}

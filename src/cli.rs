//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigSource;

#[derive(Debug, Parser)]
#[command(name = "service-host")]
#[command(version, about = "Runs hosted background tasks until shutdown", long_about = None)]
pub struct Cli {
    /// Base configuration file (defaults to ./host.toml when present)
    #[arg(short, long, env = "SERVICE_HOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment name, selects the <stem>.<environment>.toml overlay
    #[arg(short, long, env = "SERVICE_HOST_ENVIRONMENT", default_value = "production")]
    pub environment: String,

    /// Override a configuration key, e.g. --set worker.delay_ms=50
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Arguments after `--`, passed to the application untouched
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Configuration layers described by these arguments and the process environment.
    pub fn config_source(&self) -> ConfigSource {
        let env_vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        ConfigSource {
            path: self.config.clone(),
            environment: self.environment.clone(),
            env_vars,
            overrides: self.overrides.clone(),
        }
    }
}

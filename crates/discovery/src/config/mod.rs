pub mod cli;
pub mod file;

use core::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use derive_more::Display;
use error_stack::Report;
use utils::logging::LogFormat;
use utils::logging::LogOptions;
use utils::logging::LogOutput;

pub use cli::*;
pub use file::*;

use crate::delivery::DeliveryConfig;

/// Interval used when none, or a non-positive one, is configured.
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Errors raised while loading configuration. All of them stop the process at startup.
#[derive(Debug, Display)]
pub enum ConfigError {
    #[display("Failed to read config file: {}", path.display())]
    FileRead { path: PathBuf },
    #[display("Failed to parse config file")]
    FileParse,
    #[display("Cluster name is required. Please set cluster_name in config or CLUSTER_NAME environment variable")]
    MissingClusterName,
}

impl Error for ConfigError {}

/// Effective configuration after merging defaults, the config file and the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub cluster_name: String,
    pub discovery_interval: Duration,
    pub log: LogOptions,
    pub delivery: DeliveryConfig,
    pub kubeconfig: Option<PathBuf>,
    pub print_payload: bool,
    pub once: bool,
    /// File the settings were read from, if any
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Locate and read the config file, then merge it under the command line settings.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FileRead`] if the selected file cannot be read
    /// - [`ConfigError::FileParse`] if the selected file is malformed
    pub fn load(cli: Cli) -> Result<Self, Report<ConfigError>> {
        let home = dirs::home_dir();
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let config_file = locate_config_file(cli.config.as_deref(), home.as_deref(), &cwd);

        let file = match &config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::merge(cli, file);
        config.config_file = config_file;
        Ok(config)
    }

    /// Command line / environment values override file values, which override defaults.
    /// Empty strings count as unset.
    pub fn merge(cli: Cli, file: FileConfig) -> Self {
        let discovery_interval = cli
            .discovery_interval
            .or(file.discovery_interval)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.unsigned_abs()))
            .unwrap_or(DEFAULT_DISCOVERY_INTERVAL);

        let log = LogOptions {
            level: pick(cli.log_level, file.log.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            format: pick(cli.log_format, file.log.format)
                .map(|format| LogFormat::parse(&format))
                .unwrap_or_default(),
            output: pick(cli.log_output, file.log.output)
                .map(|output| LogOutput::parse(&output))
                .unwrap_or_default(),
        };

        let request_timeout = cli
            .request_timeout
            .or(file.elchi.request_timeout)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let delivery = DeliveryConfig::new(
            pick(cli.api_endpoint, file.elchi.api_endpoint).unwrap_or_default(),
            pick(cli.token, file.elchi.token).unwrap_or_default(),
        )
        .with_insecure_skip_verify(
            cli.insecure_skip_verify
                .or(file.elchi.insecure_skip_verify)
                .unwrap_or(false),
        )
        .with_request_timeout(Duration::from_secs(request_timeout));

        Self {
            cluster_name: pick(cli.cluster_name, file.cluster_name).unwrap_or_default(),
            discovery_interval,
            log,
            delivery,
            kubeconfig: cli.kubeconfig,
            print_payload: cli.print_payload.or(file.print_payload).unwrap_or(true),
            once: cli.once,
            config_file: None,
        }
    }

    /// # Errors
    ///
    /// - [`ConfigError::MissingClusterName`] if no cluster name is configured
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if self.cluster_name.trim().is_empty() {
            return Err(Report::new(ConfigError::MissingClusterName));
        }
        Ok(())
    }
}

fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|value| !value.is_empty())
        .or(fallback.filter(|value| !value.is_empty()))
}

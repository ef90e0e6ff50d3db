use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::Parser;
use utils::version;

/// Command line and environment settings.
///
/// Every setting is optional here so that values from the config file can fill the gaps;
/// defaults are applied when the two layers are merged.
#[derive(Parser, Debug, Clone, Default)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[arg(
        long,
        env = "ELCHI_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to the YAML config file (defaults to ~/.elchi/config.yaml, then ./config.yaml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CLUSTER_NAME",
        help = "Display name of the cluster, required"
    )]
    pub cluster_name: Option<String>,

    #[arg(
        long,
        env = "DISCOVERY_INTERVAL",
        allow_negative_numbers = true,
        help = "Seconds between discovery runs, values below 1 fall back to 30"
    )]
    pub discovery_interval: Option<i64>,

    #[arg(long, env = "LOG_LEVEL", help = "Log level: trace, debug, info, warn or error")]
    pub log_level: Option<String>,

    #[arg(long, env = "LOG_FORMAT", help = "Log format: text or json")]
    pub log_format: Option<String>,

    #[arg(
        long,
        env = "LOG_OUTPUT",
        help = "Log output: stdout, stderr or a file path"
    )]
    pub log_output: Option<String>,

    #[arg(
        long,
        env = "ELCHI_TOKEN",
        hide_env_values = true,
        help = "Credential in 'uuid--project' format"
    )]
    pub token: Option<String>,

    #[arg(
        long,
        env = "ELCHI_API_ENDPOINT",
        help = "Collection endpoint, reports are only printed when empty"
    )]
    pub api_endpoint: Option<String>,

    #[arg(
        long,
        env = "ELCHI_INSECURE_SKIP_VERIFY",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set,
        help = "Skip TLS certificate verification for the collection endpoint"
    )]
    pub insecure_skip_verify: Option<bool>,

    #[arg(
        long,
        env = "ELCHI_REQUEST_TIMEOUT",
        help = "Timeout in seconds for one delivery request"
    )]
    pub request_timeout: Option<u64>,

    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to in-cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "PRINT_PAYLOAD",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set,
        help = "Print each payload as pretty JSON to stdout"
    )]
    pub print_payload: Option<bool>,

    #[arg(long, help = "Run a single discovery cycle and exit")]
    pub once: bool,
}

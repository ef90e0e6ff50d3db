//! YAML config file layer.

use std::path::Path;
use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;

use crate::config::ConfigError;

const HOME_CONFIG: &str = ".elchi/config.yaml";
const LOCAL_CONFIG: &str = "config.yaml";

/// Contents of the config file. Missing keys stay unset, unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub elchi: ElchiSection,
    pub log: LogSection,
    pub discovery_interval: Option<i64>,
    pub cluster_name: Option<String>,
    pub print_payload: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElchiSection {
    pub token: Option<String>,
    pub api_endpoint: Option<String>,
    pub insecure_skip_verify: Option<bool>,
    pub request_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub output: Option<String>,
}

impl FileConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FileRead`] if the file cannot be read
    /// - [`ConfigError::FileParse`] if the file is not valid YAML for this schema
    pub fn load(path: &Path) -> Result<Self, Report<ConfigError>> {
        let contents = std::fs::read_to_string(path).change_context(ConfigError::FileRead {
            path: path.to_path_buf(),
        })?;
        Self::parse(&contents).attach_printable_lazy(|| format!("config file: {}", path.display()))
    }

    /// Parse config file contents; an empty document yields the empty config.
    pub fn parse(contents: &str) -> Result<Self, Report<ConfigError>> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).change_context(ConfigError::FileParse)
    }
}

/// Pick the config file to load.
///
/// An explicit path always wins. Otherwise `<home>/.elchi/config.yaml` and then
/// `<cwd>/config.yaml` are used if they exist.
pub fn locate_config_file(
    explicit: Option<&Path>,
    home: Option<&Path>,
    cwd: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    home.map(|home| home.join(HOME_CONFIG))
        .into_iter()
        .chain(std::iter::once(cwd.join(LOCAL_CONFIG)))
        .find(|candidate| candidate.is_file())
}

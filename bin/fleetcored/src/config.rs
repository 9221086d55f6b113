//! Process configuration: logging and executor tunables, loaded from YAML.
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use fleetcore_executor::ExecutorConfig;

use crate::logging::LoggingConfig;

/// Top level `fleetcored` configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl Default for Conf {
    fn default() -> Conf {
        Conf {
            logging: LoggingConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

/// Load configuration from `path`, falling back to defaults if the file does not
/// exist. Matches `core/conf`'s "optional file, default everything else" precedent.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Conf> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Conf::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("unable to read configuration file at {}", path.display()))?;
    let conf = serde_yaml::from_str(&raw)
        .with_context(|| format!("unable to parse configuration file at {}", path.display()))?;
    Ok(conf)
}

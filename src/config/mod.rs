use std::fs;
use std::io::{BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UpdaterError};
use crate::networking::{PaperApi, Transport};
use crate::prompt::{Answer, Console};

mod editor;

pub use editor::edit_interactive;

/// What the updater tracks, as stored next to the executable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "paper-version")]
    pub version: String,
    #[serde(rename = "start-script-path")]
    pub script_path: PathBuf,
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stored configuration; `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<Configuration>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(UpdaterError::io(
                    format!("unable to read {}", self.path.display()),
                    err,
                ));
            }
        };
        let config = serde_json::from_str(&raw).map_err(|source| UpdaterError::ConfigParse {
            path: self.path.clone(),
            source,
        })?;
        debug!("config: loaded {}", self.path.display());
        Ok(Some(config))
    }

    /// Overwrite the stored configuration.
    pub fn save(&self, config: &Configuration) -> Result<()> {
        let json = serde_json::to_string_pretty(config).map_err(|source| {
            UpdaterError::ConfigParse {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|e| {
            UpdaterError::io(format!("unable to write {}", self.path.display()), e)
        })?;
        info!("config: saved {}", self.path.display());
        Ok(())
    }

    /// Load the configuration, running first-time setup when there is none.
    /// A freshly created configuration is saved before it is returned.
    pub async fn load_or_create<T, R, W>(
        &self,
        console: &mut Console<R, W>,
        api: &PaperApi<T>,
        default_script: &Path,
    ) -> Result<Answer<Configuration>>
    where
        T: Transport,
        R: BufRead,
        W: Write,
    {
        if let Some(config) = self.load()? {
            return Ok(Answer::Value(config));
        }

        info!("config: {} not found, starting setup", self.path.display());
        console.title("Paper Updater Configuration")?;
        let version = match editor::prompt_version(console, api, "Set Paper version", None).await? {
            Answer::Value(version) => version,
            Answer::Cancelled => return Ok(Answer::Cancelled),
        };

        let config = Configuration {
            version,
            script_path: default_script.to_path_buf(),
        };
        self.save(&config)?;
        Ok(Answer::Value(config))
    }
}

use std::env;
use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;

const STORE_DIR_NAME: &str = "dirigo";
const STORE_FILE_NAME: &str = "paths.yml";

/// Resolved location of the registry file:
/// `$XDG_CONFIG_HOME/dirigo/paths.yml`, falling back to
/// `$HOME/.config/dirigo/paths.yml`.
#[derive(Debug, Clone)]
pub struct StoreLocation {
    file_path: PathBuf,
}

impl StoreLocation {
    pub fn from_env() -> Result<Self, StoreLocationError> {
        Self::resolve(|name| env::var(name).ok())
    }

    /// Resolves the location through an injected environment accessor so
    /// tests never touch the real process environment. An empty value
    /// counts as unset.
    pub fn resolve(env_var: impl Fn(&str) -> Option<String>) -> Result<Self, StoreLocationError> {
        let xdg_config_home = env_var("XDG_CONFIG_HOME").filter(|value| !value.is_empty());
        let home = env_var("HOME").filter(|value| !value.is_empty());

        let base = match (xdg_config_home, home) {
            (Some(xdg_config_home), _) => PathBuf::from(xdg_config_home),
            (None, Some(home)) => PathBuf::from(home).join(".config"),
            (None, None) => return NoBaseDirSnafu.fail(),
        };

        Ok(Self {
            file_path: base.join(STORE_DIR_NAME).join(STORE_FILE_NAME),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The directory holding the registry file.
    pub fn dir_path(&self) -> &Path {
        // file_path always ends in "<dir>/paths.yml", so a parent exists
        self.file_path.parent().unwrap_or(Path::new(""))
    }
}

#[derive(Debug, Snafu)]
pub enum StoreLocationError {
    #[snafu(display("Neither XDG_CONFIG_HOME nor HOME are set"))]
    NoBaseDir,
}

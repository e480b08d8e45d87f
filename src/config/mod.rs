#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{CliCommand, CliConfig};

pub use settings::{ConfigStore, RuntimeSettings, ServerSettings, Settings};

use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "config.toml";
pub const DATA_FILE: &str = "data.toml";

/// Files of one provisioner instance, all under a single data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn ensure_exists(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }
}

use crate::utils::error::{ContestError, Result};
use crate::utils::fs::write_atomic;
use crate::utils::token::{generate_random_token, DEFAULT_TOKEN_BYTES};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT_START: u16 = 30000;
pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerSettings {
    /// Last port handed out by the allocator.
    #[serde(default = "default_port_start")]
    pub port_start: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeSettings {
    #[serde(default = "default_template")]
    pub template: PathBuf,
    #[serde(default = "default_rendered")]
    pub rendered: PathBuf,
    #[serde(default = "default_compose_command")]
    pub compose_command: Vec<String>,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_backend_host")]
    pub backend_host: String,
}

fn default_port_start() -> u16 {
    DEFAULT_PORT_START
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_template() -> PathBuf {
    PathBuf::from("docker-compose-default.yml")
}
fn default_rendered() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}
fn default_compose_command() -> Vec<String> {
    vec!["docker-compose".to_string()]
}
fn default_command_timeout() -> u64 {
    120
}
fn default_backend_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port_start: DEFAULT_PORT_START,
            http_port: DEFAULT_HTTP_PORT,
            bearer_token: None,
            origin_host: None,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            template: default_template(),
            rendered: default_rendered(),
            compose_command: default_compose_command(),
            command_timeout_secs: default_command_timeout(),
            backend_host: default_backend_host(),
        }
    }
}

impl RuntimeSettings {
    pub fn template_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.template)
    }

    pub fn rendered_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.rendered)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn backend_ip(&self) -> Result<IpAddr> {
        self.backend_host
            .parse()
            .map_err(|e| ContestError::InvalidConfigValueError {
                field: "runtime.backend-host".to_string(),
                value: self.backend_host.clone(),
                reason: format!("{}", e),
            })
    }
}

impl Settings {
    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ContestError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ContestError::ConfigError {
            field: "toml_serializing".to_string(),
            message: e.to_string(),
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_range("server.http-port", self.server.http_port, 1, u16::MAX)?;
        validate_positive_number(
            "runtime.command-timeout-secs",
            self.runtime.command_timeout_secs,
            1,
        )?;
        validate_path("runtime.template", &self.runtime.template.to_string_lossy())?;
        validate_path("runtime.rendered", &self.runtime.rendered.to_string_lossy())?;

        match self.runtime.compose_command.first() {
            Some(program) => validate_non_empty_string("runtime.compose-command", program)?,
            None => {
                return Err(ContestError::InvalidConfigValueError {
                    field: "runtime.compose-command".to_string(),
                    value: "[]".to_string(),
                    reason: "At least the program name is required".to_string(),
                })
            }
        }

        self.runtime.backend_ip()?;
        Ok(())
    }
}

/// Settings file plus its in-memory mirror. Every mutation is written through.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    settings: Settings,
}

impl ConfigStore {
    /// 載入設定檔；不存在時寫入預設值，缺少 token 時產生並保存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let settings = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Settings::from_toml_str(&content)?
        } else {
            tracing::info!("Creating default settings at {}", path.display());
            Settings::default()
        };
        settings.validate()?;

        let mut store = Self { path, settings };
        let token_missing = store
            .settings
            .server
            .bearer_token
            .as_deref()
            .map(str::is_empty)
            .unwrap_or(true);

        if token_missing {
            store.settings.server.bearer_token = Some(generate_random_token(DEFAULT_TOKEN_BYTES));
            tracing::warn!("🔑 No bearer token configured, generated a new one");
            store.save()?;
        } else if !store.path.exists() {
            store.save()?;
        }

        Ok(store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bearer_token(&self) -> &str {
        self.settings.server.bearer_token.as_deref().unwrap_or("")
    }

    pub fn port_cursor(&self) -> u16 {
        self.settings.server.port_start
    }

    /// Persists the allocator cursor. The mirror is left unchanged if the write fails.
    pub fn set_port_cursor(&mut self, port: u16) -> Result<()> {
        let previous = self.settings.server.port_start;
        self.settings.server.port_start = port;
        if let Err(e) = self.save() {
            self.settings.server.port_start = previous;
            return Err(e);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let content = self.settings.to_toml_string()?;
        write_atomic(&self.path, content.as_bytes())
    }
}

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of a single container lifecycle call.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Deployment template not found: {}", .path.display())]
    TemplateMissing { path: PathBuf },

    #[error("Failed to render deployment config {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lifecycle command for '{server_name}' exited with {}: {output}", describe_exit(.code))]
    CommandFailed {
        server_name: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Lifecycle command for '{server_name}' timed out after {}s", .after.as_secs())]
    Timeout { server_name: String, after: Duration },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        // 被訊號中斷
        None => "no status (interrupted)".to_string(),
    }
}

#[derive(Error, Debug)]
pub enum ContestError {
    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Member {member} already belongs to team {team_id}")]
    MemberTaken { member: String, team_id: String },

    #[error("Team {team_id} already exists")]
    TeamExists { team_id: String },

    #[error("No free port left after {cursor}")]
    PortsExhausted { cursor: u16 },

    #[error("Provisioning failed: {0}")]
    ProvisionError(#[from] ProvisionError),

    #[error("Failed to persist {}: {source}", .path.display())]
    PersistenceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("Invalid config value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Operation interrupted: {message}")]
    Interrupted { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Exhausted,
    Provision,
    Persistence,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ContestError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ContestError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ContestError::ValidationError { .. }
            | ContestError::MemberTaken { .. }
            | ContestError::TeamExists { .. } => ErrorCategory::Validation,
            ContestError::PortsExhausted { .. } => ErrorCategory::Exhausted,
            ContestError::ProvisionError(_) | ContestError::Interrupted { .. } => {
                ErrorCategory::Provision
            }
            ContestError::PersistenceError { .. } | ContestError::IoError(_) => {
                ErrorCategory::Persistence
            }
            ContestError::ConfigError { .. } | ContestError::InvalidConfigValueError { .. } => {
                ErrorCategory::Config
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Provision => ErrorSeverity::Medium,
            ErrorCategory::Exhausted | ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::Persistence => ErrorSeverity::Critical,
        }
    }

    /// Whether the caller sent something wrong (as opposed to the host failing).
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ContestError::ValidationError { field, message } => {
                format!("Invalid {}: {}", field, message)
            }
            ContestError::MemberTaken { member, .. } => {
                format!("Member {} is already in a team", member)
            }
            ContestError::TeamExists { team_id } => format!("Team {} already exists", team_id),
            ContestError::PortsExhausted { .. } => "No server port is available".to_string(),
            ContestError::ProvisionError(_) => "Failed to start the team server".to_string(),
            ContestError::Interrupted { .. } => "Team creation was interrupted".to_string(),
            ContestError::PersistenceError { .. } | ContestError::IoError(_) => {
                "Failed to save team data".to_string()
            }
            ContestError::ConfigError { .. } | ContestError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Check the team id, name and member names and retry",
            ErrorCategory::Exhausted => "Lower port-start in config.toml or free up ports",
            ErrorCategory::Provision => {
                "Check the deployment template and the compose command output"
            }
            ErrorCategory::Persistence => "Check disk space and permissions of the data directory",
            ErrorCategory::Config => "Fix config.toml and restart",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContestError>;

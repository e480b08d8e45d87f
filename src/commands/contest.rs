use crate::core::Orchestrator;
use crate::domain::model::{NewTeam, Team};
use crate::utils::error::{ContestError, ErrorSeverity};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

pub const USAGE: &str = "Usage: contest create <teamId> <teamName> <members>";

/// Exit code for a malformed command line (sysexits EX_USAGE).
pub const USAGE_EXIT_CODE: i32 = 64;

#[derive(Debug)]
pub enum CommandOutcome {
    Usage,
    Created(Team),
    Failed(ContestError),
}

impl CommandOutcome {
    pub fn message(&self) -> String {
        match self {
            CommandOutcome::Usage => USAGE.to_string(),
            CommandOutcome::Created(team) => format!(
                "Server for team '{}' created successfully on port {}.",
                team.name, team.port
            ),
            CommandOutcome::Failed(e) => {
                format!("Failed to create server: {}", e.user_friendly_message())
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Created(_) => 0,
            CommandOutcome::Usage => USAGE_EXIT_CODE,
            // 根據錯誤嚴重程度決定退出碼
            CommandOutcome::Failed(e) => match e.severity() {
                ErrorSeverity::Low => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 3,
                ErrorSeverity::Critical => 4,
            },
        }
    }
}

/// `create <teamId> <teamName> <m1,m2,...>`; anything else is a usage error.
pub fn parse_create(args: &[String]) -> Option<NewTeam> {
    match args {
        [action, team_id, team_name, members] if action == "create" => Some(NewTeam::new(
            team_id,
            team_name,
            members.split(',').map(str::to_string).collect(),
        )),
        _ => None,
    }
}

pub async fn execute(orchestrator: &Arc<Orchestrator>, args: &[String]) -> CommandOutcome {
    let Some(request) = parse_create(args) else {
        return CommandOutcome::Usage;
    };

    match orchestrator.create(request).await {
        Ok(team) => CommandOutcome::Created(team),
        Err(e) => {
            tracing::error!("contest create failed: {} ({:?})", e, e.category());
            CommandOutcome::Failed(e)
        }
    }
}

/// Forwards stdin lines from a dedicated blocking thread.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Console input error: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Dispatches `contest ...` console lines until input closes or shutdown is signalled.
///
/// Shutdown is only observed between lines; a command already running finishes first.
pub async fn run_console(
    orchestrator: Arc<Orchestrator>,
    mut lines: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let line = tokio::select! {
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
            // 收到停止訊號或發送端已關閉
            _ = shutdown.changed() => {
                tracing::debug!("Console stopping on shutdown");
                break;
            }
        };

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match tokens.split_first() {
            None => continue,
            Some((command, args)) if command == "contest" => {
                let outcome = execute(&orchestrator, args).await;
                println!("{}", outcome.message());
            }
            Some((command, _)) => println!("Unknown command '{}'. {}", command, USAGE),
        }
    }
    tracing::debug!("Console input closed");
}

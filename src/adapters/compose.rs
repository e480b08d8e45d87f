use crate::config::RuntimeSettings;
use crate::domain::model::DeploymentDescriptor;
use crate::domain::ports::ContainerRuntime;
use crate::utils::error::ProvisionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};

pub const SERVER_NAME_PLACEHOLDER: &str = "#SERVER_NAME_PLACEHOLDER";
pub const SERVER_PORT_PLACEHOLDER: &str = "#SERVER_PORT_PLACEHOLDER";

/// Runs team servers through a docker-compose style command.
///
/// Every start renders the template into one shared file, so starts must not
/// overlap; the orchestrator's create lock guarantees that.
#[derive(Debug, Clone)]
pub struct ComposeRuntime {
    template_path: PathBuf,
    rendered_path: PathBuf,
    command: Vec<String>,
    timeout: Duration,
}

impl ComposeRuntime {
    pub fn new(
        template_path: PathBuf,
        rendered_path: PathBuf,
        command: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            template_path,
            rendered_path,
            command,
            timeout,
        }
    }

    pub fn from_settings(runtime: &RuntimeSettings, data_dir: &Path) -> Self {
        Self::new(
            runtime.template_path(data_dir),
            runtime.rendered_path(data_dir),
            runtime.compose_command.clone(),
            runtime.command_timeout(),
        )
    }

    pub fn rendered_path(&self) -> &Path {
        &self.rendered_path
    }

    /// 以模板產生 compose 檔，覆蓋上一次的結果
    pub async fn render(
        &self,
        server_name: &str,
        port: u16,
    ) -> Result<DeploymentDescriptor, ProvisionError> {
        if !tokio::fs::try_exists(&self.template_path)
            .await
            .unwrap_or(false)
        {
            tracing::error!("Template not found: {}", self.template_path.display());
            return Err(ProvisionError::TemplateMissing {
                path: self.template_path.clone(),
            });
        }

        let template = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|source| ProvisionError::Render {
                path: self.template_path.clone(),
                source,
            })?;

        let content = template
            .replace(SERVER_NAME_PLACEHOLDER, server_name)
            .replace(SERVER_PORT_PLACEHOLDER, &port.to_string());

        let render_err = |source: std::io::Error| ProvisionError::Render {
            path: self.rendered_path.clone(),
            source,
        };
        match tokio::fs::remove_file(&self.rendered_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(render_err(e)),
        }
        tokio::fs::write(&self.rendered_path, content)
            .await
            .map_err(render_err)?;

        tracing::info!(
            "Compose file rendered for {} on port {} at {}",
            server_name,
            port,
            self.rendered_path.display()
        );

        Ok(DeploymentDescriptor {
            server_name: server_name.to_string(),
            port,
            rendered_config_path: self.rendered_path.clone(),
        })
    }

    /// Runs `<command> -f <file> -p <server_name> <action...>` and returns combined output.
    async fn run(
        &self,
        server_name: &str,
        compose_file: &Path,
        action: &[&str],
    ) -> Result<String, ProvisionError> {
        let (program, leading_args) = match self.command.split_first() {
            Some(split) => split,
            None => {
                return Err(ProvisionError::Launch {
                    program: String::new(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "compose command is empty",
                    ),
                })
            }
        };

        let mut cmd = Command::new(program);
        cmd.args(leading_args)
            .arg("-f")
            .arg(compose_file)
            .arg("-p")
            .arg(server_name)
            .args(action)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running {} {:?} for {}", program, action, server_name);

        let mut child = cmd.spawn().map_err(|source| ProvisionError::Launch {
            program: program.clone(),
            source,
        })?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(ProvisionError::Launch {
                program: program.clone(),
                source: std::io::Error::other("output pipes unavailable"),
            });
        };

        // 逾時後 future 被丟棄，kill_on_drop 會終止子行程
        let finished = tokio::time::timeout(self.timeout, async {
            let combined = collect_output(stdout, stderr).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, combined))
        })
        .await;

        let (status, combined) = match finished {
            Ok(Ok(finished)) => finished,
            Ok(Err(source)) => {
                return Err(ProvisionError::Launch {
                    program: program.clone(),
                    source,
                })
            }
            Err(_) => {
                tracing::error!(
                    "⏱️ {} {:?} for {} timed out after {:?}",
                    program,
                    action,
                    server_name,
                    self.timeout
                );
                return Err(ProvisionError::Timeout {
                    server_name: server_name.to_string(),
                    after: self.timeout,
                });
            }
        };

        if status.success() {
            tracing::debug!("Compose output for {}: {}", server_name, combined);
            Ok(combined)
        } else {
            tracing::error!(
                "Compose {:?} failed for {} (status {:?}): {}",
                action,
                server_name,
                status.code(),
                combined
            );
            Err(ProvisionError::CommandFailed {
                server_name: server_name.to_string(),
                code: status.code(),
                output: combined,
            })
        }
    }
}

/// Reads both streams line by line into one buffer, in the order lines arrive.
async fn collect_output(stdout: ChildStdout, stderr: ChildStderr) -> std::io::Result<String> {
    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();
    let (mut out_open, mut err_open) = (true, true);
    let mut combined = Vec::new();

    while out_open || err_open {
        tokio::select! {
            line = out_lines.next_line(), if out_open => match line? {
                Some(line) => combined.push(line),
                None => out_open = false,
            },
            line = err_lines.next_line(), if err_open => match line? {
                Some(line) => combined.push(line),
                None => err_open = false,
            },
        }
    }
    Ok(combined.join("\n").trim().to_string())
}

#[async_trait]
impl ContainerRuntime for ComposeRuntime {
    async fn start(&self, server_name: &str, port: u16) -> Result<(), ProvisionError> {
        let descriptor = self.render(server_name, port).await?;
        self.run(
            &descriptor.server_name,
            &descriptor.rendered_config_path,
            &["up", "-d"],
        )
        .await?;
        tracing::info!("🐳 Instance {} is up on port {}", server_name, port);
        Ok(())
    }

    /// Tears the project down using the template, leaving the shared rendered file alone.
    async fn stop(&self, server_name: &str) -> Result<(), ProvisionError> {
        if !tokio::fs::try_exists(&self.template_path)
            .await
            .unwrap_or(false)
        {
            return Err(ProvisionError::TemplateMissing {
                path: self.template_path.clone(),
            });
        }
        self.run(server_name, &self.template_path, &["down"]).await?;
        tracing::info!("Instance {} stopped", server_name);
        Ok(())
    }
}

#![cfg(unix)]

use contest_provisioner::adapters::ComposeRuntime;
use contest_provisioner::domain::ports::ContainerRuntime;
use contest_provisioner::utils::error::ProvisionError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const TEMPLATE: &str = "services:\n  mc:\n    container_name: #SERVER_NAME_PLACEHOLDER\n    ports:\n      - \"#SERVER_PORT_PLACEHOLDER:25565\"\n";

/// Writes a shell script standing in for docker-compose and returns its path.
fn fake_compose(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("fake-compose.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    script
}

fn runtime(dir: &TempDir, script: &Path, timeout: Duration) -> ComposeRuntime {
    ComposeRuntime::new(
        dir.path().join("docker-compose-default.yml"),
        dir.path().join("docker-compose.yml"),
        vec!["sh".to_string(), script.display().to_string()],
        timeout,
    )
}

fn write_template(dir: &TempDir) {
    std::fs::write(dir.path().join("docker-compose-default.yml"), TEMPLATE).unwrap();
}

#[tokio::test]
async fn test_start_renders_and_runs_up() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let log = dir.path().join("calls.log");
    let script = fake_compose(dir.path(), &format!("echo \"$@\" >> {}", log.display()));
    let rt = runtime(&dir, &script, Duration::from_secs(10));

    rt.start("t1", 30001).await.unwrap();

    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(
        calls.trim(),
        format!("-f {} -p t1 up -d", dir.path().join("docker-compose.yml").display())
    );

    let rendered = std::fs::read_to_string(dir.path().join("docker-compose.yml")).unwrap();
    assert!(rendered.contains("container_name: t1"));
    assert!(rendered.contains("30001:25565"));
}

#[tokio::test]
async fn test_stop_runs_down_against_template() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let log = dir.path().join("calls.log");
    let script = fake_compose(dir.path(), &format!("echo \"$@\" >> {}", log.display()));
    let rt = runtime(&dir, &script, Duration::from_secs(10));

    rt.stop("t1").await.unwrap();

    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(
        calls.trim(),
        format!(
            "-f {} -p t1 down",
            dir.path().join("docker-compose-default.yml").display()
        )
    );
    assert!(!dir.path().join("docker-compose.yml").exists());
}

#[tokio::test]
async fn test_non_zero_exit_is_command_failed() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let script = fake_compose(dir.path(), "echo 'port is already allocated' >&2\nexit 3");
    let rt = runtime(&dir, &script, Duration::from_secs(10));

    let err = rt.start("t1", 30001).await.unwrap_err();
    match err {
        ProvisionError::CommandFailed {
            server_name,
            code,
            output,
        } => {
            assert_eq!(server_name, "t1");
            assert_eq!(code, Some(3));
            assert!(output.contains("port is already allocated"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_hanging_command_times_out() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let script = fake_compose(dir.path(), "sleep 10");
    let rt = runtime(&dir, &script, Duration::from_secs(1));

    let started = std::time::Instant::now();
    let err = rt.start("t1", 30001).await.unwrap_err();

    assert!(matches!(err, ProvisionError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_program_is_launch_error() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let rt = ComposeRuntime::new(
        dir.path().join("docker-compose-default.yml"),
        dir.path().join("docker-compose.yml"),
        vec!["definitely-not-a-compose-binary".to_string()],
        Duration::from_secs(5),
    );

    let err = rt.start("t1", 30001).await.unwrap_err();
    assert!(matches!(err, ProvisionError::Launch { .. }));
}

#[tokio::test]
async fn test_missing_template_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("calls.log");
    let script = fake_compose(dir.path(), &format!("echo \"$@\" >> {}", log.display()));
    let rt = runtime(&dir, &script, Duration::from_secs(10));

    let err = rt.start("t1", 30001).await.unwrap_err();
    assert!(matches!(err, ProvisionError::TemplateMissing { .. }));
    assert!(rt.stop("t1").await.is_err());
    assert!(!log.exists());
}

#[tokio::test]
async fn test_output_keeps_stdout_and_stderr_order() {
    let dir = TempDir::new().unwrap();
    write_template(&dir);
    let script = fake_compose(
        dir.path(),
        "echo pulling\nsleep 0.2\necho 'bind failed' >&2\nsleep 0.2\necho 'rolling back'\nexit 1",
    );
    let rt = runtime(&dir, &script, Duration::from_secs(10));

    match rt.start("t1", 30001).await.unwrap_err() {
        ProvisionError::CommandFailed { output, .. } => {
            assert_eq!(output, "pulling\nbind failed\nrolling back");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

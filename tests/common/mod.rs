#![allow(dead_code)]

use async_trait::async_trait;
use contest_provisioner::config::DataDir;
use contest_provisioner::domain::ports::ContainerRuntime;
use contest_provisioner::utils::error::ProvisionError;
use contest_provisioner::Provisioner;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_TOKEN: &str = "test-token-123";

/// ContainerRuntime that records calls instead of spawning processes.
#[derive(Default)]
pub struct FakeRuntime {
    failing: Mutex<HashSet<String>>,
    fail_all: bool,
    delay: Option<Duration>,
    started: Mutex<Vec<(String, u16)>>,
    stopped: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_team(&self, server_name: &str) {
        self.failing.lock().unwrap().insert(server_name.to_string());
    }

    pub fn started(&self) -> Vec<(String, u16)> {
        self.started.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn start(&self, server_name: &str, port: u16) -> Result<(), ProvisionError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all || self.failing.lock().unwrap().contains(server_name) {
            return Err(ProvisionError::CommandFailed {
                server_name: server_name.to_string(),
                code: Some(1),
                output: "fake failure".to_string(),
            });
        }

        self.started
            .lock()
            .unwrap()
            .push((server_name.to_string(), port));
        Ok(())
    }

    async fn stop(&self, server_name: &str) -> Result<(), ProvisionError> {
        self.stopped.lock().unwrap().push(server_name.to_string());
        Ok(())
    }
}

pub fn write_settings(dir: &Path, port_start: u16) {
    std::fs::write(
        dir.join("config.toml"),
        format!(
            "[server]\nport-start = {}\nhttp-port = 8080\nbearer-token = \"{}\"\n",
            port_start, TEST_TOKEN
        ),
    )
    .unwrap();
}

pub fn open_provisioner(dir: &Path, runtime: Arc<FakeRuntime>) -> Provisioner {
    Provisioner::open_with(DataDir::new(dir), move |_, _| runtime as Arc<dyn ContainerRuntime>).unwrap()
}

pub fn members(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

use crate::core::port_allocator::PortAllocator;
use crate::core::team_store::TeamStore;
use crate::domain::model::{NewTeam, Team};
use crate::domain::ports::{BackendRegistry, ContainerRuntime};
use crate::utils::error::{ContestError, Result};
use crate::utils::validation::{
    validate_char_length, validate_pattern, Validate, MEMBER_PATTERN, TEAM_ID_PATTERN,
    TEAM_NAME_MAX_CHARS, TEAM_NAME_MIN_CHARS,
};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

impl Validate for NewTeam {
    fn validate(&self) -> Result<()> {
        validate_pattern("teamId", &self.team_id, &TEAM_ID_PATTERN)?;
        validate_char_length(
            "teamName",
            &self.team_name,
            TEAM_NAME_MIN_CHARS,
            TEAM_NAME_MAX_CHARS,
        )?;

        if self.members.is_empty() {
            return Err(ContestError::validation("members", "at least one member is required"));
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            validate_pattern("members", member, &MEMBER_PATTERN)?;
            if !seen.insert(member.as_str()) {
                return Err(ContestError::validation(
                    "members",
                    format!("'{}' is listed twice", member),
                ));
            }
        }
        Ok(())
    }
}

/// Coordinates validation, port allocation, instance start and commit for team creation.
///
/// The allocator sits behind the create lock: holding it is the only way to
/// allocate, start an instance or add a team, so at most one create runs
/// between allocation and commit. Each create runs on its own task, so a
/// caller that goes away (dropped HTTP connection, aborted console) never
/// interrupts it.
pub struct Orchestrator {
    create_lock: Mutex<PortAllocator>,
    teams: RwLock<TeamStore>,
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<dyn BackendRegistry>,
    backend_ip: IpAddr,
}

impl Orchestrator {
    pub fn new(
        allocator: PortAllocator,
        teams: TeamStore,
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<dyn BackendRegistry>,
        backend_ip: IpAddr,
    ) -> Self {
        Self {
            create_lock: Mutex::new(allocator),
            teams: RwLock::new(teams),
            runtime,
            registry,
            backend_ip,
        }
    }

    pub fn backend_address(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.backend_ip, port)
    }

    /// Re-registers every stored team with the router. Returns how many were registered.
    pub async fn restore_routes(&self) -> usize {
        let teams = self.teams.read().await;
        let ports = teams.all_team_ports();
        for (id, port) in &ports {
            self.registry.register(id, self.backend_address(*port));
        }
        tracing::info!("🔁 Restored {} backend route(s)", ports.len());
        ports.len()
    }

    pub async fn create(self: &Arc<Self>, request: NewTeam) -> Result<Team> {
        let orchestrator = Arc::clone(self);
        let team_id = request.team_id.clone();

        tokio::spawn(async move { orchestrator.run_create(request).await })
            .await
            .map_err(|e| {
                tracing::error!("❌ Create task for team {} did not finish: {}", team_id, e);
                ContestError::Interrupted {
                    message: e.to_string(),
                }
            })?
    }

    /// Waits until no create is between allocation and commit.
    pub async fn drain(&self) {
        let _idle = self.create_lock.lock().await;
        tracing::debug!("No create in flight");
    }

    async fn run_create(&self, request: NewTeam) -> Result<Team> {
        // 1. 驗證欄位格式
        request.validate()?;

        let mut allocator = self.create_lock.lock().await;

        // 2. 驗證成員與隊伍 ID 是否已存在
        {
            let teams = self.teams.read().await;
            Self::check_availability(&teams, &request)?;
        }

        // 3. 分配端口
        let reservation = {
            let teams = self.teams.read().await;
            allocator.reserve(&teams)?
        };
        let port = reservation.port();
        tracing::info!("Allocated port {} for team {}", port, request.team_id);

        // 4. 啟動實例
        if let Err(e) = self.runtime.start(&request.team_id, port).await {
            tracing::error!("❌ Failed to start instance for team {}: {}", request.team_id, e);
            if let Err(release_err) = allocator.release(reservation) {
                tracing::warn!("Could not release port {}: {}", port, release_err);
            }
            return Err(e.into());
        }
        let port = allocator.commit(reservation);

        // 5. 註冊路由並保存隊伍
        let team = request.into_team(port);
        let address = self.backend_address(port);
        self.registry.register(&team.id, address);

        let persisted = self.teams.write().await.add_team(&team);
        if let Err(e) = persisted {
            self.registry.unregister(&team.id);
            tracing::error!(
                "❌ Team {} is running on port {} but could not be saved: {}",
                team.id,
                port,
                e
            );
            return Err(e);
        }

        tracing::info!(
            "✅ Team {} ({}) created on port {} with {} member(s)",
            team.id,
            team.name,
            port,
            team.members.len()
        );
        Ok(team)
    }

    fn check_availability(teams: &TeamStore, request: &NewTeam) -> Result<()> {
        for member in &request.members {
            if let Some(team_id) = teams.find_team_id_by_member(member) {
                return Err(ContestError::MemberTaken {
                    member: member.clone(),
                    team_id,
                });
            }
        }
        if teams.contains_team(&request.team_id) {
            return Err(ContestError::TeamExists {
                team_id: request.team_id.clone(),
            });
        }
        Ok(())
    }

    pub async fn get_team(&self, id: &str) -> Option<Team> {
        self.teams.read().await.get_team(id)
    }

    pub async fn list_team_ids(&self) -> Vec<String> {
        self.teams.read().await.list_team_ids()
    }

    /// Team and backend a member should be sent to when they join the router.
    pub async fn resolve_member(&self, member: &str) -> Option<(String, SocketAddr)> {
        let team_id = self.teams.read().await.find_team_id_by_member(member)?;
        match self.registry.lookup(&team_id) {
            Some(address) => Some((team_id, address)),
            None => {
                tracing::warn!("Member {} belongs to {} but no backend is registered", member, team_id);
                None
            }
        }
    }

    pub async fn port_cursor(&self) -> u16 {
        self.create_lock.lock().await.cursor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, name: &str, members: &[&str]) -> NewTeam {
        NewTeam::new(id, name, members.iter().map(|m| m.to_string()).collect())
    }

    #[test]
    fn test_request_validation_boundaries() {
        assert!(request("abc", "Team", &["alice"]).validate().is_ok());
        assert!(request("abcdefghij", "Team", &["alice"]).validate().is_ok());
        assert!(request("ab", "Team", &["alice"]).validate().is_err());
        assert!(request("abcdefghijk", "Team", &["alice"]).validate().is_err());

        assert!(request("t01", "Tea", &["alice"]).validate().is_ok());
        assert!(request("t01", "Te", &["alice"]).validate().is_err());
        assert!(request("t01", "Ten chars!", &["alice"]).validate().is_ok());
        assert!(request("t01", "Eleven char", &["alice"]).validate().is_err());

        assert!(request("t01", "Team", &["abc"]).validate().is_ok());
        assert!(request("t01", "Team", &["m".repeat(16).as_str()]).validate().is_ok());
        assert!(request("t01", "Team", &["ab"]).validate().is_err());
        assert!(request("t01", "Team", &["m".repeat(17).as_str()]).validate().is_err());
    }

    #[test]
    fn test_members_must_be_present_and_distinct() {
        assert!(request("t01", "Team", &[]).validate().is_err());
        let err = request("t01", "Team", &["alice", "alice"]).validate().unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }
}

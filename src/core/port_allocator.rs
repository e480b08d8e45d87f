use crate::config::ConfigStore;
use crate::core::team_store::TeamStore;
use crate::utils::error::{ContestError, Result};

pub const MAX_PORT: u16 = u16::MAX;

/// A port handed out but not yet committed to a team.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or released"]
pub struct PortReservation {
    port: u16,
    previous_cursor: u16,
}

impl PortReservation {
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Monotonic port cursor, persisted as `port-start` in the settings file.
#[derive(Debug)]
pub struct PortAllocator {
    config: ConfigStore,
}

impl PortAllocator {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    /// Last port handed out.
    pub fn cursor(&self) -> u16 {
        self.config.port_cursor()
    }

    /// Moves the cursor past the next port no stored team uses and persists it.
    pub fn reserve(&mut self, teams: &TeamStore) -> Result<PortReservation> {
        let cursor = self.cursor();

        // 從 cursor + 1 往上找，跳過已被隊伍使用的端口
        let candidate = (u32::from(cursor) + 1..=u32::from(MAX_PORT))
            .map(|p| p as u16)
            .find(|&p| !teams.is_port_taken(p))
            .ok_or(ContestError::PortsExhausted { cursor })?;

        if candidate != cursor + 1 {
            tracing::debug!(
                "Skipped ports {}..{} already assigned to teams",
                cursor + 1,
                candidate
            );
        }

        self.config.set_port_cursor(candidate)?;
        Ok(PortReservation {
            port: candidate,
            previous_cursor: cursor,
        })
    }

    pub fn commit(&mut self, reservation: PortReservation) -> u16 {
        reservation.port
    }

    /// Gives a reserved port back by rewinding the cursor.
    ///
    /// Only rewinds when nothing was reserved after it; otherwise the port stays skipped.
    pub fn release(&mut self, reservation: PortReservation) -> Result<()> {
        if self.cursor() != reservation.port {
            tracing::warn!(
                "Port {} not released: cursor moved on to {}",
                reservation.port,
                self.cursor()
            );
            return Ok(());
        }

        self.config.set_port_cursor(reservation.previous_cursor)?;
        tracing::debug!(
            "Released port {}, cursor back at {}",
            reservation.port,
            reservation.previous_cursor
        );
        Ok(())
    }

    /// Reserve and commit in one step.
    pub fn next_port(&mut self, teams: &TeamStore) -> Result<u16> {
        let reservation = self.reserve(teams)?;
        Ok(self.commit(reservation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Team;
    use tempfile::TempDir;

    fn setup(dir: &TempDir, port_start: u16) -> (PortAllocator, TeamStore) {
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!("[server]\nport-start = {}\nbearer-token = \"t\"\n", port_start),
        )
        .unwrap();
        let config = ConfigStore::open(&config_path).unwrap();
        let teams = TeamStore::open(dir.path().join("data.toml")).unwrap();
        (PortAllocator::new(config), teams)
    }

    fn add(teams: &mut TeamStore, id: &str, port: u16) {
        teams
            .add_team(&Team {
                id: id.to_string(),
                name: id.to_string(),
                members: vec![format!("{}_m", id)],
                port,
            })
            .unwrap();
    }

    #[test]
    fn test_ports_strictly_increase() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, teams) = setup(&dir, 30000);

        let ports: Vec<u16> = (0..5).map(|_| allocator.next_port(&teams).unwrap()).collect();
        assert_eq!(ports, vec![30001, 30002, 30003, 30004, 30005]);
        assert_eq!(allocator.cursor(), 30005);
    }

    #[test]
    fn test_skips_ports_recorded_for_teams() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, mut teams) = setup(&dir, 30000);
        add(&mut teams, "a", 30001);
        add(&mut teams, "b", 30002);
        add(&mut teams, "c", 30004);

        assert_eq!(allocator.next_port(&teams).unwrap(), 30003);
        assert_eq!(allocator.next_port(&teams).unwrap(), 30005);
    }

    #[test]
    fn test_exhausted_at_top_of_range() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, mut teams) = setup(&dir, 65533);
        add(&mut teams, "a", 65535);

        assert_eq!(allocator.next_port(&teams).unwrap(), 65534);
        let err = allocator.next_port(&teams).unwrap_err();
        assert!(matches!(err, ContestError::PortsExhausted { cursor: 65534 }));
        // 失敗時 cursor 不變
        assert_eq!(allocator.cursor(), 65534);
    }

    #[test]
    fn test_release_rewinds_cursor() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, teams) = setup(&dir, 30000);

        let reservation = allocator.reserve(&teams).unwrap();
        assert_eq!(reservation.port(), 30001);
        allocator.release(reservation).unwrap();

        assert_eq!(allocator.cursor(), 30000);
        assert_eq!(allocator.next_port(&teams).unwrap(), 30001);
    }

    #[test]
    fn test_release_after_later_reservation_keeps_cursor() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, teams) = setup(&dir, 30000);

        let first = allocator.reserve(&teams).unwrap();
        let second = allocator.reserve(&teams).unwrap();
        allocator.release(first).unwrap();

        assert_eq!(allocator.cursor(), 30002);
        assert_eq!(allocator.commit(second), 30002);
    }

    #[test]
    fn test_cursor_survives_reload() {
        let dir = TempDir::new().unwrap();
        let (mut allocator, teams) = setup(&dir, 30000);
        allocator.next_port(&teams).unwrap();
        allocator.next_port(&teams).unwrap();
        drop(allocator);

        let config = ConfigStore::open(dir.path().join("config.toml")).unwrap();
        let mut reloaded = PortAllocator::new(config);
        assert_eq!(reloaded.next_port(&teams).unwrap(), 30003);
    }
}

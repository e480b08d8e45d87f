use crate::domain::model::{Team, TeamRecord};
use crate::utils::error::{ContestError, Result};
use crate::utils::fs::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk layout of the data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DataFile {
    #[serde(default)]
    teams: BTreeMap<String, TeamRecord>,
}

/// Team records: served from memory, written through to the data file on every change.
#[derive(Debug)]
pub struct TeamStore {
    path: PathBuf,
    teams: BTreeMap<String, TeamRecord>,
}

impl TeamStore {
    /// 載入資料檔；不存在時建立空的隊伍表
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let store = Self {
                path,
                teams: BTreeMap::new(),
            };
            store.save()?;
            return Ok(store);
        }

        let content = std::fs::read_to_string(&path)?;
        let data: DataFile = toml::from_str(&content).map_err(|e| ContestError::ConfigError {
            field: path.display().to_string(),
            message: format!("TOML parsing error: {}", e),
        })?;

        tracing::info!("Loaded {} team(s) from {}", data.teams.len(), path.display());
        Ok(Self {
            path,
            teams: data.teams,
        })
    }

    pub fn list_team_ids(&self) -> Vec<String> {
        self.teams.keys().cloned().collect()
    }

    pub fn get_team(&self, id: &str) -> Option<Team> {
        self.teams.get(id).map(|record| Team::from_record(id, record))
    }

    pub fn contains_team(&self, id: &str) -> bool {
        self.teams.contains_key(id)
    }

    pub fn find_team_id_by_member(&self, member: &str) -> Option<String> {
        self.teams
            .iter()
            .find(|(_, record)| record.members.iter().any(|m| m == member))
            .map(|(id, _)| id.clone())
    }

    pub fn is_member_registered(&self, member: &str) -> bool {
        self.find_team_id_by_member(member).is_some()
    }

    pub fn is_port_taken(&self, port: u16) -> bool {
        self.teams.values().any(|record| record.port == port)
    }

    pub fn all_team_ports(&self) -> BTreeMap<String, u16> {
        self.teams
            .iter()
            .map(|(id, record)| (id.clone(), record.port))
            .collect()
    }

    /// Adds a team and persists the whole table.
    ///
    /// On a failed write the in-memory table is rolled back, so mirror and
    /// file never disagree about which teams exist.
    pub fn add_team(&mut self, team: &Team) -> Result<()> {
        if self.teams.contains_key(&team.id) {
            return Err(ContestError::TeamExists {
                team_id: team.id.clone(),
            });
        }

        self.teams.insert(team.id.clone(), team.to_record());
        if let Err(e) = self.save() {
            self.teams.remove(&team.id);
            return Err(e);
        }

        tracing::debug!("Persisted team {} to {}", team.id, self.path.display());
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let data = DataFile {
            teams: self.teams.clone(),
        };
        let content = toml::to_string_pretty(&data).map_err(|e| ContestError::ConfigError {
            field: "toml_serializing".to_string(),
            message: e.to_string(),
        })?;
        write_atomic(&self.path, content.as_bytes())
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A provisioned team: one instance, one port, exclusive members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub port: u16,
}

/// Persisted shape of a team, keyed by team id in the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub name: String,
    pub port: u16,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Team {
    pub fn from_record(id: &str, record: &TeamRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.name.clone(),
            members: record.members.clone(),
            port: record.port,
        }
    }

    pub fn to_record(&self) -> TeamRecord {
        TeamRecord {
            name: self.name.clone(),
            port: self.port,
            members: self.members.clone(),
        }
    }
}

/// A create request, as received from HTTP or the command trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub team_id: String,
    pub team_name: String,
    pub members: Vec<String>,
}

impl NewTeam {
    pub fn new(team_id: &str, team_name: &str, members: Vec<String>) -> Self {
        Self {
            team_id: team_id.to_string(),
            team_name: team_name.to_string(),
            members,
        }
    }

    pub fn into_team(self, port: u16) -> Team {
        Team {
            id: self.team_id,
            name: self.team_name,
            members: self.members,
            port,
        }
    }
}

/// Rendered deployment for one start attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDescriptor {
    pub server_name: String,
    pub port: u16,
    pub rendered_config_path: PathBuf,
}

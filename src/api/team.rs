use super::AppState;
use crate::domain::model::NewTeam;
use crate::utils::error::ContestError;
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl TeamResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            port: None,
        }
    }
}

pub fn status_for(error: &ContestError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// POST /team/add
pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> (StatusCode, Json<TeamResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected /team/add body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(TeamResponse::failure("Invalid input data")),
            );
        }
    };

    let team_id = request.team_id.clone();
    match state.orchestrator.create(request).await {
        Ok(team) => (
            StatusCode::OK,
            Json(TeamResponse {
                success: true,
                message: "Team added successfully".to_string(),
                port: Some(team.port),
            }),
        ),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("Failed to add team {}: {}", team_id, e);
            } else {
                tracing::info!("Rejected team {}: {}", team_id, e);
            }
            (status, Json(TeamResponse::failure(e.user_friendly_message())))
        }
    }
}

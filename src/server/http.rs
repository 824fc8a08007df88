// HTTP handlers: read-only room snapshots and the JSON error mapping shared
// by every HTTP-facing handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use castlefall_shared::{ErrorCode, RoomSnapshot};

use crate::error::GameError;
use crate::server::AppState;

/// A `GameError` rendered as `ServerMsg::Error` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code() {
            ErrorCode::RoomNotFound | ErrorCode::UnknownPlayer => StatusCode::NOT_FOUND,
            ErrorCode::NameTaken
            | ErrorCode::InvalidPhase
            | ErrorCode::PhaseClosed
            | ErrorCode::AlreadyJoined => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(self.0.to_server_msg())).into_response()
    }
}

/// Public view of a room; no words are revealed.
pub async fn room_handler(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let room = state.registry.get(&room).await?;
    Ok(Json(room.snapshot(None).await))
}

/// Names of the rooms currently alive.
pub async fn rooms_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.room_names().await)
}

//! Position endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/positions` - Create a position
//! - `GET /api/positions` - List all positions
//! - `GET /api/positions/hierarchy` - Nested forest of all positions
//! - `GET /api/positions/:id` - Position with parent, children and users
//! - `PUT /api/positions/:id` - Partial update (name, description, parent)
//! - `DELETE /api/positions/:id` - Cascading delete
//! - `GET /api/positions/:id/children` - Direct children

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::{AppState, HttpError};
use orgchart_core::models::{
    NewPosition, Position, PositionDetails, PositionTreeNode, PositionUpdate,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3100/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a position
///
/// ```bash
/// curl -X POST http://localhost:3100/api/positions \
///   -H "Content-Type: application/json" \
///   -d '{"name": "CTO", "description": "Chief Technology Officer", "parentId": "..."}'
/// ```
async fn create_position(
    State(state): State<AppState>,
    Json(input): Json<NewPosition>,
) -> Result<(StatusCode, Json<Position>), HttpError> {
    let position = state.positions.create_position(input).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

async fn list_positions(State(state): State<AppState>) -> Result<Json<Vec<Position>>, HttpError> {
    Ok(Json(state.positions.list_positions().await?))
}

async fn get_hierarchy(
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionTreeNode>>, HttpError> {
    Ok(Json(state.positions.get_position_hierarchy().await?))
}

async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PositionDetails>, HttpError> {
    Ok(Json(state.positions.get_position(&id).await?))
}

/// Partially update a position
///
/// `"parentId": null` detaches the position into a root; omitting the field
/// keeps the current parent.
async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<PositionUpdate>,
) -> Result<Json<Position>, HttpError> {
    Ok(Json(state.positions.update_position(&id, update).await?))
}

/// Delete a position, re-parenting its children and removing its users
async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.positions.delete_position(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unknown ids yield an empty list
async fn get_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Position>>, HttpError> {
    Ok(Json(state.positions.get_children(&id).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/positions", get(list_positions).post(create_position))
        .route("/api/positions/hierarchy", get(get_hierarchy))
        .route(
            "/api/positions/:id",
            get(get_position)
                .put(update_position)
                .delete(delete_position),
        )
        .route("/api/positions/:id/children", get(get_children))
        .with_state(state)
}

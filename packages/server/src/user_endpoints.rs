//! User endpoints
//!
//! - `POST /api/users` - Create a user
//! - `GET /api/users?q=&page=&limit=` - Paginated listing filtered by name
//! - `GET /api/users/:id` - Get a user
//! - `PUT /api/users/:id` - Partial update
//! - `DELETE /api/users/:id` - Delete a user (its photo is kept)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::{AppState, HttpError};
use orgchart_core::models::{NewUser, User, UserPage, UserQuery, UserUpdate};

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    let user = state.users.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserPage>, HttpError> {
    Ok(Json(state.users.list_users(query).await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, HttpError> {
    Ok(Json(state.users.get_user(&id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, HttpError> {
    Ok(Json(state.users.update_user(&id, update).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.users.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}

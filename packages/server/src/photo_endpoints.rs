//! Photo metadata endpoints
//!
//! - `POST /api/photos` - Register a photo
//! - `GET /api/photos` - List photos
//! - `GET /api/photos/:id` - Get a photo
//! - `PUT /api/photos/:id` - Partial update
//! - `POST /api/photos/:id/views` - Increment the view counter
//! - `DELETE /api/photos/:id` - Delete a photo

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::{AppState, HttpError};
use orgchart_core::models::{NewPhoto, Photo, PhotoUpdate};

async fn create_photo(
    State(state): State<AppState>,
    Json(input): Json<NewPhoto>,
) -> Result<(StatusCode, Json<Photo>), HttpError> {
    let photo = state.photos.create_photo(input).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn list_photos(State(state): State<AppState>) -> Result<Json<Vec<Photo>>, HttpError> {
    Ok(Json(state.photos.list_photos().await?))
}

async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Photo>, HttpError> {
    Ok(Json(state.photos.get_photo(id).await?))
}

async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<PhotoUpdate>,
) -> Result<Json<Photo>, HttpError> {
    Ok(Json(state.photos.update_photo(id, update).await?))
}

async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Photo>, HttpError> {
    Ok(Json(state.photos.increment_views(id).await?))
}

async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.photos.delete_photo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/photos", get(list_photos).post(create_photo))
        .route(
            "/api/photos/:id",
            get(get_photo).put(update_photo).delete(delete_photo),
        )
        .route("/api/photos/:id/views", post(increment_views))
        .with_state(state)
}

//! Genre handlers: `/genres/` and `/genres/:id`.

use crate::error::AppError;
use crate::model::Genre;
use crate::schema::GENRE;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, AppError> {
    super::list_records(&state, &GENRE).await.map(Json)
}

pub async fn create(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    super::create_row(&state, &GENRE, &body).await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Genre>, AppError> {
    super::read_record(&state, &GENRE, &id).await.map(Json)
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::replace_row(&state, &GENRE, &id, &body).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::merge_row(&state, &GENRE, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    super::delete_row(&state, &GENRE, &id).await
}

//! Director handlers: `/directors/` and `/directors/:id`.

use crate::error::AppError;
use crate::model::Director;
use crate::schema::DIRECTOR;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Director>>, AppError> {
    super::list_records(&state, &DIRECTOR).await.map(Json)
}

pub async fn create(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    super::create_row(&state, &DIRECTOR, &body).await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Director>, AppError> {
    super::read_record(&state, &DIRECTOR, &id).await.map(Json)
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::replace_row(&state, &DIRECTOR, &id, &body).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::merge_row(&state, &DIRECTOR, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    super::delete_row(&state, &DIRECTOR, &id).await
}

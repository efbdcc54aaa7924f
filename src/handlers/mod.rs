//! HTTP handlers, one group per entity, plus the item operations they share.

pub mod directors;
pub mod genres;
pub mod movies;

use crate::error::AppError;
use crate::model::{body_to_row, from_row, Changes};
use crate::schema::Table;
use crate::state::AppState;
use crate::store::ListQuery;
use axum::http::{header, HeaderName, StatusCode};
use serde::de::DeserializeOwned;

/// Path ids that are not integers address no row.
fn parse_id(table: &Table, id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::NotFound(format!("{} '{}'", table.name, id_str)))
}

fn not_found(table: &Table, id: i64) -> AppError {
    AppError::NotFound(format!("{} {}", table.name, id))
}

/// Every row of `table` in id order; an empty table is a 404.
async fn list_records<T: DeserializeOwned>(state: &AppState, table: &Table) -> Result<Vec<T>, AppError> {
    let rows = state.store.fetch_many(table, &ListQuery::default()).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(format!("{} is empty", table.name)));
    }
    rows.into_iter().map(|row| from_row(table, row)).collect()
}

async fn read_record<T: DeserializeOwned>(state: &AppState, table: &Table, id_str: &str) -> Result<T, AppError> {
    let id = parse_id(table, id_str)?;
    let row = state
        .store
        .fetch_one(table, id)
        .await?
        .ok_or_else(|| not_found(table, id))?;
    from_row(table, row)
}

async fn ensure_exists(state: &AppState, table: &Table, id: i64) -> Result<(), AppError> {
    match state.store.fetch_one(table, id).await? {
        Some(_) => Ok(()),
        None => Err(not_found(table, id)),
    }
}

/// POST: 201 with an empty body and the new item's URL in `Location`.
async fn create_row(
    state: &AppState,
    table: &Table,
    body: &[u8],
) -> Result<(StatusCode, [(HeaderName, String); 1]), AppError> {
    let changes = Changes::for_insert(table, body_to_row(body)?)?;
    let id = state.store.insert(table, &changes).await?;
    tracing::info!(table = table.name, id, "created");
    Ok((StatusCode::CREATED, [(header::LOCATION, table.item_path(id))]))
}

/// PUT: the body must name every writable column and nothing else. A mismatched key set answers
/// 204 without writing, which existing clients rely on.
async fn replace_row(state: &AppState, table: &Table, id_str: &str, body: &[u8]) -> Result<StatusCode, AppError> {
    let id = parse_id(table, id_str)?;
    ensure_exists(state, table, id).await?;
    let Some(changes) = Changes::for_replace(table, body_to_row(body)?)? else {
        tracing::debug!(table = table.name, id, "replace skipped: key set mismatch");
        return Ok(StatusCode::NO_CONTENT);
    };
    if !state.store.update(table, id, &changes).await? {
        return Err(not_found(table, id));
    }
    tracing::info!(table = table.name, id, "replaced");
    Ok(StatusCode::OK)
}

/// PATCH: assign the writable columns present in the body, ignore the rest.
async fn merge_row(state: &AppState, table: &Table, id_str: &str, body: &[u8]) -> Result<StatusCode, AppError> {
    let id = parse_id(table, id_str)?;
    ensure_exists(state, table, id).await?;
    let changes = Changes::for_merge(table, body_to_row(body)?)?;
    if changes.is_empty() {
        return Ok(StatusCode::OK);
    }
    if !state.store.update(table, id, &changes).await? {
        return Err(not_found(table, id));
    }
    tracing::info!(table = table.name, id, "updated");
    Ok(StatusCode::OK)
}

async fn delete_row(state: &AppState, table: &Table, id_str: &str) -> Result<StatusCode, AppError> {
    let id = parse_id(table, id_str)?;
    if !state.store.delete(table, id).await? {
        return Err(not_found(table, id));
    }
    tracing::info!(table = table.name, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Movie handlers: `/movies/` (paginated, filterable) and `/movies/:id`.

use crate::error::AppError;
use crate::model::{from_row, Director, Genre, Movie};
use crate::response::{movie_page, MovieListEntry, MovieView, PageMeta, References};
use crate::schema::{DIRECTOR, GENRE, MOVIE};
use crate::state::AppState;
use crate::store::ListQuery;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Raw query parameters of `GET /movies/`. Kept as text so the page record can echo them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub director_id: Option<String>,
    pub genre_id: Option<String>,
}

/// Empty values count as absent.
fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `(limit, offset)` for the requested page. `offset = per_page * page - per_page`; `page` only
/// shifts the window when `per_page` is given. A page below 1, or one starting past the largest
/// offset storage can address, is a 404.
pub fn page_window(page: Option<&str>, per_page: Option<&str>) -> Result<(Option<u32>, Option<u64>), AppError> {
    let page = page
        .map(|p| p.parse::<i64>().map_err(|_| AppError::BadRequest(format!("page must be an integer, got '{}'", p))))
        .transpose()?;
    if let Some(p) = page {
        if p < 1 {
            return Err(AppError::NotFound(format!("page {}", p)));
        }
    }
    let Some(per_page) = per_page else {
        return Ok((None, None));
    };
    let per_page: u32 = per_page
        .parse()
        .map_err(|_| AppError::BadRequest(format!("per_page must be a non-negative integer, got '{}'", per_page)))?;
    let offset = match page {
        Some(p) => Some(
            u64::from(per_page)
                .checked_mul((p - 1) as u64)
                .filter(|offset| i64::try_from(*offset).is_ok())
                .ok_or_else(|| AppError::NotFound(format!("page {} is out of range", p)))?,
        ),
        None => None,
    };
    Ok((Some(per_page), offset))
}

/// Equality filters on reference columns. Reference columns hold 32-bit ids, so a value that is
/// not an integer in that range can match nothing.
fn reference_filters(params: &MovieListParams) -> Result<Vec<(&'static str, i64)>, AppError> {
    let mut filters = Vec::new();
    for (column, raw) in [("director_id", &params.director_id), ("genre_id", &params.genre_id)] {
        if let Some(raw) = present(raw) {
            let id: i32 = raw
                .parse()
                .map_err(|_| AppError::NotFound(format!("no movie has {} '{}'", column, raw)))?;
            filters.push((column, i64::from(id)));
        }
    }
    Ok(filters)
}

fn distinct(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Load the genres and directors referenced by `movies`, one query per table.
async fn load_references(state: &AppState, movies: &[Movie]) -> Result<References, AppError> {
    let genre_ids = distinct(movies.iter().filter_map(|m| m.genre_id));
    let director_ids = distinct(movies.iter().filter_map(|m| m.director_id));
    let mut refs = References::default();
    for row in state.store.fetch_where_in(&GENRE, GENRE.pk, &genre_ids).await? {
        let genre: Genre = from_row(&GENRE, row)?;
        refs.genres.insert(genre.id, genre);
    }
    for row in state.store.fetch_where_in(&DIRECTOR, DIRECTOR.pk, &director_ids).await? {
        let director: Director = from_row(&DIRECTOR, row)?;
        refs.directors.insert(director.id, director);
    }
    Ok(refs)
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<MovieListParams>, QueryRejection>,
) -> Result<Json<Vec<MovieListEntry>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (limit, offset) = page_window(present(&params.page), present(&params.per_page))?;
    let query = ListQuery {
        filters: reference_filters(&params)?,
        limit,
        offset,
    };
    let rows = state.store.fetch_many(&MOVIE, &query).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("no movies match".into()));
    }
    let movies = rows
        .into_iter()
        .map(|row| from_row::<Movie>(&MOVIE, row))
        .collect::<Result<Vec<_>, _>>()?;
    let refs = load_references(&state, &movies).await?;
    let views: Vec<MovieView> = movies.into_iter().map(|m| refs.view(m)).collect();
    let meta = PageMeta {
        page: params.page,
        per_page: params.per_page,
    };
    Ok(Json(movie_page(views, meta)))
}

pub async fn create(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    super::create_row(&state, &MOVIE, &body).await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<MovieView>, AppError> {
    let movie: Movie = super::read_record(&state, &MOVIE, &id).await?;
    let refs = load_references(&state, std::slice::from_ref(&movie)).await?;
    Ok(Json(refs.view(movie)))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::replace_row(&state, &MOVIE, &id, &body).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    super::merge_row(&state, &MOVIE, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    super::delete_row(&state, &MOVIE, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_from_page_and_per_page() {
        assert_eq!(page_window(Some("1"), Some("2")).unwrap(), (Some(2), Some(0)));
        assert_eq!(page_window(Some("3"), Some("10")).unwrap(), (Some(10), Some(20)));
    }

    #[test]
    fn per_page_alone_limits_from_the_start() {
        assert_eq!(page_window(None, Some("5")).unwrap(), (Some(5), None));
    }

    #[test]
    fn page_alone_does_not_window() {
        assert_eq!(page_window(Some("4"), None).unwrap(), (None, None));
    }

    #[test]
    fn page_below_one_is_not_found() {
        assert!(matches!(page_window(Some("0"), Some("2")), Err(AppError::NotFound(_))));
        assert!(matches!(page_window(Some("-3"), None), Err(AppError::NotFound(_))));
    }

    #[test]
    fn unparsable_numbers_are_bad_requests() {
        assert!(matches!(page_window(Some("one"), Some("2")), Err(AppError::BadRequest(_))));
        assert!(matches!(page_window(Some("1"), Some("-2")), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn filters_skip_empty_values() {
        let params = MovieListParams {
            genre_id: Some("3".into()),
            director_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(reference_filters(&params).unwrap(), vec![("genre_id", 3)]);
    }

    #[test]
    fn non_numeric_filter_matches_nothing() {
        let params = MovieListParams {
            director_id: Some("abc".into()),
            ..Default::default()
        };
        assert!(matches!(reference_filters(&params), Err(AppError::NotFound(_))));
    }

    #[test]
    fn filter_beyond_id_range_matches_nothing() {
        let params = MovieListParams {
            genre_id: Some("99999999999".into()),
            ..Default::default()
        };
        assert!(matches!(reference_filters(&params), Err(AppError::NotFound(_))));
        let params = MovieListParams {
            director_id: Some("2147483647".into()),
            ..Default::default()
        };
        assert_eq!(reference_filters(&params).unwrap(), vec![("director_id", 2147483647)]);
    }

    #[test]
    fn offset_past_storage_range_is_not_found() {
        assert!(matches!(
            page_window(Some("4000000000"), Some("4000000000")),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            page_window(Some("9223372036854775807"), Some("4294967295")),
            Err(AppError::NotFound(_))
        ));
        let (_, offset) = page_window(Some("2147483649"), Some("4294967295")).unwrap();
        assert_eq!(offset, Some(4294967295 * 2147483648));
    }

    #[test]
    fn distinct_sorts_and_dedups() {
        assert_eq!(distinct([3, 1, 3, 2].into_iter()), vec![1, 2, 3]);
    }
}

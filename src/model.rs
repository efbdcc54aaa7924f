//! Typed records and the allow-listed change sets built from request bodies.

use crate::error::AppError;
use crate::schema::Table;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A stored row as column name -> JSON value, including the primary key.
pub type Row = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub trailer: Option<String>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub genre_id: Option<i64>,
    pub director_id: Option<i64>,
}

/// Decode a stored row into its typed record.
pub fn from_row<T: DeserializeOwned>(table: &Table, row: Row) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| AppError::Store(format!("malformed {} row: {}", table.name, e)))
}

/// Column assignments for one write, each checked against the table's writable columns and coerced
/// to the column type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changes {
    values: Vec<(&'static str, Value)>,
}

impl Changes {
    /// Create: every key must be a writable column. Missing columns are left NULL.
    pub fn for_insert(table: &Table, body: Row) -> Result<Self, AppError> {
        let mut out = Changes::default();
        for (key, value) in body {
            let column = table
                .column(&key)
                .ok_or_else(|| AppError::BadRequest(format!("{} has no column '{}'", table.name, key)))?;
            out.values.push((column.name, column.ty.coerce(column.name, value)?));
        }
        Ok(out)
    }

    /// Full replace: the key set must equal the writable column set exactly, otherwise `None`.
    pub fn for_replace(table: &Table, body: Row) -> Result<Option<Self>, AppError> {
        let expected: HashSet<&str> = table.writable_names().collect();
        let given: HashSet<&str> = body.keys().map(String::as_str).collect();
        if expected != given {
            return Ok(None);
        }
        Self::for_insert(table, body).map(Some)
    }

    /// Partial merge: keys that are not writable columns are dropped.
    pub fn for_merge(table: &Table, body: Row) -> Result<Self, AppError> {
        let mut out = Changes::default();
        for (key, value) in body {
            let Some(column) = table.column(&key) else {
                tracing::debug!(table = table.name, key = %key, "ignoring unknown column");
                continue;
            };
            out.values.push((column.name, column.ty.coerce(column.name, value)?));
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

/// Require a JSON object body.
pub fn body_to_row(body: &[u8]) -> Result<Row, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DIRECTOR, MOVIE};
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn full_movie() -> Row {
        row(json!({
            "title": "Heat",
            "description": "Crime saga",
            "trailer": "https://example.com/heat",
            "year": 1995,
            "rating": 8.3,
            "genre_id": 1,
            "director_id": 2
        }))
    }

    #[test]
    fn insert_rejects_unknown_columns() {
        let err = Changes::for_insert(&DIRECTOR, row(json!({"name": "Mann", "age": 80}))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn insert_rejects_id() {
        assert!(Changes::for_insert(&DIRECTOR, row(json!({"id": 3, "name": "Mann"}))).is_err());
    }

    #[test]
    fn replace_requires_exact_key_set() {
        let mut body = full_movie();
        assert!(Changes::for_replace(&MOVIE, body.clone()).unwrap().is_some());

        body.remove("trailer");
        assert!(Changes::for_replace(&MOVIE, body.clone()).unwrap().is_none());

        body.insert("trailer".into(), Value::Null);
        body.insert("extra".into(), json!(1));
        assert!(Changes::for_replace(&MOVIE, body).unwrap().is_none());
    }

    #[test]
    fn merge_ignores_unknown_keys() {
        let changes = Changes::for_merge(&MOVIE, row(json!({"colour": "red"}))).unwrap();
        assert!(changes.is_empty());

        let changes = Changes::for_merge(&MOVIE, row(json!({"colour": "red", "year": 2001}))).unwrap();
        let pairs: Vec<_> = changes.iter().collect();
        assert_eq!(pairs, vec![("year", &json!(2001))]);
    }

    #[test]
    fn merge_still_checks_types() {
        assert!(Changes::for_merge(&MOVIE, row(json!({"rating": "great"}))).is_err());
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(body_to_row(b"[1, 2]").is_err());
        assert!(body_to_row(b"not json").is_err());
        assert_eq!(body_to_row(br#"{"name": "Drama"}"#).unwrap().len(), 1);
    }

    #[test]
    fn rows_decode_into_records() {
        let movie: Movie = from_row(
            &MOVIE,
            row(json!({
                "id": 7, "title": null, "description": null, "trailer": null,
                "year": 2000, "rating": 7.0, "genre_id": null, "director_id": 1
            })),
        )
        .unwrap();
        assert_eq!(movie.id, 7);
        assert_eq!(movie.director_id, Some(1));
        assert_eq!(movie.genre_id, None);
    }
}

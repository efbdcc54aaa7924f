//! Static table descriptors for the three persisted entities.

use crate::error::AppError;
use serde_json::{Number, Value};

/// Column type, used for value coercion, SQL casts and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    /// Integer id of a row in the named table.
    Reference(&'static str),
}

impl ColumnType {
    /// PostgreSQL type name for DDL and parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer | ColumnType::Reference(_) => "integer",
            ColumnType::Float => "double precision",
        }
    }

    /// Coerce a JSON value from a request body into this column's shape. `null` is always accepted.
    pub fn coerce(&self, column: &str, value: Value) -> Result<Value, AppError> {
        let mismatch = |expected: &str| AppError::BadRequest(format!("{} must be {}", column, expected));
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ColumnType::Text, Value::String(s)) => Ok(Value::String(s)),
            (ColumnType::Text, _) => Err(mismatch("a string")),
            (ColumnType::Integer | ColumnType::Reference(_), Value::Number(n)) => {
                let n = n.as_i64().ok_or_else(|| mismatch("an integer"))?;
                i32::try_from(n).map_err(|_| mismatch("a 32-bit integer"))?;
                Ok(Value::Number(n.into()))
            }
            (ColumnType::Integer | ColumnType::Reference(_), _) => Err(mismatch("an integer")),
            (ColumnType::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch("a finite number")),
            (ColumnType::Float, _) => Err(mismatch("a number")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// One table: its name, URL segment and writable (non-key) columns.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub path_segment: &'static str,
    pub pk: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// URL of one item, used for the `Location` header on create.
    pub fn item_path(&self, id: i64) -> String {
        format!("/{}/{}", self.path_segment, id)
    }
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty }
}

pub static DIRECTOR: Table = Table {
    name: "director",
    path_segment: "directors",
    pk: "id",
    columns: &[col("name", ColumnType::Text)],
};

pub static GENRE: Table = Table {
    name: "genre",
    path_segment: "genres",
    pk: "id",
    columns: &[col("name", ColumnType::Text)],
};

pub static MOVIE: Table = Table {
    name: "movie",
    path_segment: "movies",
    pk: "id",
    columns: &[
        col("title", ColumnType::Text),
        col("description", ColumnType::Text),
        col("trailer", ColumnType::Text),
        col("year", ColumnType::Integer),
        col("rating", ColumnType::Float),
        col("genre_id", ColumnType::Reference("genre")),
        col("director_id", ColumnType::Reference("director")),
    ],
};

/// Tables in dependency order (referenced tables first).
pub static TABLES: [&Table; 3] = [&DIRECTOR, &GENRE, &MOVIE];

//! Movies catalogue: REST CRUD over movies, directors and genres backed by PostgreSQL.

pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod schema;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError};
pub use routes::{app, common_routes, entity_routes};
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, InMemoryStore, PgStore, Store};

//! Application state shared across axum route handlers.

use sea_orm::DatabaseConnection;

/// Central application state passed to handlers via axum's `State<T>`
/// extractor. Holds the shared SeaORM connection pool.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Shared reference to the database connection.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Cloned connection for spawned tasks that need ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}

use rusqlite::Connection;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db;
use crate::entities::todo::ParseTodoStatusError;
use crate::guard::GuardError;
use crate::search::ParseSortError;
use crate::services::{Files, Groups, Spaces, Todos, Users, Whiteboards};

/// Open store plus accessors for each resource service. Services borrow the
/// connection, so they live no longer than the `App` that handed them out.
pub struct App {
    conn: Connection,
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        tracing::debug!(db_path, "store opened");
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.conn)
    }

    pub fn spaces(&self) -> Spaces<'_> {
        Spaces::new(&self.conn)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(&self.conn)
    }

    pub fn todos(&self) -> Todos<'_> {
        Todos::new(&self.conn)
    }

    pub fn whiteboards(&self) -> Whiteboards<'_> {
        Whiteboards::new(&self.conn)
    }

    pub fn files(&self) -> Files<'_> {
        Files::new(&self.conn)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    ParseStatus(#[from] ParseTodoStatusError),
    #[error(transparent)]
    ParseSort(#[from] ParseSortError),
    #[error("{0}")]
    InvalidArgument(String),
}

impl AppError {
    /// Transport status for this error. Guard failures keep their own code;
    /// bad input is `BAD_REQUEST`; everything else is `INTERNAL`.
    pub fn status_code(&self) -> &'static str {
        match self {
            AppError::Guard(err) => err.status_code(),
            AppError::Json(_)
            | AppError::Config(_)
            | AppError::ParseStatus(_)
            | AppError::ParseSort(_)
            | AppError::InvalidArgument(_) => "BAD_REQUEST",
            AppError::Io(_) | AppError::Db(_) => "INTERNAL",
        }
    }

    #[cfg(test)]
    pub fn guard(&self) -> Option<&GuardError> {
        match self {
            AppError::Guard(err) => Some(err),
            _ => None,
        }
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{App, AppError};
    use crate::entities::EntityKind;
    use crate::guard::GuardError;
    use uuid::Uuid;

    #[test]
    fn status_codes_follow_guard_then_input_then_internal() {
        let guard = AppError::from(GuardError::InvalidReference {
            kind: EntityKind::Group,
            id: "999999".to_string(),
        });
        assert_eq!(guard.status_code(), "BAD_REQUEST");
        assert!(guard.guard().is_some());

        let input = AppError::InvalidArgument("nothing to update".to_string());
        assert_eq!(input.status_code(), "BAD_REQUEST");
        assert!(input.guard().is_none());

        let db = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(db.status_code(), "INTERNAL");
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let root = std::env::temp_dir().join(format!("taskden-app-{}", Uuid::now_v7()));
        let db_path = root.join("nested").join("state.sqlite");
        let app = App::open(&db_path.display().to_string()).expect("app should open");
        let version: String = app
            .connection()
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .expect("schema version should be recorded");
        assert_eq!(version, crate::db::CURRENT_SCHEMA_VERSION.to_string());
        drop(app);
        let _ = std::fs::remove_dir_all(root);
    }
}

//! Database Connection Management
//!
//! Connection handling and schema initialization for the libsql (embedded
//! SQLite) database backing the position, user and photo tables.
//!
//! # Connection pattern
//!
//! Always obtain connections with [`DatabaseService::connect_with_timeout`]
//! in async code. It sets the busy timeout and turns on foreign key
//! enforcement, both of which are per-connection settings in SQLite.
//!
//! # Referential integrity
//!
//! Deletion policy lives in application code, not in schema cascade rules:
//!
//! - `positions.parent_id` has no `ON DELETE` action and is checked at commit
//!   (`DEFERRABLE INITIALLY DEFERRED`). The cascade re-parents children inside
//!   its transaction; a commit that would still leave a dangling parent fails.
//! - `users.position_id` and `users.photo_id` are `ON DELETE SET NULL`, so a
//!   direct row delete outside the cascade never leaves a dangling reference.

use crate::db::error::DatabaseError;
use libsql::{Builder, Connection, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Milliseconds a connection waits on a locked database before failing
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use orgchart_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/orgchart.db")).await?;
///     let conn = db.connect_with_timeout().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (shared)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path`
    ///
    /// This will:
    /// 1. Create the parent directory if needed
    /// 2. Open the database file
    /// 3. Enable WAL mode
    /// 4. Create tables and indexes (idempotent)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the file
    /// cannot be opened, or the schema cannot be applied.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;
        tracing::debug!("Database ready at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so they go through `query()`.
    async fn execute_pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        conn.query(pragma, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS positions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                parent_id TEXT,
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES positions(id) DEFERRABLE INITIALLY DEFERRED
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create positions table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                filename TEXT NOT NULL,
                views INTEGER NOT NULL DEFAULT 0,
                is_published INTEGER NOT NULL DEFAULT 0
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create photos table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL UNIQUE,
                birth_date TEXT NOT NULL,
                hire_date TEXT NOT NULL,
                gender TEXT NOT NULL CHECK (gender IN ('M', 'F')),
                position_id TEXT,
                photo_id INTEGER UNIQUE,
                FOREIGN KEY (position_id) REFERENCES positions(id) ON DELETE SET NULL,
                FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE SET NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create users table: {}", e))
        })?;

        self.create_indexes(&conn).await?;

        Ok(())
    }

    async fn create_indexes(&self, conn: &Connection) -> Result<(), DatabaseError> {
        let indexes = [
            // Children lookup and hierarchy index
            "CREATE INDEX IF NOT EXISTS idx_positions_parent ON positions(parent_id)",
            // Cascade lookup of users assigned to a position
            "CREATE INDEX IF NOT EXISTS idx_users_position ON users(position_id)",
            // Listing order
            "CREATE INDEX IF NOT EXISTS idx_users_full_name ON users(full_name)",
            "CREATE INDEX IF NOT EXISTS idx_photos_filename ON photos(filename)",
        ];

        for sql in indexes {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create index ({}): {}",
                    sql, e
                ))
            })?;
        }

        Ok(())
    }

    /// Get a raw connection
    ///
    /// Does not configure the busy timeout or foreign keys. Prefer
    /// [`connect_with_timeout`](Self::connect_with_timeout).
    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection configured for concurrent async use
    ///
    /// Sets a 5-second busy timeout so concurrent writers wait instead of
    /// failing with `SQLITE_BUSY`, and enables foreign key enforcement.
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Start a write transaction on `conn`
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front so the reads inside
    /// the transaction see the state the writes will apply to.
    pub async fn begin_immediate(&self, conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit the open transaction, rolling back if the commit fails
    ///
    /// Deferred foreign key violations surface here.
    pub async fn commit(&self, conn: &Connection) -> Result<(), DatabaseError> {
        if let Err(e) = conn.execute("COMMIT", ()).await {
            self.rollback(conn).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }

    /// Roll back the open transaction
    ///
    /// Failures are logged only; the caller is already reporting an error.
    pub async fn rollback(&self, conn: &Connection) {
        if let Err(e) = conn.execute("ROLLBACK", ()).await {
            tracing::warn!("Rollback failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn table_names(db: &DatabaseService) -> Vec<String> {
        let conn = db.connect().unwrap();
        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                (),
            )
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }
        names
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let names = table_names(&db).await;
        for expected in ["photos", "positions", "users"] {
            assert!(
                names.contains(&expected.to_string()),
                "missing table {}",
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_indexes_created() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect().unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'",
                (),
            )
            .await
            .unwrap();
        let mut index_names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            index_names.push(row.get::<String>(0).unwrap());
        }

        assert!(index_names.contains(&"idx_positions_parent".to_string()));
        assert!(index_names.contains(&"idx_users_position".to_string()));
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_per_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn.query("PRAGMA foreign_keys", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dangling_parent_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();

        let result = conn
            .execute(
                "INSERT INTO positions (id, name, description, parent_id, created_at, modified_at)
                 VALUES ('child', 'Child', 'c', 'missing', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
                (),
            )
            .await;

        assert!(result.is_err(), "dangling parent_id must be rejected");
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();

        db.begin_immediate(&conn).await.unwrap();
        conn.execute(
            "INSERT INTO photos (name, description, filename) VALUES ('a', 'b', 'c.jpg')",
            (),
        )
        .await
        .unwrap();
        db.rollback(&conn).await;

        let mut rows = conn.query("SELECT COUNT(*) FROM photos", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = DatabaseService::new(db_path.clone()).await.unwrap();
        drop(first);
        let second = DatabaseService::new(db_path).await.unwrap();

        assert!(table_names(&second).await.len() >= 3);
    }
}

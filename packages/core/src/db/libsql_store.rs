//! LibsqlStore - store trait implementation for the libsql backend
//!
//! Owns all SQL for positions, users and photos and converts `libsql::Row`
//! values into models. No business rules live here: parent validation, cycle
//! checks and deletion planning belong to the services.
//!
//! Every call opens its own connection through
//! [`DatabaseService::connect_with_timeout`]; rows are fully materialized
//! before the connection is dropped.

use crate::db::store::{
    CascadeResult, CascadeStore, DeletionOutcome, DeletionPlan, PhotoStore, PositionStore,
    UserStore,
};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{
    Gender, NewPhoto, NewPosition, NewUser, Photo, Position, User, UserQuery,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Connection, Row};
use std::sync::Arc;

const POSITION_COLUMNS: &str = "id, name, description, parent_id, created_at, modified_at";

const USER_COLUMNS: &str =
    "id, full_name, email, phone, birth_date, hire_date, gender, position_id, photo_id";

const PHOTO_COLUMNS: &str = "id, name, description, filename, views, is_published";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// libsql implementation of every store trait
pub struct LibsqlStore {
    db: Arc<DatabaseService>,
}

impl LibsqlStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Underlying database service
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Current time in the stored format
    ///
    /// Fixed microsecond precision keeps the text lexicographically sortable.
    fn now_timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this store use RFC3339: "YYYY-MM-DDTHH:MM:SS.ffffffZ"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("Unable to parse date '{}'", s))
    }

    /// Convert libsql::Row to Position
    ///
    /// Expected columns: see [`POSITION_COLUMNS`]
    fn row_to_position(row: &Row) -> Result<Position> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let description: String = row.get(2).context("Failed to get description")?;
        let parent_id: Option<String> = row.get(3).context("Failed to get parent_id")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(5).context("Failed to get modified_at")?;

        Ok(Position {
            id,
            name,
            description,
            parent_id,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
            modified_at: Self::parse_timestamp(&modified_at_str)
                .context("Failed to parse modified_at")?,
        })
    }

    /// Convert libsql::Row to User
    ///
    /// Expected columns: see [`USER_COLUMNS`]
    fn row_to_user(row: &Row) -> Result<User> {
        let id: String = row.get(0).context("Failed to get id")?;
        let full_name: String = row.get(1).context("Failed to get full_name")?;
        let email: String = row.get(2).context("Failed to get email")?;
        let phone: String = row.get(3).context("Failed to get phone")?;
        let birth_date: String = row.get(4).context("Failed to get birth_date")?;
        let hire_date: String = row.get(5).context("Failed to get hire_date")?;
        let gender: String = row.get(6).context("Failed to get gender")?;
        let position_id: Option<String> = row.get(7).context("Failed to get position_id")?;
        let photo_id: Option<i64> = row.get(8).context("Failed to get photo_id")?;

        Ok(User {
            id,
            full_name,
            email,
            phone,
            birth_date: Self::parse_date(&birth_date)?,
            hire_date: Self::parse_date(&hire_date)?,
            gender: gender.parse::<Gender>().map_err(|e| anyhow::anyhow!(e))?,
            position_id,
            photo_id,
        })
    }

    /// Convert libsql::Row to Photo
    ///
    /// Expected columns: see [`PHOTO_COLUMNS`]
    fn row_to_photo(row: &Row) -> Result<Photo> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let description: String = row.get(2).context("Failed to get description")?;
        let filename: String = row.get(3).context("Failed to get filename")?;
        let views: i64 = row.get(4).context("Failed to get views")?;
        let is_published: i64 = row.get(5).context("Failed to get is_published")?;

        Ok(Photo {
            id,
            name,
            description,
            filename,
            views,
            is_published: is_published != 0,
        })
    }

    async fn query_positions(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Position>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .context("Failed to query positions")?;

        let mut positions = Vec::new();
        while let Some(row) = rows.next().await? {
            positions.push(Self::row_to_position(&row)?);
        }
        Ok(positions)
    }

    async fn query_users(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<User>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .context("Failed to query users")?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(Self::row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn query_photos(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Photo>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .context("Failed to query photos")?;

        let mut photos = Vec::new();
        while let Some(row) = rows.next().await? {
            photos.push(Self::row_to_photo(&row)?);
        }
        Ok(photos)
    }

    /// Map a failed user write to `UniqueViolation` when SQLite reports one
    fn user_write_error(err: libsql::Error, action: &str) -> anyhow::Error {
        match DatabaseError::from_unique_violation(&err) {
            Some(unique) => anyhow::Error::new(unique),
            None => anyhow::Error::new(err).context(format!("Failed to {} user", action)),
        }
    }

    /// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
    fn like_pattern(q: &str) -> String {
        let mut pattern = String::with_capacity(q.len() + 2);
        pattern.push('%');
        for c in q.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    /// Cascade steps; runs inside the caller's transaction
    ///
    /// Returns `None` without writing if the target no longer exists.
    async fn run_cascade(
        conn: &Connection,
        plan: &DeletionPlan,
    ) -> Result<Option<DeletionOutcome>> {
        let mut rows = conn
            .query("SELECT 1 FROM positions WHERE id = ?", [plan.target_id.as_str()])
            .await
            .context("Failed to check cascade target")?;
        if rows.next().await?.is_none() {
            return Ok(None);
        }
        drop(rows);

        // Children added after planning move as well; the deferred foreign
        // key would otherwise fail the commit.
        let reparented_children = conn
            .execute(
                "UPDATE positions SET parent_id = ?, modified_at = ? WHERE parent_id = ?",
                (
                    plan.new_parent_id.as_deref(),
                    Self::now_timestamp(),
                    plan.target_id.as_str(),
                ),
            )
            .await
            .context("Failed to re-parent children")?;

        // Selected by current assignment; the plan's id lists may be stale.
        let deleted_photos = conn
            .execute(
                "DELETE FROM photos WHERE id IN \
                 (SELECT photo_id FROM users WHERE position_id = ? AND photo_id IS NOT NULL)",
                [plan.target_id.as_str()],
            )
            .await
            .context("Failed to delete photos of assigned users")?;

        let deleted_users = conn
            .execute(
                "DELETE FROM users WHERE position_id = ?",
                [plan.target_id.as_str()],
            )
            .await
            .context("Failed to delete assigned users")?;

        conn.execute("DELETE FROM positions WHERE id = ?", [plan.target_id.as_str()])
            .await
            .context("Failed to delete position")?;

        Ok(Some(DeletionOutcome {
            reparented_children,
            deleted_users,
            deleted_photos,
        }))
    }
}

#[async_trait]
impl PositionStore for LibsqlStore {
    async fn find_position(&self, id: &str) -> Result<Option<Position>> {
        let sql = format!("SELECT {} FROM positions WHERE id = ?", POSITION_COLUMNS);
        Ok(self.query_positions(&sql, [id]).await?.into_iter().next())
    }

    async fn find_all_positions(&self) -> Result<Vec<Position>> {
        let sql = format!(
            "SELECT {} FROM positions ORDER BY created_at ASC, rowid ASC",
            POSITION_COLUMNS
        );
        self.query_positions(&sql, ()).await
    }

    async fn find_positions_by_parent(&self, parent_id: &str) -> Result<Vec<Position>> {
        let sql = format!(
            "SELECT {} FROM positions WHERE parent_id = ? ORDER BY created_at ASC, rowid ASC",
            POSITION_COLUMNS
        );
        self.query_positions(&sql, [parent_id]).await
    }

    async fn insert_position(&self, position: NewPosition) -> Result<Position> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Self::now_timestamp();

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO positions (id, name, description, parent_id, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.as_str(),
                position.name.as_str(),
                position.description.as_str(),
                position.parent_id.as_deref(),
                now.as_str(),
                now.as_str(),
            ),
        )
        .await
        .context("Failed to insert position")?;

        self.find_position(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Position not found after creation"))
    }

    async fn update_position(&self, position: Position) -> Result<Position> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE positions SET name = ?, description = ?, parent_id = ?, modified_at = ?
                 WHERE id = ?",
                (
                    position.name.as_str(),
                    position.description.as_str(),
                    position.parent_id.as_deref(),
                    Self::now_timestamp(),
                    position.id.as_str(),
                ),
            )
            .await
            .context("Failed to update position")?;

        if changed == 0 {
            return Err(anyhow::anyhow!("Position {} not found for update", position.id));
        }

        self.find_position(&position.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Position not found after update"))
    }

    async fn delete_position(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM positions WHERE id = ?", [id])
            .await
            .context("Failed to delete position")?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl UserStore for LibsqlStore {
    async fn find_users_by_position(&self, position_id: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE position_id = ? ORDER BY full_name ASC, id ASC",
            USER_COLUMNS
        );
        self.query_users(&sql, [position_id]).await
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .context("Failed to delete user")?;
        Ok(deleted > 0)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let id = uuid::Uuid::new_v4().to_string();

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO users (id, full_name, email, phone, birth_date, hire_date, gender, position_id, photo_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.as_str(),
                user.full_name.as_str(),
                user.email.as_str(),
                user.phone.as_str(),
                user.birth_date.format(DATE_FORMAT).to_string(),
                user.hire_date.format(DATE_FORMAT).to_string(),
                user.gender.as_str(),
                user.position_id.as_deref(),
                user.photo_id,
            ),
        )
        .await
        .map_err(|e| Self::user_write_error(e, "insert"))?;

        self.find_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after creation"))
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        Ok(self.query_users(&sql, [id]).await?.into_iter().next())
    }

    async fn update_user(&self, user: User) -> Result<User> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE users SET full_name = ?, email = ?, phone = ?, birth_date = ?, hire_date = ?,
                        gender = ?, position_id = ?, photo_id = ?
                 WHERE id = ?",
                (
                    user.full_name.as_str(),
                    user.email.as_str(),
                    user.phone.as_str(),
                    user.birth_date.format(DATE_FORMAT).to_string(),
                    user.hire_date.format(DATE_FORMAT).to_string(),
                    user.gender.as_str(),
                    user.position_id.as_deref(),
                    user.photo_id,
                    user.id.as_str(),
                ),
            )
            .await
            .map_err(|e| Self::user_write_error(e, "update"))?;

        if changed == 0 {
            return Err(anyhow::anyhow!("User {} not found for update", user.id));
        }

        self.find_user(&user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn list_users(&self, query: &UserQuery) -> Result<(Vec<User>, u64)> {
        let pattern = Self::like_pattern(query.q.trim());

        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM users WHERE full_name LIKE ? ESCAPE '\\'",
                [pattern.as_str()],
            )
            .await
            .context("Failed to count users")?;
        let total: i64 = match rows.next().await? {
            Some(row) => row.get(0).context("Failed to get user count")?,
            None => 0,
        };
        drop(rows);
        drop(conn);

        let sql = format!(
            "SELECT {} FROM users WHERE full_name LIKE ? ESCAPE '\\'
             ORDER BY full_name ASC, id ASC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        let offset = i64::try_from(query.offset()).context("Page offset out of range")?;
        let users = self
            .query_users(
                &sql,
                (pattern.as_str(), i64::from(query.limit), offset),
            )
            .await?;

        Ok((users, u64::try_from(total).unwrap_or(0)))
    }
}

#[async_trait]
impl PhotoStore for LibsqlStore {
    async fn delete_photo(&self, id: i64) -> Result<bool> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM photos WHERE id = ?", [id])
            .await
            .context("Failed to delete photo")?;
        Ok(deleted > 0)
    }

    async fn insert_photo(&self, photo: NewPhoto) -> Result<Photo> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO photos (name, description, filename, views, is_published)
             VALUES (?, ?, ?, 0, ?)",
            (
                photo.name.as_str(),
                photo.description.as_str(),
                photo.filename.as_str(),
                i64::from(photo.is_published),
            ),
        )
        .await
        .context("Failed to insert photo")?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.find_photo(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Photo not found after creation"))
    }

    async fn find_photo(&self, id: i64) -> Result<Option<Photo>> {
        let sql = format!("SELECT {} FROM photos WHERE id = ?", PHOTO_COLUMNS);
        Ok(self.query_photos(&sql, [id]).await?.into_iter().next())
    }

    async fn find_photo_by_filename(&self, filename: &str) -> Result<Option<Photo>> {
        let sql = format!(
            "SELECT {} FROM photos WHERE filename = ? ORDER BY id ASC LIMIT 1",
            PHOTO_COLUMNS
        );
        Ok(self.query_photos(&sql, [filename]).await?.into_iter().next())
    }

    async fn list_photos(&self) -> Result<Vec<Photo>> {
        let sql = format!("SELECT {} FROM photos ORDER BY id ASC", PHOTO_COLUMNS);
        self.query_photos(&sql, ()).await
    }

    async fn update_photo(&self, photo: Photo) -> Result<Photo> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE photos SET name = ?, description = ?, filename = ?, is_published = ?
                 WHERE id = ?",
                (
                    photo.name.as_str(),
                    photo.description.as_str(),
                    photo.filename.as_str(),
                    i64::from(photo.is_published),
                    photo.id,
                ),
            )
            .await
            .context("Failed to update photo")?;

        if changed == 0 {
            return Err(anyhow::anyhow!("Photo {} not found for update", photo.id));
        }

        self.find_photo(photo.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Photo not found after update"))
    }

    async fn increment_photo_views(&self, id: i64) -> Result<Option<Photo>> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute("UPDATE photos SET views = views + 1 WHERE id = ?", [id])
            .await
            .context("Failed to increment photo views")?;
        drop(conn);

        if changed == 0 {
            return Ok(None);
        }
        self.find_photo(id).await
    }
}

#[async_trait]
impl CascadeStore for LibsqlStore {
    async fn apply_deletion(&self, plan: &DeletionPlan) -> Result<CascadeResult> {
        let conn = self.db.connect_with_timeout().await?;
        self.db.begin_immediate(&conn).await?;

        match Self::run_cascade(&conn, plan).await {
            Ok(Some(outcome)) => {
                self.db.commit(&conn).await?;
                Ok(CascadeResult::Applied(outcome))
            }
            Ok(None) => {
                self.db.rollback(&conn).await;
                Ok(CascadeResult::TargetMissing)
            }
            Err(e) => {
                self.db.rollback(&conn).await;
                Err(e.context(format!("Cascade for position {} rolled back", plan.target_id)))
            }
        }
    }
}

//! SQLite-backed progress store.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use super::{
    ProgressStore, ProgressUpdate, StoreError, UserId, UserProgress, decode_completed,
    encode_completed,
};

/// Progress store persisted in a `user_progress` table.
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

/// A progress row as stored, before decoding.
///
/// Used by the reporting tool, which must print rows even when a column
/// cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    pub user_id: UserId,
    pub current_module: Option<i64>,
    pub current_submodule: Option<i64>,
    pub current_page: Option<i64>,
    pub completed_modules: Option<String>,
    pub last_active: Option<String>,
}

impl ProgressRow {
    /// Completed modules as a readable list, or the raw value if it does not decode.
    #[must_use]
    pub fn completed_display(&self) -> String {
        match decode_completed(self.completed_modules.as_deref()) {
            Ok(set) => {
                let ids: Vec<String> = set.iter().map(ToString::to_string).collect();
                format!("[{}]", ids.join(", "))
            }
            Err(_) => self.completed_modules.clone().unwrap_or_default(),
        }
    }
}

impl SqliteProgressStore {
    /// Connects to `SQLite` using the given URL, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the URL is invalid or the
    /// database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        debug!("Connected to progress database");
        Ok(Self { pool })
    }

    /// Connects and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if connection or migration fails.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        let applied = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(1_i64)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if applied {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_progress (
                user_id INTEGER PRIMARY KEY,
                current_module INTEGER DEFAULT 1,
                current_submodule INTEGER DEFAULT 1,
                current_page INTEGER DEFAULT 1,
                completed_modules TEXT DEFAULT '[]',
                last_active TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_last_active
                ON user_progress (last_active);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Progress database schema created");
        Ok(())
    }

    /// Writes a consistent copy of the database to `path`.
    ///
    /// The target file must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the copy fails or writes no
    /// file, as happens for in-memory databases.
    pub async fn backup_to(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let target = path.to_string_lossy().into_owned();
        sqlx::query("VACUUM INTO ?1")
            .bind(&target)
            .execute(&self.pool)
            .await?;

        // In-memory sources report success without writing anything
        if !path.exists() {
            return Err(StoreError::Unavailable(format!(
                "backup to {target} wrote no file"
            )));
        }
        info!("Progress database backed up to {}", target);
        Ok(())
    }

    /// Returns every row without decoding, ordered by user id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the query fails.
    pub async fn dump(&self) -> Result<Vec<ProgressRow>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT
                user_id,
                current_module,
                current_submodule,
                current_page,
                completed_modules,
                CAST(last_active AS TEXT) AS last_active
            FROM user_progress
            ORDER BY user_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProgressRow {
                    user_id: row.try_get("user_id")?,
                    current_module: row.try_get("current_module")?,
                    current_submodule: row.try_get("current_submodule")?,
                    current_page: row.try_get("current_page")?,
                    completed_modules: row.try_get("completed_modules")?,
                    last_active: row.try_get("last_active")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn ensure_row<'c, E>(executor: E, user: UserId, now: DateTime<Utc>) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, last_active)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(())
    }
}

/// Reads a position column, treating NULL as the default of 1.
fn position_column(row: &SqliteRow, column: &str) -> Result<u32, StoreError> {
    let value: Option<i64> = row.try_get(column)?;
    let value = value.unwrap_or(1);
    u32::try_from(value)
        .map_err(|_| StoreError::Unavailable(format!("{column} out of range: {value}")))
}

fn row_to_progress(row: &SqliteRow) -> Result<UserProgress, StoreError> {
    let completed: Option<String> = row.try_get("completed_modules")?;
    let last_active: Option<DateTime<Utc>> = row.try_get("last_active")?;

    Ok(UserProgress {
        current_module: position_column(row, "current_module")?,
        current_submodule: position_column(row, "current_submodule")?,
        current_page: position_column(row, "current_page")?,
        completed_modules: decode_completed(completed.as_deref())?,
        last_active,
    })
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn get_progress(&self, user: UserId) -> Result<UserProgress, StoreError> {
        Self::ensure_row(&self.pool, user, Utc::now()).await?;

        let row = sqlx::query(
            r"
            SELECT current_module, current_submodule, current_page, completed_modules, last_active
            FROM user_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        row_to_progress(&row)
    }

    async fn update_progress(&self, user: UserId, update: ProgressUpdate) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Taking the write lock first keeps the completed-set read below consistent
        Self::ensure_row(&mut *tx, user, now).await?;

        let completed = match (update.mark_completed, update.module) {
            (true, Some(module)) => {
                let raw: Option<String> =
                    sqlx::query_scalar("SELECT completed_modules FROM user_progress WHERE user_id = ?1")
                        .bind(user)
                        .fetch_one(&mut *tx)
                        .await?;
                let mut set = decode_completed(raw.as_deref())?;
                set.insert(module).then(|| encode_completed(&set))
            }
            (true, None) => {
                warn!("mark_completed without a module for user {}, ignoring", user);
                None
            }
            (false, _) => None,
        };

        sqlx::query(
            r"
            UPDATE user_progress
            SET current_module = COALESCE(?2, current_module),
                current_submodule = COALESCE(?3, current_submodule),
                current_page = COALESCE(?4, current_page),
                completed_modules = COALESCE(?5, completed_modules),
                last_active = ?6
            WHERE user_id = ?1
            ",
        )
        .bind(user)
        .bind(update.module)
        .bind(update.submodule)
        .bind(update.page)
        .bind(completed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reset_progress(&self, user: UserId) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO user_progress
                (user_id, current_module, current_submodule, current_page, completed_modules, last_active)
            VALUES (?1, 1, 1, 1, '[]', ?2)
            ON CONFLICT(user_id) DO UPDATE SET
                current_module = 1,
                current_submodule = 1,
                current_page = 1,
                completed_modules = '[]',
                last_active = excluded.last_active
            ",
        )
        .bind(user)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_users(&self, within_days: u32) -> Result<Vec<UserId>, StoreError> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(within_days));
        let users = sqlx::query_scalar(
            r"
            SELECT user_id FROM user_progress
            WHERE julianday(last_active) >= julianday(?1)
            ORDER BY user_id
            ",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn all_progress(&self) -> Result<Vec<(UserId, UserProgress)>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, current_module, current_submodule, current_page, completed_modules, last_active
            FROM user_progress
            ORDER BY user_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("user_id")?, row_to_progress(row)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteProgressStore>();
    }

    #[test]
    fn test_completed_display_tolerates_garbage() {
        let mut row = ProgressRow {
            user_id: 1,
            current_module: Some(1),
            current_submodule: Some(1),
            current_page: Some(1),
            completed_modules: Some("[3,1]".to_owned()),
            last_active: None,
        };
        assert_eq!(row.completed_display(), "[1, 3]");

        row.completed_modules = Some("oops".to_owned());
        assert_eq!(row.completed_display(), "oops");

        row.completed_modules = None;
        assert_eq!(row.completed_display(), "[]");
    }
}

//! Per-user progress through the curriculum.
//!
//! A progress record is created lazily on first access with the default
//! position (module 1, submodule 1, page 1) and an empty completed set. It
//! is updated in place on every page view and quiz pass, and only ever
//! returned to the defaults by an explicit reset.

mod memory;
mod sqlite;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::{ModuleId, SubmoduleId};

pub use memory::InMemoryProgressStore;
pub use sqlite::{ProgressRow, SqliteProgressStore};

/// Telegram user identifier.
pub type UserId = i64;

/// Errors surfaced by progress stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// A user's position in the curriculum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    pub current_module: ModuleId,
    pub current_submodule: SubmoduleId,
    pub current_page: u32,

    /// Modules whose quiz the user has passed at least once.
    pub completed_modules: BTreeSet<ModuleId>,

    /// Last write to the record. `None` if the backend does not track it.
    pub last_active: Option<DateTime<Utc>>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            current_module: 1,
            current_submodule: 1,
            current_page: 1,
            completed_modules: BTreeSet::new(),
            last_active: None,
        }
    }
}

impl UserProgress {
    /// Checks whether a module has been completed.
    #[must_use]
    pub fn has_completed(&self, module: ModuleId) -> bool {
        self.completed_modules.contains(&module)
    }

    /// The current `(module, submodule, page)` triple.
    #[must_use]
    pub const fn position(&self) -> (ModuleId, SubmoduleId, u32) {
        (self.current_module, self.current_submodule, self.current_page)
    }

    /// Applies an update in memory, the same way stores apply it on disk.
    pub fn apply(&mut self, update: &ProgressUpdate, now: DateTime<Utc>) {
        if let Some(module) = update.module {
            self.current_module = module;
        }
        if let Some(submodule) = update.submodule {
            self.current_submodule = submodule;
        }
        if let Some(page) = update.page {
            self.current_page = page;
        }
        if update.mark_completed
            && let Some(module) = update.module
        {
            self.completed_modules.insert(module);
        }
        self.last_active = Some(now);
    }
}

/// Partial update of a progress record. Unset fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub module: Option<ModuleId>,
    pub submodule: Option<SubmoduleId>,
    pub page: Option<u32>,

    /// Adds `module` to the completed set (no-op if already there).
    pub mark_completed: bool,
}

impl ProgressUpdate {
    /// Moves the user to a page.
    #[must_use]
    pub const fn position(module: ModuleId, submodule: SubmoduleId, page: u32) -> Self {
        Self {
            module: Some(module),
            submodule: Some(submodule),
            page: Some(page),
            mark_completed: false,
        }
    }

    /// Marks a module as completed (and makes it the current module).
    #[must_use]
    pub const fn complete(module: ModuleId) -> Self {
        Self {
            module: Some(module),
            submodule: None,
            page: None,
            mark_completed: true,
        }
    }
}

/// Durable storage of user progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Returns the user's record, creating the default one if absent.
    async fn get_progress(&self, user: UserId) -> Result<UserProgress, StoreError>;

    /// Applies a partial update and stamps the last-active time.
    async fn update_progress(&self, user: UserId, update: ProgressUpdate) -> Result<(), StoreError>;

    /// Restores the default position and clears completed modules.
    async fn reset_progress(&self, user: UserId) -> Result<(), StoreError>;

    /// Users active within the last `within_days` days.
    async fn list_active_users(&self, within_days: u32) -> Result<Vec<UserId>, StoreError>;

    /// Every stored record, ordered by user id.
    async fn all_progress(&self) -> Result<Vec<(UserId, UserProgress)>, StoreError>;
}

/// Serializes a completed set for the `completed_modules` column.
pub(crate) fn encode_completed(completed: &BTreeSet<ModuleId>) -> String {
    serde_json::to_string(completed).unwrap_or_else(|_| "[]".to_owned())
}

/// Parses the `completed_modules` column. Empty or NULL means no modules.
pub(crate) fn decode_completed(raw: Option<&str>) -> Result<BTreeSet<ModuleId>, StoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(BTreeSet::new()),
        Some(json) => serde_json::from_str::<Vec<ModuleId>>(json)
            .map(|ids| ids.into_iter().collect())
            .map_err(|e| StoreError::Unavailable(format!("corrupt completed_modules '{json}': {e}"))),
    }
}

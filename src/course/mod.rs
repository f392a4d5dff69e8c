//! Course logic: navigation, quizzes and the practice gate.
//!
//! Everything here works against the injected [`Catalog`], a
//! [`ProgressStore`] and a [`ContentResolver`]. Ordinary conditions such as
//! an unknown identifier or a locked module come back as [`Outcome`]
//! variants. Only storage failures are errors.
//!
//! [`Catalog`]: crate::catalog::Catalog
//! [`ProgressStore`]: crate::progress::ProgressStore
//! [`ContentResolver`]: crate::catalog::ContentResolver

pub mod navigation;
pub mod practice;
pub mod quiz;

use std::fmt;

use crate::catalog::ModuleId;

pub use navigation::{ModuleSummary, Navigator, PageView, ProgressOverview};
pub use practice::{PracticeEntry, PracticeGate, Submission, TaskDetail, TaskList};
pub use quiz::{AnswerFeedback, QuizEngine, QuizEntry, QuizIntro, QuizResult, QuizStep};

/// Quiz pass threshold, in percent. Inclusive.
pub const PASS_THRESHOLD_PERCENT: u32 = 70;

/// What a request referred to that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Module,
    Submodule,
    Page,
    Content,
    Question,
    AnswerOption,
    Task,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Self::Module => "module",
            Self::Submodule => "submodule",
            Self::Page => "page",
            Self::Content => "page content",
            Self::Question => "question",
            Self::AnswerOption => "answer option",
            Self::Task => "practice task",
        };
        f.write_str(what)
    }
}

/// Result of a course operation that may legitimately not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    NotFound(Missing),
    /// Practice tasks of this module are locked until its quiz is passed.
    Locked(ModuleId),
}

impl<T> Outcome<T> {
    /// Returns the value if ready.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ready(value) => Outcome::Ready(f(value)),
            Self::NotFound(missing) => Outcome::NotFound(missing),
            Self::Locked(module) => Outcome::Locked(module),
        }
    }
}

/// Quiz score as a whole percentage, rounded half up. An empty quiz scores 0.
#[must_use]
pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rounded = (score * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Checks a percentage against the pass threshold.
#[must_use]
pub const fn is_pass(percent: u32) -> bool {
    percent >= PASS_THRESHOLD_PERCENT
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use crate::progress::{ProgressStore, ProgressUpdate, StoreError, UserId, UserProgress};

    /// A store whose every call fails.
    #[derive(Debug, Default)]
    pub(crate) struct FailingStore;

    fn down() -> StoreError {
        StoreError::Unavailable("database is locked".to_owned())
    }

    #[async_trait]
    impl ProgressStore for FailingStore {
        async fn get_progress(&self, _user: UserId) -> Result<UserProgress, StoreError> {
            Err(down())
        }

        async fn update_progress(&self, _user: UserId, _update: ProgressUpdate) -> Result<(), StoreError> {
            Err(down())
        }

        async fn reset_progress(&self, _user: UserId) -> Result<(), StoreError> {
            Err(down())
        }

        async fn list_active_users(&self, _within_days: u32) -> Result<Vec<UserId>, StoreError> {
            Err(down())
        }

        async fn all_progress(&self) -> Result<Vec<(UserId, UserProgress)>, StoreError> {
            Err(down())
        }
    }

    /// A store that reads fine but refuses writes.
    #[derive(Debug, Default)]
    pub(crate) struct ReadOnlyStore;

    #[async_trait]
    impl ProgressStore for ReadOnlyStore {
        async fn get_progress(&self, _user: UserId) -> Result<UserProgress, StoreError> {
            Ok(UserProgress::default())
        }

        async fn update_progress(&self, _user: UserId, _update: ProgressUpdate) -> Result<(), StoreError> {
            Err(down())
        }

        async fn reset_progress(&self, _user: UserId) -> Result<(), StoreError> {
            Err(down())
        }

        async fn list_active_users(&self, _within_days: u32) -> Result<Vec<UserId>, StoreError> {
            Ok(Vec::new())
        }

        async fn all_progress(&self) -> Result<Vec<(UserId, UserProgress)>, StoreError> {
            Ok(Vec::new())
        }
    }
}

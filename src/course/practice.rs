//! Practice gate: tasks open up once a module's quiz is passed.

use std::sync::Arc;

use tracing::info;

use super::{Missing, Outcome};
use crate::catalog::{Catalog, ModuleId, PracticeTask};
use crate::progress::{ProgressStore, StoreError, UserId};

/// One row of the practice menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeEntry {
    pub module: ModuleId,
    pub title: String,
    pub tasks: usize,
    pub unlocked: bool,
}

/// Tasks of an unlocked module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub module: ModuleId,
    pub title: String,
    pub tasks: Vec<PracticeTask>,
}

/// A single task of an unlocked module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub module: ModuleId,
    pub index: usize,
    pub task: PracticeTask,
}

/// Kind of file a user sent in as a practice submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Screenshot,
    Document,
}

#[derive(Clone)]
pub struct PracticeGate {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
}

impl PracticeGate {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Whether the user has passed `module`'s quiz.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn is_unlocked(&self, user: UserId, module: ModuleId) -> Result<bool, StoreError> {
        Ok(self.store.get_progress(user).await?.has_completed(module))
    }

    /// Lists modules with their lock state.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn menu(&self, user: UserId) -> Result<Vec<PracticeEntry>, StoreError> {
        let progress = self.store.get_progress(user).await?;
        Ok(self
            .catalog
            .modules()
            .map(|m| PracticeEntry {
                module: m.id,
                title: m.title.clone(),
                tasks: m.practice.len(),
                unlocked: progress.has_completed(m.id),
            })
            .collect())
    }

    /// Task list of a module, if the user has unlocked it.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn tasks(&self, user: UserId, module: ModuleId) -> Result<Outcome<TaskList>, StoreError> {
        let Some(module_ref) = self.catalog.module(module) else {
            return Ok(Outcome::NotFound(Missing::Module));
        };
        if !self.is_unlocked(user, module).await? {
            return Ok(Outcome::Locked(module));
        }
        if module_ref.practice.is_empty() {
            return Ok(Outcome::NotFound(Missing::Task));
        }

        Ok(Outcome::Ready(TaskList {
            module,
            title: module_ref.title.clone(),
            tasks: module_ref.practice.clone(),
        }))
    }

    /// A single task, gated like the task list.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn task(
        &self,
        user: UserId,
        module: ModuleId,
        index: usize,
    ) -> Result<Outcome<TaskDetail>, StoreError> {
        if self.catalog.module(module).is_none() {
            return Ok(Outcome::NotFound(Missing::Module));
        }
        if !self.is_unlocked(user, module).await? {
            return Ok(Outcome::Locked(module));
        }

        Ok(self
            .catalog
            .practice_tasks(module)
            .get(index)
            .map_or(Outcome::NotFound(Missing::Task), |task| {
                Outcome::Ready(TaskDetail {
                    module,
                    index,
                    task: task.clone(),
                })
            }))
    }

    /// Acknowledges a submitted file. Submissions are reviewed by hand.
    pub fn submission(&self, user: UserId, kind: Submission) {
        info!("User {} submitted a practice {:?}", user, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::course::testing::FailingStore;
    use crate::progress::{InMemoryProgressStore, ProgressUpdate};

    fn gate(store: Arc<dyn ProgressStore>) -> PracticeGate {
        PracticeGate::new(Arc::new(fixtures::catalog()), store)
    }

    #[tokio::test]
    async fn test_locked_until_completed() {
        let store = InMemoryProgressStore::new();
        let gate = gate(Arc::new(store.clone()));

        assert!(!gate.is_unlocked(42, 1).await.unwrap());
        assert_eq!(gate.tasks(42, 1).await.unwrap(), Outcome::Locked(1));

        store.update_progress(42, ProgressUpdate::complete(1)).await.unwrap();

        assert!(gate.is_unlocked(42, 1).await.unwrap());
        let list = gate.tasks(42, 1).await.unwrap().ready().unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].title, "First capture");
    }

    #[tokio::test]
    async fn test_task_detail_is_gated() {
        let store = InMemoryProgressStore::new();
        let gate = gate(Arc::new(store.clone()));

        assert_eq!(gate.task(7, 1, 0).await.unwrap(), Outcome::Locked(1));

        store.update_progress(7, ProgressUpdate::complete(1)).await.unwrap();
        let detail = gate.task(7, 1, 0).await.unwrap().ready().unwrap();
        assert_eq!(detail.task.title, "First capture");
        assert_eq!(
            gate.task(7, 1, 1).await.unwrap(),
            Outcome::NotFound(Missing::Task)
        );
    }

    #[tokio::test]
    async fn test_unknown_and_empty_modules() {
        let store = InMemoryProgressStore::new();
        store.update_progress(3, ProgressUpdate::complete(2)).await.unwrap();
        let gate = gate(Arc::new(store));

        assert_eq!(
            gate.tasks(3, 9).await.unwrap(),
            Outcome::NotFound(Missing::Module)
        );
        assert_eq!(
            gate.tasks(3, 2).await.unwrap(),
            Outcome::NotFound(Missing::Task)
        );
    }

    #[tokio::test]
    async fn test_menu_flags() {
        let store = InMemoryProgressStore::new();
        store.update_progress(3, ProgressUpdate::complete(2)).await.unwrap();
        let gate = gate(Arc::new(store));

        let menu = gate.menu(3).await.unwrap();
        assert_eq!(
            menu.iter().map(|e| (e.module, e.unlocked)).collect::<Vec<_>>(),
            vec![(1, false), (2, true)]
        );
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let gate = gate(Arc::new(FailingStore));
        assert!(gate.tasks(1, 1).await.is_err());
    }
}

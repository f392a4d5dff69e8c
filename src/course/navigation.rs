//! Theory navigation over `(module, submodule, page)`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Missing, Outcome};
use crate::catalog::{Catalog, ContentKey, ContentResolver, Module, ModuleId, PageContent, SubmoduleId};
use crate::progress::{ProgressStore, ProgressUpdate, StoreError, UserId};

/// One row of a module listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub id: ModuleId,
    pub title: String,
    pub completed: bool,
}

/// A rendered theory page with its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub key: ContentKey,
    pub module_title: String,
    pub submodule_title: String,
    pub pages: u32,
    pub content: PageContent,

    /// Previous page number, if there is one.
    pub prev: Option<u32>,
    /// Next page number, if there is one.
    pub next: Option<u32>,
}

/// Where a user stands in the course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOverview {
    pub module: ModuleId,
    pub submodule: SubmoduleId,
    pub page: u32,
    pub module_title: Option<String>,
    pub submodule_title: Option<String>,
    pub completed: Vec<ModuleSummary>,
    pub total_modules: usize,
}

/// Moves users through theory pages and records where they are.
#[derive(Clone)]
pub struct Navigator {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
    content: Arc<dyn ContentResolver>,
}

impl Navigator {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn ProgressStore>,
        content: Arc<dyn ContentResolver>,
    ) -> Self {
        Self {
            catalog,
            store,
            content,
        }
    }

    /// Lists all modules with the user's completion flags.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn modules(&self, user: UserId) -> Result<Vec<ModuleSummary>, StoreError> {
        let progress = self.store.get_progress(user).await?;
        Ok(self
            .catalog
            .modules()
            .map(|m| ModuleSummary {
                id: m.id,
                title: m.title.clone(),
                completed: progress.has_completed(m.id),
            })
            .collect())
    }

    /// Opens a module for submodule selection. Does not touch progress.
    #[must_use]
    pub fn select_module(&self, module: ModuleId) -> Outcome<&Module> {
        self.catalog
            .module(module)
            .map_or(Outcome::NotFound(Missing::Module), Outcome::Ready)
    }

    /// Opens the first page of a submodule.
    ///
    /// # Errors
    ///
    /// Returns an error if the new position cannot be stored.
    pub async fn select_submodule(
        &self,
        user: UserId,
        module: ModuleId,
        submodule: SubmoduleId,
    ) -> Result<Outcome<PageView>, StoreError> {
        self.view_page(user, module, submodule, 1).await
    }

    /// Renders a page and records it as the user's position.
    ///
    /// Pages outside `1..=pages` are not found; nothing wraps or clamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the new position cannot be stored.
    pub async fn view_page(
        &self,
        user: UserId,
        module: ModuleId,
        submodule: SubmoduleId,
        page: u32,
    ) -> Result<Outcome<PageView>, StoreError> {
        let Some(module_ref) = self.catalog.module(module) else {
            return Ok(Outcome::NotFound(Missing::Module));
        };
        let Some(sub) = module_ref.submodule(submodule) else {
            return Ok(Outcome::NotFound(Missing::Submodule));
        };
        if !sub.has_page(page) {
            return Ok(Outcome::NotFound(Missing::Page));
        }

        let key = ContentKey::new(module, submodule, page);
        let Some(content) = self.content.resolve(key) else {
            warn!("No content for page {}", key);
            return Ok(Outcome::NotFound(Missing::Content));
        };

        self.store
            .update_progress(user, ProgressUpdate::position(module, submodule, page))
            .await?;
        debug!("User {} viewing page {}", user, key);

        Ok(Outcome::Ready(PageView {
            key,
            module_title: module_ref.title.clone(),
            submodule_title: sub.title.clone(),
            pages: sub.pages,
            content,
            prev: (page > 1).then(|| page - 1),
            next: (page < sub.pages).then(|| page + 1),
        }))
    }

    /// Reopens the page the user last viewed.
    ///
    /// A stored position that no longer exists in the catalog is not found.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read or written.
    pub async fn resume(&self, user: UserId) -> Result<Outcome<PageView>, StoreError> {
        let progress = self.store.get_progress(user).await?;
        let (module, submodule, page) = progress.position();

        let exists = self
            .catalog
            .submodule(module, submodule)
            .is_some_and(|s| s.has_page(page));
        if !exists {
            warn!(
                "Stored position {}.{}.{} of user {} is not in the catalog",
                module, submodule, page, user
            );
            return Ok(Outcome::NotFound(Missing::Page));
        }

        self.view_page(user, module, submodule, page).await
    }

    /// Summarises the user's position and completed modules.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn overview(&self, user: UserId) -> Result<ProgressOverview, StoreError> {
        let progress = self.store.get_progress(user).await?;
        let module = self.catalog.module(progress.current_module);

        let completed = progress
            .completed_modules
            .iter()
            .filter_map(|id| self.catalog.module(*id))
            .map(|m| ModuleSummary {
                id: m.id,
                title: m.title.clone(),
                completed: true,
            })
            .collect();

        Ok(ProgressOverview {
            module: progress.current_module,
            submodule: progress.current_submodule,
            page: progress.current_page,
            module_title: module.map(|m| m.title.clone()),
            submodule_title: module
                .and_then(|m| m.submodule(progress.current_submodule))
                .map(|s| s.title.clone()),
            completed,
            total_modules: self.catalog.total_modules(),
        })
    }
}

//! Content catalog: the static curriculum.
//!
//! The catalog is an immutable hierarchy of modules, submodules and page
//! counts, plus a question bank and a practice-task bank per module. It is
//! loaded once at startup, validated, and shared behind an `Arc`.
//!
//! All lookups are pure. Unknown identifiers yield `None` (or an empty
//! slice), never an error, so callers check for absence explicitly.

mod model;
mod pages;
mod validation;

use std::collections::BTreeMap;
use std::path::Path;

pub use model::{Module, ModuleId, PracticeTask, Question, Submodule, SubmoduleId};
pub use pages::{ContentKey, ContentResolver, PageContent, PageLibrary};
pub use validation::CatalogError;

use model::{CatalogFile, ModuleFile};

/// Catalog shipped with the bot.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../../content/catalog.json");

/// The validated, immutable curriculum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    modules: BTreeMap<ModuleId, Module>,
}

impl Catalog {
    /// Parses and validates a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or a parse error.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Loads the catalog embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded catalog is broken.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    /// Loads and validates a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Returns every validation problem in a JSON catalog instead of the first one.
    ///
    /// An empty list means the catalog is valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed at all.
    pub fn validate_all(json: &str) -> Result<Vec<CatalogError>, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(validation::check_catalog(&file))
    }

    /// Saves the catalog as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let file = CatalogFile {
            modules: self.modules.values().map(ModuleFile::from).collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        if let Some(first) = validation::check_catalog(&file).into_iter().next() {
            return Err(first);
        }

        let modules = file
            .modules
            .into_iter()
            .map(|m| {
                let module = Module {
                    id: m.id,
                    title: m.title,
                    description: m.description,
                    submodules: m.submodules.into_iter().map(|s| (s.id, s)).collect(),
                    questions: m.questions,
                    practice: m.practice,
                };
                (module.id, module)
            })
            .collect();

        Ok(Self { modules })
    }

    /// Looks up a module.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Looks up a submodule within a module.
    #[must_use]
    pub fn submodule(&self, module_id: ModuleId, submodule_id: SubmoduleId) -> Option<&Submodule> {
        self.module(module_id)?.submodule(submodule_id)
    }

    /// Number of modules in the curriculum.
    #[must_use]
    pub fn total_modules(&self) -> usize {
        self.modules.len()
    }

    /// Number of submodules in a module, 0 for an unknown module.
    #[must_use]
    pub fn total_submodules(&self, module_id: ModuleId) -> usize {
        self.module(module_id).map_or(0, |m| m.submodules.len())
    }

    /// Quiz questions of a module, empty for an unknown module.
    #[must_use]
    pub fn questions(&self, module_id: ModuleId) -> &[Question] {
        self.module(module_id)
            .map(|m| m.questions.as_slice())
            .unwrap_or_default()
    }

    /// Practice tasks of a module, empty for an unknown module.
    #[must_use]
    pub fn practice_tasks(&self, module_id: ModuleId) -> &[PracticeTask] {
        self.module(module_id)
            .map(|m| m.practice.as_slice())
            .unwrap_or_default()
    }

    /// Iterates modules in id order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Iterates every addressable page key in curriculum order.
    pub fn page_keys(&self) -> impl Iterator<Item = ContentKey> + '_ {
        self.modules.values().flat_map(|m| {
            m.submodules
                .values()
                .flat_map(move |s| (1..=s.pages).map(move |p| ContentKey::new(m.id, s.id, p)))
        })
    }
}

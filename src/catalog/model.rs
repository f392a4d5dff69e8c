//! Curriculum entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a top-level module (1-based).
pub type ModuleId = u32;

/// Identifier of a submodule, unique within its module (1-based).
pub type SubmoduleId = u32;

/// A titled section of a module, paginated into one or more pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submodule {
    pub id: SubmoduleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Number of content pages, always at least 1 in a validated catalog.
    pub pages: u32,
}

impl Submodule {
    /// Returns true if `page` addresses an existing page of this submodule.
    #[must_use]
    pub const fn has_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.pages
    }
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    /// Prompt shown to the user.
    pub text: String,

    /// Answer options in display order.
    pub options: Vec<String>,

    /// Index into `options` of the right answer.
    pub correct: usize,
}

impl Question {
    /// Checks whether the chosen option index is the right answer.
    #[must_use]
    pub const fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct
    }

    /// Text of the right answer, if the question is well formed.
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct).map(String::as_str)
    }
}

/// A hands-on assignment unlocked by passing a module's quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PracticeTask {
    pub title: String,
    pub description: String,

    /// What the reviewer looks for in a submission.
    pub check: String,
}

/// A top-level curriculum unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub submodules: BTreeMap<SubmoduleId, Submodule>,
    pub questions: Vec<Question>,
    pub practice: Vec<PracticeTask>,
}

impl Module {
    /// Looks up a submodule by id.
    #[must_use]
    pub fn submodule(&self, id: SubmoduleId) -> Option<&Submodule> {
        self.submodules.get(&id)
    }

    /// Total number of pages across all submodules.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.submodules.values().map(|s| s.pages).sum()
    }
}

/// On-disk shape of a module. Submodules are a list in the file and a map in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ModuleFile {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submodules: Vec<Submodule>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub practice: Vec<PracticeTask>,
}

/// On-disk shape of the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CatalogFile {
    pub modules: Vec<ModuleFile>,
}

impl From<&Module> for ModuleFile {
    fn from(module: &Module) -> Self {
        Self {
            id: module.id,
            title: module.title.clone(),
            description: module.description.clone(),
            submodules: module.submodules.values().cloned().collect(),
            questions: module.questions.clone(),
            practice: module.practice.clone(),
        }
    }
}

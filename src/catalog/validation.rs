//! Catalog loading errors and static validation.

use std::collections::HashSet;

use thiserror::Error;

use super::model::{CatalogFile, ModuleFile, ModuleId, SubmoduleId};

/// Errors that can occur while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No modules configured")]
    NoModules,

    #[error("Duplicate module ID found: {id}")]
    DuplicateModule { id: ModuleId },

    #[error("Module IDs must run from 1 to {expected_max} without gaps, found {id}")]
    NonContiguousModules { id: ModuleId, expected_max: usize },

    #[error("Module {module} has an empty title")]
    EmptyModuleTitle { module: ModuleId },

    #[error("Module {module} has no submodules")]
    NoSubmodules { module: ModuleId },

    #[error("Duplicate submodule ID {submodule} in module {module}")]
    DuplicateSubmodule {
        module: ModuleId,
        submodule: SubmoduleId,
    },

    #[error("Submodule {module}.{submodule} has an empty title")]
    EmptySubmoduleTitle {
        module: ModuleId,
        submodule: SubmoduleId,
    },

    #[error("Submodule {module}.{submodule} has no pages (must be >= 1)")]
    NoPages {
        module: ModuleId,
        submodule: SubmoduleId,
    },

    #[error("Module {module} has no quiz questions and could never be completed")]
    NoQuestions { module: ModuleId },

    #[error("Question {index} of module {module} has {count} option(s), at least 2 required")]
    TooFewOptions {
        module: ModuleId,
        index: usize,
        count: usize,
    },

    #[error("Question {index} of module {module} has an empty prompt or option")]
    EmptyQuestionText { module: ModuleId, index: usize },

    #[error("Question {index} of module {module} marks option {correct} as correct, but only {count} exist")]
    CorrectOutOfRange {
        module: ModuleId,
        index: usize,
        correct: usize,
        count: usize,
    },

    #[error("Practice task {index} of module {module} has an empty title")]
    EmptyTaskTitle { module: ModuleId, index: usize },

    #[error("Invalid page key '{key}', expected module.submodule.page")]
    InvalidPageKey { key: String },

    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Collects every problem in a raw catalog.
pub(crate) fn check_catalog(file: &CatalogFile) -> Vec<CatalogError> {
    let mut issues = Vec::new();

    if file.modules.is_empty() {
        issues.push(CatalogError::NoModules);
        return issues;
    }

    let total = file.modules.len();
    let mut seen_ids = HashSet::new();

    for module in &file.modules {
        if !seen_ids.insert(module.id) {
            issues.push(CatalogError::DuplicateModule { id: module.id });
            continue;
        }

        // Modules are enumerated as 1..=N by the menus
        let in_range = usize::try_from(module.id).is_ok_and(|id| (1..=total).contains(&id));
        if !in_range {
            issues.push(CatalogError::NonContiguousModules {
                id: module.id,
                expected_max: total,
            });
        }

        check_module(module, &mut issues);
    }

    issues
}

fn check_module(module: &ModuleFile, issues: &mut Vec<CatalogError>) {
    let id = module.id;

    if module.title.trim().is_empty() {
        issues.push(CatalogError::EmptyModuleTitle { module: id });
    }

    if module.submodules.is_empty() {
        issues.push(CatalogError::NoSubmodules { module: id });
    }

    let mut seen_subs = HashSet::new();
    for sub in &module.submodules {
        if !seen_subs.insert(sub.id) {
            issues.push(CatalogError::DuplicateSubmodule {
                module: id,
                submodule: sub.id,
            });
            continue;
        }
        if sub.title.trim().is_empty() {
            issues.push(CatalogError::EmptySubmoduleTitle {
                module: id,
                submodule: sub.id,
            });
        }
        if sub.pages == 0 {
            issues.push(CatalogError::NoPages {
                module: id,
                submodule: sub.id,
            });
        }
    }

    if module.questions.is_empty() {
        issues.push(CatalogError::NoQuestions { module: id });
    }

    for (index, question) in module.questions.iter().enumerate() {
        let count = question.options.len();
        if count < 2 {
            issues.push(CatalogError::TooFewOptions {
                module: id,
                index,
                count,
            });
            continue;
        }
        if question.text.trim().is_empty() || question.options.iter().any(|o| o.trim().is_empty()) {
            issues.push(CatalogError::EmptyQuestionText { module: id, index });
        }
        if question.correct >= count {
            issues.push(CatalogError::CorrectOutOfRange {
                module: id,
                index,
                correct: question.correct,
                count,
            });
        }
    }

    for (index, task) in module.practice.iter().enumerate() {
        if task.title.trim().is_empty() {
            issues.push(CatalogError::EmptyTaskTitle { module: id, index });
        }
    }
}

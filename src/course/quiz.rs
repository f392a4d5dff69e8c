//! Quiz engine.
//!
//! An attempt is never stored. Its whole state, the module, the index of the
//! next question and the running score, travels in the request that asks or
//! answers a question. Only a passed attempt writes anything: the module is
//! added to the user's completed set.

use std::sync::Arc;

use tracing::{debug, info};

use super::{Missing, Outcome, is_pass, percentage};
use crate::catalog::{Catalog, ModuleId};
use crate::progress::{ProgressStore, ProgressUpdate, StoreError, UserId};

/// One row of the quiz selection view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizEntry {
    pub module: ModuleId,
    pub title: String,
    pub questions: usize,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizIntro {
    pub module: ModuleId,
    pub title: String,
    pub questions: usize,
}

/// What comes next in an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    Question {
        module: ModuleId,
        index: usize,
        score: usize,
        total: usize,
        text: String,
        options: Vec<String>,
    },
    Finished(QuizResult),
}

/// Outcome of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub module: ModuleId,
    pub title: String,
    pub score: usize,
    pub total: usize,
    pub percent: u32,
    pub passed: bool,
}

/// Feedback on one answer plus the step that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_option: String,
    pub next: QuizStep,
}

/// Drives quiz attempts one question at a time.
#[derive(Clone)]
pub struct QuizEngine {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Lists every module's quiz. Quizzes are open regardless of progress.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read.
    pub async fn selection(&self, user: UserId) -> Result<Vec<QuizEntry>, StoreError> {
        let progress = self.store.get_progress(user).await?;
        Ok(self
            .catalog
            .modules()
            .map(|m| QuizEntry {
                module: m.id,
                title: m.title.clone(),
                questions: m.questions.len(),
                completed: progress.has_completed(m.id),
            })
            .collect())
    }

    #[must_use]
    pub fn intro(&self, module: ModuleId) -> Outcome<QuizIntro> {
        match self.catalog.module(module) {
            None => Outcome::NotFound(Missing::Module),
            Some(m) if m.questions.is_empty() => Outcome::NotFound(Missing::Question),
            Some(m) => Outcome::Ready(QuizIntro {
                module,
                title: m.title.clone(),
                questions: m.questions.len(),
            }),
        }
    }

    /// Presents the question at `index`, or finishes the attempt once every
    /// question has been answered.
    ///
    /// # Errors
    ///
    /// Returns an error if a passed attempt cannot be recorded.
    pub async fn ask(
        &self,
        user: UserId,
        module: ModuleId,
        index: usize,
        score: usize,
    ) -> Result<Outcome<QuizStep>, StoreError> {
        let Some(module_ref) = self.catalog.module(module) else {
            return Ok(Outcome::NotFound(Missing::Module));
        };
        let total = module_ref.questions.len();

        if score > index || index > total {
            return Ok(Outcome::NotFound(Missing::Question));
        }

        match module_ref.questions.get(index) {
            Some(question) => Ok(Outcome::Ready(QuizStep::Question {
                module,
                index,
                score,
                total,
                text: question.text.clone(),
                options: question.options.clone(),
            })),
            None => {
                let result = self.finish(user, module, score, total).await?;
                Ok(Outcome::Ready(QuizStep::Finished(result)))
            }
        }
    }

    /// Checks the answer to question `index` and advances the attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if a passed attempt cannot be recorded.
    pub async fn answer(
        &self,
        user: UserId,
        module: ModuleId,
        index: usize,
        score: usize,
        choice: usize,
    ) -> Result<Outcome<AnswerFeedback>, StoreError> {
        let Some(module_ref) = self.catalog.module(module) else {
            return Ok(Outcome::NotFound(Missing::Module));
        };
        if score > index {
            return Ok(Outcome::NotFound(Missing::Question));
        }
        let Some(question) = module_ref.questions.get(index) else {
            return Ok(Outcome::NotFound(Missing::Question));
        };
        if choice >= question.options.len() {
            return Ok(Outcome::NotFound(Missing::AnswerOption));
        }

        let correct = question.is_correct(choice);
        let correct_option = question.correct_option().unwrap_or_default().to_owned();
        let score = score + usize::from(correct);

        let next = self.ask(user, module, index + 1, score).await?;
        Ok(next.map(|next| AnswerFeedback {
            correct,
            correct_option,
            next,
        }))
    }

    async fn finish(
        &self,
        user: UserId,
        module: ModuleId,
        score: usize,
        total: usize,
    ) -> Result<QuizResult, StoreError> {
        let percent = percentage(score, total);
        let passed = is_pass(percent);

        if passed {
            self.store
                .update_progress(user, ProgressUpdate::complete(module))
                .await?;
            info!("User {} passed quiz {} with {}%", user, module, percent);
        } else {
            debug!("User {} failed quiz {} with {}%", user, module, percent);
        }

        let title = self
            .catalog
            .module(module)
            .map(|m| m.title.clone())
            .unwrap_or_default();

        Ok(QuizResult {
            module,
            title,
            score,
            total,
            percent,
            passed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::course::testing::{FailingStore, ReadOnlyStore};
    use crate::progress::InMemoryProgressStore;

    fn engine(store: Arc<dyn ProgressStore>) -> QuizEngine {
        QuizEngine::new(Arc::new(fixtures::catalog()), store)
    }

    /// Answers every question of `module`, `right` of them correctly.
    async fn run_attempt(
        engine: &QuizEngine,
        user: UserId,
        module: ModuleId,
        right: usize,
    ) -> Result<QuizResult, StoreError> {
        let questions = engine.catalog.questions(module).to_vec();
        let (mut index, mut score) = (0, 0);
        loop {
            let question = &questions[index];
            let choice = if index < right {
                question.correct
            } else {
                (question.correct + 1) % question.options.len()
            };
            let feedback = engine
                .answer(user, module, index, score, choice)
                .await?
                .ready()
                .unwrap();
            match feedback.next {
                QuizStep::Question {
                    index: i, score: s, ..
                } => (index, score) = (i, s),
                QuizStep::Finished(result) => return Ok(result),
            }
        }
    }

    #[tokio::test]
    async fn test_three_of_four_passes() {
        let store = InMemoryProgressStore::new();
        let engine = engine(Arc::new(store.clone()));

        let result = run_attempt(&engine, 42, 1, 3).await.unwrap();
        assert_eq!(result.percent, 75);
        assert!(result.passed);
        assert!(store.get_progress(42).await.unwrap().has_completed(1));
    }

    #[tokio::test]
    async fn test_two_of_four_fails_without_writing() {
        let store = InMemoryProgressStore::new();
        let engine = engine(Arc::new(store.clone()));
        let before = store.get_progress(42).await.unwrap();

        let result = run_attempt(&engine, 42, 1, 2).await.unwrap();
        assert_eq!(result.percent, 50);
        assert!(!result.passed);

        let after = store.get_progress(42).await.unwrap();
        assert_eq!(after.completed_modules, before.completed_modules);
        assert_eq!(after.position(), before.position());

        // Retry starts over from the first question with no score
        let retry = engine.ask(42, 1, 0, 0).await.unwrap().ready().unwrap();
        assert!(matches!(retry, QuizStep::Question { index: 0, score: 0, .. }));
    }

    #[tokio::test]
    async fn test_exactly_seventy_percent_passes() {
        let store = InMemoryProgressStore::new();
        let engine = engine(Arc::new(store.clone()));

        let result = run_attempt(&engine, 5, 2, 7).await.unwrap();
        assert_eq!(result.percent, 70);
        assert!(result.passed);

        let result = run_attempt(&engine, 6, 2, 6).await.unwrap();
        assert_eq!(result.percent, 60);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn test_retake_does_not_duplicate_completion() {
        let store = InMemoryProgressStore::new();
        let engine = engine(Arc::new(store.clone()));

        run_attempt(&engine, 9, 1, 4).await.unwrap();
        run_attempt(&engine, 9, 1, 4).await.unwrap();

        let progress = store.get_progress(9).await.unwrap();
        assert_eq!(progress.completed_modules.len(), 1);
    }

    #[tokio::test]
    async fn test_answer_feedback() {
        let engine = engine(Arc::new(InMemoryProgressStore::new()));

        let feedback = engine.answer(1, 2, 0, 0, 0).await.unwrap().ready().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_option, "y");
        assert!(matches!(
            feedback.next,
            QuizStep::Question { index: 1, score: 0, total: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_forged_tokens_rejected() {
        let engine = engine(Arc::new(InMemoryProgressStore::new()));

        assert_eq!(
            engine.ask(1, 1, 5, 0).await.unwrap(),
            Outcome::NotFound(Missing::Question)
        );
        assert_eq!(
            engine.ask(1, 1, 2, 3).await.unwrap(),
            Outcome::NotFound(Missing::Question)
        );
        assert_eq!(
            engine.answer(1, 1, 0, 0, 2).await.unwrap(),
            Outcome::NotFound(Missing::AnswerOption)
        );
        assert_eq!(
            engine.answer(1, 1, 4, 0, 0).await.unwrap(),
            Outcome::NotFound(Missing::Question)
        );
        assert_eq!(
            engine.ask(1, 9, 0, 0).await.unwrap(),
            Outcome::NotFound(Missing::Module)
        );
    }

    #[tokio::test]
    async fn test_selection_is_not_gated() {
        let engine = engine(Arc::new(InMemoryProgressStore::new()));

        let entries = engine.selection(1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.completed));
        assert!(engine.intro(2).is_ready());
        assert_eq!(engine.intro(3), Outcome::NotFound(Missing::Module));
    }

    #[tokio::test]
    async fn test_failed_write_is_not_a_pass() {
        let engine = engine(Arc::new(ReadOnlyStore));
        assert!(run_attempt(&engine, 1, 1, 4).await.is_err());

        // A failed attempt never writes, so it still finishes
        let result = run_attempt(&engine, 1, 1, 1).await.unwrap();
        assert!(!result.passed);

        let failing = self::engine(Arc::new(FailingStore));
        assert!(failing.selection(1).await.is_err());
    }
}

//! Request handler implementation.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use teloxide::utils::html::escape;
use tracing::{debug, error, info, warn};

use super::reply::{Button, Keyboard, Reply, Screen};
use super::types::{MenuCommand, Request};
use crate::catalog::{Catalog, ContentResolver, ModuleId};
use crate::course::{
    AnswerFeedback, Missing, Navigator, Outcome, PASS_THRESHOLD_PERCENT, PageView, PracticeGate,
    QuizEngine, QuizResult, QuizStep, Submission,
};
use crate::progress::{ProgressStore, StoreError, UserId};

/// Telegram caps callback answers at 200 characters.
const MAX_TOAST_LEN: usize = 190;

const MALFORMED_NOTICE: &str = "⚠️ This button is no longer valid. Open the menu again.";
const STORAGE_NOTICE: &str = "⚠️ Something went wrong, please try again later.";
const LOCKED_NOTICE: &str = "🔒 Pass this module's quiz first to unlock its practice tasks.";

/// Routes requests to the course logic and renders the results.
///
/// No error leaves the handler: each event ends in a [`Reply`], at worst a
/// generic notice.
pub struct RequestHandler {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
    navigator: Navigator,
    quiz: QuizEngine,
    practice: PracticeGate,

    /// Directory page illustrations are resolved against.
    images_dir: PathBuf,
}

impl RequestHandler {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn ProgressStore>,
        content: Arc<dyn ContentResolver>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            navigator: Navigator::new(Arc::clone(&catalog), Arc::clone(&store), content),
            quiz: QuizEngine::new(Arc::clone(&catalog), Arc::clone(&store)),
            practice: PracticeGate::new(Arc::clone(&catalog), Arc::clone(&store)),
            catalog,
            store,
            images_dir: images_dir.into(),
        }
    }

    /// Handles raw callback data from an inline button.
    pub async fn handle_callback(&self, user: UserId, data: &str) -> Reply {
        match Request::parse(data) {
            Ok(request) => self.handle(user, request).await,
            Err(e) => {
                warn!("Malformed callback data from user {}: {}", user, e);
                Reply::toast(MALFORMED_NOTICE)
            }
        }
    }

    /// Handles a parsed request.
    pub async fn handle(&self, user: UserId, request: Request) -> Reply {
        debug!("Handling request {} for user {}", request, user);
        self.execute(user, request)
            .await
            .unwrap_or_else(|e| storage_failure(user, &request.to_string(), &e))
    }

    /// Tries to handle a plain text message as a menu command.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle_text(&self, user: UserId, text: &str) -> Option<Reply> {
        let command = MenuCommand::parse(text)?;
        Some(self.handle_menu(user, command).await)
    }

    pub async fn handle_menu(&self, user: UserId, command: MenuCommand) -> Reply {
        debug!("Handling menu command {:?} for user {}", command, user);
        self.execute_menu(user, command)
            .await
            .unwrap_or_else(|e| storage_failure(user, &format!("{command:?}"), &e))
    }

    /// Acknowledges a file sent as a practice submission.
    #[must_use]
    pub fn handle_submission(&self, user: UserId, kind: Submission) -> Reply {
        self.practice.submission(user, kind);
        Reply::screen(Screen::text(
            "✅ Your submission has been received.\n\
             A reviewer will get back to you within 24 hours.",
        ))
    }

    async fn execute_menu(&self, user: UserId, command: MenuCommand) -> Result<Reply, StoreError> {
        match command {
            MenuCommand::Start => {
                // Touches the record so first-time users are registered
                self.store.get_progress(user).await?;
                Ok(Reply::screen(
                    Screen::text(
                        "👋 Welcome to the Wireshark training bot!\n\n\
                         Study the theory, take the quizzes and unlock hands-on practice tasks.",
                    )
                    .with_keyboard(Keyboard::main_menu()),
                ))
            }
            MenuCommand::Help => Ok(Reply::screen(help_screen())),
            MenuCommand::Progress => self.progress_screen(user).await.map(Reply::screen),
            MenuCommand::Reset => self.execute(user, Request::Reset).await,
            MenuCommand::Theory => self.execute(user, Request::Modules).await,
            MenuCommand::Practice => self.execute(user, Request::PracticeMenu).await,
            MenuCommand::Quizzes => self.execute(user, Request::Quizzes).await,
            MenuCommand::Resources => Ok(Reply::screen(resources_screen())),
        }
    }

    async fn execute(&self, user: UserId, request: Request) -> Result<Reply, StoreError> {
        match request {
            Request::Modules => self.modules_screen(user).await.map(Reply::screen),
            Request::SelectModule(module) => Ok(self.submodules_reply(module)),
            Request::SelectSubmodule(module, submodule) => {
                let outcome = self.navigator.select_submodule(user, module, submodule).await?;
                Ok(render(outcome, |view| Reply::screen(self.page_screen(&view))))
            }
            Request::ViewPage(module, submodule, page) => {
                let outcome = self.navigator.view_page(user, module, submodule, page).await?;
                Ok(render(outcome, |view| Reply::screen(self.page_screen(&view))))
            }
            Request::Resume => {
                let outcome = self.navigator.resume(user).await?;
                Ok(render(outcome, |view| Reply::screen(self.page_screen(&view))))
            }
            Request::Quizzes => self.quizzes_screen(user).await.map(Reply::screen),
            Request::QuizIntro(module) => Ok(render(self.quiz.intro(module), |intro| {
                Reply::screen(
                    Screen::text(format!(
                        "🧠 <b>Quiz: {}</b>\n\n\
                         Questions: {}\n\
                         You need {}% correct answers to pass.\n\
                         Press \"Start quiz\" when you are ready.",
                        escape(&intro.title),
                        intro.questions,
                        PASS_THRESHOLD_PERCENT
                    ))
                    .with_keyboard(Keyboard::column([
                        Button::new("▶️ Start quiz", start_quiz(module)),
                        Button::new("◀️ Back to quizzes", Request::Quizzes),
                    ])),
                )
            })),
            Request::Ask {
                module,
                index,
                score,
            } => {
                let outcome = self.quiz.ask(user, module, index, score).await?;
                Ok(render(outcome, |step| Reply::screen(quiz_step_screen(&step))))
            }
            Request::Answer {
                module,
                index,
                score,
                choice,
            } => {
                let outcome = self.quiz.answer(user, module, index, score, choice).await?;
                Ok(render(outcome, answer_reply))
            }
            Request::PracticeMenu => self.practice_screen(user).await.map(Reply::screen),
            Request::PracticeModule(module) => {
                let outcome = self.practice.tasks(user, module).await?;
                Ok(render(outcome, |list| {
                    let buttons = list.tasks.iter().enumerate().map(|(i, task)| {
                        Button::new(
                            format!("Task {}: {}", i + 1, truncate(&task.title, 40)),
                            Request::PracticeTask(module, i),
                        )
                    });
                    Reply::screen(
                        Screen::text(format!(
                            "📝 <b>Practice tasks: {}</b>\n\nChoose a task to see the details:",
                            escape(&list.title)
                        ))
                        .with_keyboard(Keyboard::column(buttons.chain([Button::new(
                            "◀️ Back to modules",
                            Request::PracticeMenu,
                        )]))),
                    )
                }))
            }
            Request::PracticeTask(module, index) => {
                let outcome = self.practice.task(user, module, index).await?;
                Ok(render(outcome, |detail| {
                    Reply::screen(
                        Screen::text(format!(
                            "🔧 <b>{}</b>\n\n\
                             <u>Task:</u>\n{}\n\n\
                             <u>Checking criteria:</u>\n{}\n\n\
                             Complete the task and send the result (screenshot or file) with a comment.",
                            escape(&detail.task.title),
                            escape(&detail.task.description),
                            escape(&detail.task.check)
                        ))
                        .with_keyboard(Keyboard::column([Button::new(
                            "◀️ Back to tasks",
                            Request::PracticeModule(detail.module),
                        )])),
                    )
                }))
            }
            Request::Reset => Ok(Reply::screen(
                Screen::text(
                    "⚠️ <b>Reset progress?</b>\n\n\
                     Your position and every completed module will be cleared. \
                     Practice tasks will be locked again.",
                )
                .with_keyboard(Keyboard::Inline(vec![vec![
                    Button::new("Yes, reset", Request::ResetConfirm),
                    Button::new("Cancel", Request::Modules),
                ]])),
            )),
            Request::ResetConfirm => {
                self.store.reset_progress(user).await?;
                info!("User {} reset their progress", user);
                Ok(Reply::screen(
                    Screen::text("🔄 Your progress has been reset. Start again from module 1.")
                        .with_keyboard(Keyboard::column([Button::new(
                            "📚 Modules",
                            Request::Modules,
                        )])),
                )
                .with_toast("Progress reset"))
            }
        }
    }

    async fn modules_screen(&self, user: UserId) -> Result<Screen, StoreError> {
        let modules = self.navigator.modules(user).await?;
        let buttons = modules.into_iter().map(|m| {
            let mark = if m.completed { "✅ " } else { "" };
            Button::new(format!("{mark}{}", m.title), Request::SelectModule(m.id))
        });

        Ok(Screen::text("📚 Choose a module to study:").with_keyboard(Keyboard::column(
            buttons.chain([Button::new("▶️ Continue where I left off", Request::Resume)]),
        )))
    }

    fn submodules_reply(&self, module: ModuleId) -> Reply {
        render(self.navigator.select_module(module), |module| {
            let mut text = format!("📖 <b>Module: {}</b>", escape(&module.title));
            if !module.description.is_empty() {
                let _ = write!(text, "\n\n{}", escape(&module.description));
            }
            text.push_str("\n\nChoose a section:");

            let buttons = module.submodules.values().map(|sub| {
                Button::new(sub.title.clone(), Request::SelectSubmodule(module.id, sub.id))
            });
            Reply::screen(Screen::text(text).with_keyboard(Keyboard::column(
                buttons.chain([Button::new("◀️ Back to modules", Request::Modules)]),
            )))
        })
    }

    fn page_screen(&self, view: &PageView) -> Screen {
        let key = view.key;
        let mut nav_row = Vec::new();
        if let Some(prev) = view.prev {
            nav_row.push(Button::new("⬅️ Back", Request::ViewPage(key.module, key.submodule, prev)));
        }
        if let Some(next) = view.next {
            nav_row.push(Button::new("Next ➡️", Request::ViewPage(key.module, key.submodule, next)));
        }

        let mut rows = vec![nav_row];
        let last_section = self
            .catalog
            .module(key.module)
            .and_then(|m| m.submodules.keys().next_back().copied());
        if view.next.is_none() && last_section == Some(key.submodule) {
            rows.push(vec![Button::new("📝 Take the quiz", Request::QuizIntro(key.module))]);
        }
        rows.push(vec![Button::new("📋 Topics", Request::SelectModule(key.module))]);
        rows.retain(|row| !row.is_empty());

        let text = format!(
            "<b>{}</b> · {}/{}\n\n{}",
            escape(&view.submodule_title),
            key.page,
            view.pages,
            view.content.text
        );

        Screen::text(text)
            .with_image(view.content.image.as_ref().map(|f| self.images_dir.join(f)))
            .with_keyboard(Keyboard::Inline(rows))
    }

    async fn quizzes_screen(&self, user: UserId) -> Result<Screen, StoreError> {
        let entries = self.quiz.selection(user).await?;
        let buttons = entries.into_iter().map(|e| {
            let mark = if e.completed { "✅" } else { "📝" };
            Button::new(format!("{mark} {}", e.title), Request::QuizIntro(e.module))
        });
        Ok(Screen::text("📝 Choose a quiz:").with_keyboard(Keyboard::column(buttons)))
    }

    async fn practice_screen(&self, user: UserId) -> Result<Screen, StoreError> {
        let entries = self.practice.menu(user).await?;
        let buttons = entries.into_iter().map(|e| {
            let mark = if e.unlocked { "✅" } else { "🔒" };
            Button::new(format!("{mark} {}", e.title), Request::PracticeModule(e.module))
        });
        Ok(
            Screen::text("🔍 Choose a module for practice tasks.\nTasks unlock once you pass the module quiz.")
                .with_keyboard(Keyboard::column(buttons)),
        )
    }

    async fn progress_screen(&self, user: UserId) -> Result<Screen, StoreError> {
        let overview = self.navigator.overview(user).await?;

        let mut text = String::from("📊 <b>Your progress</b>\n\n");
        let _ = writeln!(
            text,
            "Current module: {} {}",
            overview.module,
            escape(overview.module_title.as_deref().unwrap_or("?"))
        );
        let _ = writeln!(
            text,
            "Current section: {} {}",
            overview.submodule,
            escape(overview.submodule_title.as_deref().unwrap_or("?"))
        );
        let _ = writeln!(text, "Page: {}", overview.page);
        let _ = write!(
            text,
            "\nCompleted modules: {}/{}",
            overview.completed.len(),
            overview.total_modules
        );
        for module in &overview.completed {
            let _ = write!(text, "\n✅ {}", escape(&module.title));
        }

        Ok(Screen::text(text).with_keyboard(Keyboard::column([
            Button::new("▶️ Continue where I left off", Request::Resume),
            Button::new("🔄 Reset progress", Request::Reset),
        ])))
    }
}

fn start_quiz(module: ModuleId) -> Request {
    Request::Ask {
        module,
        index: 0,
        score: 0,
    }
}

/// Renders a ready outcome, or the notice for a missing or locked target.
fn render<T>(outcome: Outcome<T>, on_ready: impl FnOnce(T) -> Reply) -> Reply {
    match outcome {
        Outcome::Ready(value) => on_ready(value),
        Outcome::NotFound(missing) => {
            debug!("Request target not found: {}", missing);
            Reply::toast(not_found_notice(missing))
        }
        Outcome::Locked(module) => {
            debug!("Practice tasks of module {} are locked", module);
            Reply::alert(LOCKED_NOTICE)
        }
    }
}

fn not_found_notice(missing: Missing) -> &'static str {
    match missing {
        Missing::Module => "Module not found",
        Missing::Submodule => "Section not found",
        Missing::Page | Missing::Content => "⛔ Material not found",
        Missing::Question | Missing::AnswerOption => "This question is not available",
        Missing::Task => "No practice tasks available for this module yet",
    }
}

fn storage_failure(user: UserId, what: &str, err: &StoreError) -> Reply {
    error!("Storage failure for user {} handling {}: {}", user, what, err);
    Reply::toast(STORAGE_NOTICE)
}

fn answer_reply(feedback: AnswerFeedback) -> Reply {
    let toast = if feedback.correct {
        "✅ Correct!".to_owned()
    } else {
        truncate(
            &format!("❌ Wrong! Correct answer: {}", feedback.correct_option),
            MAX_TOAST_LEN,
        )
    };
    Reply::screen(quiz_step_screen(&feedback.next)).with_toast(toast)
}

fn quiz_step_screen(step: &QuizStep) -> Screen {
    match step {
        QuizStep::Question {
            module,
            index,
            score,
            total,
            text,
            options,
        } => {
            let buttons = options.iter().enumerate().map(|(choice, option)| {
                Button::new(
                    option.clone(),
                    Request::Answer {
                        module: *module,
                        index: *index,
                        score: *score,
                        choice,
                    },
                )
            });
            Screen::text(format!(
                "❓ Question {}/{}\n\n{}",
                index + 1,
                total,
                escape(text)
            ))
            .with_keyboard(Keyboard::column(buttons))
        }
        QuizStep::Finished(result) => result_screen(result),
    }
}

fn result_screen(result: &QuizResult) -> Screen {
    let summary = format!(
        "You answered {} of {} questions correctly.\nScore: {}%",
        result.score, result.total, result.percent
    );

    if result.passed {
        Screen::text(format!(
            "✅ <b>Quiz passed!</b>\n\n{summary}\n\n\
             Module \"{}\" is marked as completed and its practice tasks are unlocked.",
            escape(&result.title)
        ))
        .with_keyboard(Keyboard::column([
            Button::new("🔍 Practice tasks", Request::PracticeModule(result.module)),
            Button::new("◀️ Back to quizzes", Request::Quizzes),
        ]))
    } else {
        Screen::text(format!(
            "❌ <b>Quiz not passed</b>\n\n{summary}\n\n\
             You need {PASS_THRESHOLD_PERCENT}% or more to pass. Review the material and try again."
        ))
        .with_keyboard(Keyboard::column([
            Button::new("🔁 Try again", start_quiz(result.module)),
            Button::new("◀️ Back to quizzes", Request::Quizzes),
        ]))
    }
}

fn help_screen() -> Screen {
    let mut text = String::from("ℹ️ <b>How it works</b>\n\n");
    text.push_str(
        "Read the theory module by module, then take the module quiz. \
         A score of 70% or more completes the module and unlocks its practice tasks. \
         Send screenshots or capture files as practice submissions.\n\n<b>Commands</b>\n",
    );
    for (command, description) in MenuCommand::all_commands() {
        let _ = writeln!(text, "{command} - {description}");
    }
    Screen::text(text)
}

fn resources_screen() -> Screen {
    Screen::text(
        "🔗 <b>Official resources</b>\n\n\
         1. Wireshark: https://www.wireshark.org\n\
         2. Wireshark documentation: https://www.wireshark.org/docs/\n\
         3. Display filter reference: https://www.wireshark.org/docs/dfref/\n\
         4. Nmap: https://nmap.org",
    )
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::commands::reply::Toast;
    use crate::course::testing::FailingStore;
    use crate::progress::{InMemoryProgressStore, ProgressUpdate};

    fn handler(store: Arc<dyn ProgressStore>) -> RequestHandler {
        RequestHandler::new(
            Arc::new(fixtures::catalog()),
            store,
            Arc::new(fixtures::pages()),
            "images",
        )
    }

    fn screen(reply: Reply) -> Screen {
        reply.screen.expect("reply should carry a screen")
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello, World!", 5), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[tokio::test]
    async fn test_modules_screen_lists_modules() {
        let handler = handler(Arc::new(InMemoryProgressStore::new()));
        let screen = screen(handler.handle_callback(1, "mods").await);

        assert_eq!(screen.button(Request::SelectModule(1)).unwrap().text, "Basics");
        assert!(screen.button(Request::SelectModule(2)).is_some());
        assert!(screen.button(Request::Resume).is_some());
    }

    #[tokio::test]
    async fn test_page_navigation_buttons() {
        let store = InMemoryProgressStore::new();
        let handler = handler(Arc::new(store.clone()));

        let first = screen(handler.handle_callback(42, "sub:1:1").await);
        assert!(first.text.contains("Page 1.1.1"));
        assert!(first.button(Request::ViewPage(1, 1, 2)).is_some());
        assert!(first.button(Request::ViewPage(1, 1, 0)).is_none());

        let last = screen(handler.handle_callback(42, "page:1:1:2").await);
        assert!(last.button(Request::ViewPage(1, 1, 1)).is_some());
        assert!(last.button(Request::ViewPage(1, 1, 3)).is_none());
        assert!(last.button(Request::QuizIntro(1)).is_none());

        // Last page of the last section leads to the quiz
        let end = screen(handler.handle_callback(42, "page:1:2:1").await);
        assert!(end.button(Request::QuizIntro(1)).is_some());

        assert_eq!(store.get_progress(42).await.unwrap().position(), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_missing_page_is_a_notice() {
        let store = InMemoryProgressStore::new();
        let handler = handler(Arc::new(store.clone()));

        let reply = handler.handle_callback(42, "page:1:1:3").await;
        assert!(reply.screen.is_none());
        assert_eq!(
            reply.toast,
            Some(Toast {
                text: "⛔ Material not found".to_owned(),
                alert: false
            })
        );
        assert!(store.all_progress().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_callback_is_a_notice() {
        let handler = handler(Arc::new(InMemoryProgressStore::new()));
        for data in ["", "page:1:x:1", "ask:1:0:5", "practice_module_1"] {
            let reply = handler.handle_callback(1, data).await;
            assert!(reply.screen.is_none());
            assert_eq!(reply.toast.unwrap().text, MALFORMED_NOTICE);
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_a_notice() {
        let handler = handler(Arc::new(FailingStore));
        let reply = handler.handle_callback(1, "page:1:1:1").await;
        assert!(reply.screen.is_none());
        assert_eq!(reply.toast.unwrap().text, STORAGE_NOTICE);

        let reply = handler.handle_menu(1, MenuCommand::Progress).await;
        assert_eq!(reply.toast.unwrap().text, STORAGE_NOTICE);
    }

    #[tokio::test]
    async fn test_locked_practice_is_an_alert() {
        let handler = handler(Arc::new(InMemoryProgressStore::new()));
        let reply = handler.handle_callback(1, "pmod:1").await;
        assert!(reply.screen.is_none());
        assert!(reply.toast.unwrap().alert);

        // The task detail is gated as well
        let reply = handler.handle_callback(1, "ptask:1:0").await;
        assert!(reply.toast.unwrap().alert);
    }

    #[tokio::test]
    async fn test_unlocked_practice_shows_tasks() {
        let store = InMemoryProgressStore::new();
        store.update_progress(1, ProgressUpdate::complete(1)).await.unwrap();
        let handler = handler(Arc::new(store));

        let list = screen(handler.handle_callback(1, "pmod:1").await);
        assert_eq!(
            list.button(Request::PracticeTask(1, 0)).unwrap().text,
            "Task 1: First capture"
        );

        let detail = screen(handler.handle_callback(1, "ptask:1:0").await);
        assert!(detail.text.contains("First capture"));
        assert!(detail.text.contains("A pcapng file"));
    }

    #[tokio::test]
    async fn test_failed_quiz_offers_retry() {
        let store = InMemoryProgressStore::new();
        let handler = handler(Arc::new(store.clone()));

        // Two right, two wrong on the 4-question module
        handler.handle_callback(42, "ans:1:0:0:0").await;
        handler.handle_callback(42, "ans:1:1:1:0").await;
        handler.handle_callback(42, "ans:1:2:2:1").await;
        let reply = handler.handle_callback(42, "ans:1:3:2:1").await;

        assert!(reply.toast.as_ref().unwrap().text.starts_with("❌ Wrong!"));
        let result = screen(reply);
        assert!(result.text.contains("Score: 50%"));
        assert!(result.button(start_quiz(1)).is_some());
        assert!(store.get_progress(42).await.unwrap().completed_modules.is_empty());
    }

    #[tokio::test]
    async fn test_passed_quiz_unlocks_practice() {
        let store = InMemoryProgressStore::new();
        let handler = handler(Arc::new(store.clone()));

        handler.handle_callback(42, "ans:1:0:0:0").await;
        handler.handle_callback(42, "ans:1:1:1:0").await;
        handler.handle_callback(42, "ans:1:2:2:0").await;
        let reply = handler.handle_callback(42, "ans:1:3:3:1").await;

        let result = screen(reply);
        assert!(result.text.contains("Score: 75%"));
        assert!(result.button(Request::PracticeModule(1)).is_some());
        assert!(store.get_progress(42).await.unwrap().has_completed(1));
    }

    #[tokio::test]
    async fn test_reset_flow() {
        let store = InMemoryProgressStore::new();
        store.update_progress(5, ProgressUpdate::complete(2)).await.unwrap();
        let handler = handler(Arc::new(store.clone()));

        let confirm = screen(handler.handle_menu(5, MenuCommand::Reset).await);
        assert!(confirm.button(Request::ResetConfirm).is_some());
        assert!(store.get_progress(5).await.unwrap().has_completed(2));

        handler.handle_callback(5, "reset_ok").await;
        let progress = store.get_progress(5).await.unwrap();
        assert_eq!(progress.position(), (1, 1, 1));
        assert!(progress.completed_modules.is_empty());
    }

    #[tokio::test]
    async fn test_text_commands() {
        let handler = handler(Arc::new(InMemoryProgressStore::new()));

        let start = screen(handler.try_handle_text(1, "/start").await.unwrap());
        assert!(matches!(start.keyboard, Some(Keyboard::Menu(_))));

        let theory = screen(handler.try_handle_text(1, "📚 Theory").await.unwrap());
        assert!(theory.button(Request::SelectModule(1)).is_some());

        assert!(handler.try_handle_text(1, "just chatting").await.is_none());
    }

    #[tokio::test]
    async fn test_progress_screen() {
        let store = InMemoryProgressStore::new();
        store.update_progress(3, ProgressUpdate::complete(1)).await.unwrap();
        let handler = handler(Arc::new(store));

        let progress = screen(handler.handle_menu(3, MenuCommand::Progress).await);
        assert!(progress.text.contains("Completed modules: 1/2"));
        assert!(progress.text.contains("✅ Basics"));
    }
}

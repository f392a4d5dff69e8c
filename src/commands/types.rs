//! Request types parsed from callback data and menu messages.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::catalog::{ModuleId, SubmoduleId};

/// Telegram's limit on callback data, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// An inline-button action. Encoded as `action[:n]*` in callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// List modules for theory.
    Modules,

    /// Show the submodules of a module.
    SelectModule(ModuleId),

    /// Open the first page of a submodule.
    SelectSubmodule(ModuleId, SubmoduleId),

    /// Open a specific page.
    ViewPage(ModuleId, SubmoduleId, u32),

    /// Reopen the last viewed page.
    Resume,

    /// List quizzes.
    Quizzes,

    /// Show a quiz's intro screen.
    QuizIntro(ModuleId),

    /// Present question `index` with the running `score`.
    Ask {
        module: ModuleId,
        index: usize,
        score: usize,
    },

    /// Answer question `index` with option `choice`.
    Answer {
        module: ModuleId,
        index: usize,
        score: usize,
        choice: usize,
    },

    /// List modules for practice.
    PracticeMenu,

    /// List practice tasks of a module.
    PracticeModule(ModuleId),

    /// Show one practice task.
    PracticeTask(ModuleId, usize),

    /// Ask for confirmation before resetting progress.
    Reset,

    /// Reset progress.
    ResetConfirm,
}

/// Errors for callback data that cannot be turned into a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Empty callback data")]
    Empty,

    #[error("Unknown action: '{0}'")]
    UnknownAction(String),

    #[error("Action '{action}' takes {expected} field(s), got {found}")]
    FieldCount {
        action: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Action '{action}' has a non-integer field: '{field}'")]
    InvalidField { action: &'static str, field: String },

    #[error("Score {score} exceeds question index {index}")]
    ScoreAboveIndex { score: usize, index: usize },
}

impl Request {
    /// Returns the action name used in callback data.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Modules => "mods",
            Self::SelectModule(_) => "mod",
            Self::SelectSubmodule(..) => "sub",
            Self::ViewPage(..) => "page",
            Self::Resume => "resume",
            Self::Quizzes => "quizzes",
            Self::QuizIntro(_) => "quiz",
            Self::Ask { .. } => "ask",
            Self::Answer { .. } => "ans",
            Self::PracticeMenu => "prac",
            Self::PracticeModule(_) => "pmod",
            Self::PracticeTask(..) => "ptask",
            Self::Reset => "reset",
            Self::ResetConfirm => "reset_ok",
        }
    }

    /// Encodes the request as callback data.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses callback data.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown actions, a wrong number of fields,
    /// non-integer fields, or a quiz score above the question index.
    pub fn parse(data: &str) -> Result<Self, RequestError> {
        let data = data.trim();
        if data.is_empty() {
            return Err(RequestError::Empty);
        }

        let mut parts = data.split(':');
        let action = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        let request = match action {
            "mods" => {
                expect_fields("mods", &fields, 0)?;
                Self::Modules
            }
            "mod" => {
                let [m] = numbers("mod", &fields)?;
                Self::SelectModule(m)
            }
            "sub" => {
                let [m, s] = numbers("sub", &fields)?;
                Self::SelectSubmodule(m, s)
            }
            "page" => {
                let [m, s, p] = numbers("page", &fields)?;
                Self::ViewPage(m, s, p)
            }
            "resume" => {
                expect_fields("resume", &fields, 0)?;
                Self::Resume
            }
            "quizzes" => {
                expect_fields("quizzes", &fields, 0)?;
                Self::Quizzes
            }
            "quiz" => {
                let [m] = numbers("quiz", &fields)?;
                Self::QuizIntro(m)
            }
            "ask" => {
                expect_fields("ask", &fields, 3)?;
                let [module] = numbers("ask", &fields[..1])?;
                let [index, score] = numbers("ask", &fields[1..])?;
                check_score(index, score)?;
                Self::Ask {
                    module,
                    index,
                    score,
                }
            }
            "ans" => {
                expect_fields("ans", &fields, 4)?;
                let [module] = numbers("ans", &fields[..1])?;
                let [index, score, choice] = numbers("ans", &fields[1..])?;
                check_score(index, score)?;
                Self::Answer {
                    module,
                    index,
                    score,
                    choice,
                }
            }
            "prac" => {
                expect_fields("prac", &fields, 0)?;
                Self::PracticeMenu
            }
            "pmod" => {
                let [m] = numbers("pmod", &fields)?;
                Self::PracticeModule(m)
            }
            "ptask" => {
                expect_fields("ptask", &fields, 2)?;
                let [m] = numbers("ptask", &fields[..1])?;
                let [t] = numbers("ptask", &fields[1..])?;
                Self::PracticeTask(m, t)
            }
            "reset" => {
                expect_fields("reset", &fields, 0)?;
                Self::Reset
            }
            "reset_ok" => {
                expect_fields("reset_ok", &fields, 0)?;
                Self::ResetConfirm
            }
            other => return Err(RequestError::UnknownAction(other.to_owned())),
        };

        Ok(request)
    }
}

fn expect_fields(action: &'static str, fields: &[&str], expected: usize) -> Result<(), RequestError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(RequestError::FieldCount {
            action,
            expected,
            found: fields.len(),
        })
    }
}

/// Parses exactly `N` decimal fields.
fn numbers<T: FromStr + Copy + Default, const N: usize>(
    action: &'static str,
    fields: &[&str],
) -> Result<[T; N], RequestError> {
    expect_fields(action, fields, N)?;

    let mut out = [T::default(); N];
    for (slot, field) in out.iter_mut().zip(fields) {
        // `parse` accepts a leading '+', tokens never carry one
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RequestError::InvalidField {
                action,
                field: (*field).to_owned(),
            });
        }
        *slot = field.parse().map_err(|_| RequestError::InvalidField {
            action,
            field: (*field).to_owned(),
        })?;
    }
    Ok(out)
}

const fn check_score(index: usize, score: usize) -> Result<(), RequestError> {
    if score > index {
        Err(RequestError::ScoreAboveIndex { score, index })
    } else {
        Ok(())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = self.action();
        match self {
            Self::SelectModule(m) | Self::QuizIntro(m) | Self::PracticeModule(m) => {
                write!(f, "{action}:{m}")
            }
            Self::SelectSubmodule(m, s) => write!(f, "{action}:{m}:{s}"),
            Self::ViewPage(m, s, p) => write!(f, "{action}:{m}:{s}:{p}"),
            Self::Ask {
                module,
                index,
                score,
            } => write!(f, "{action}:{module}:{index}:{score}"),
            Self::Answer {
                module,
                index,
                score,
                choice,
            } => write!(f, "{action}:{module}:{index}:{score}:{choice}"),
            Self::PracticeTask(m, t) => write!(f, "{action}:{m}:{t}"),
            Self::Modules
            | Self::Resume
            | Self::Quizzes
            | Self::PracticeMenu
            | Self::Reset
            | Self::ResetConfirm => f.write_str(action),
        }
    }
}

/// Commands and reply-keyboard buttons sent as plain messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Start,
    Help,
    Progress,
    Reset,
    Theory,
    Practice,
    Quizzes,
    Resources,
}

impl MenuCommand {
    /// Parses a slash command or a main-menu button label.
    ///
    /// Returns `None` if the text is neither.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(command) = text.strip_prefix('/') {
            // "/start@course_bot payload" -> "start"
            let name = command
                .split(char::is_whitespace)
                .next()
                .and_then(|c| c.split('@').next())
                .unwrap_or_default()
                .to_lowercase();

            return match name.as_str() {
                "start" | "menu" => Some(Self::Start),
                "help" | "h" => Some(Self::Help),
                "progress" | "status" => Some(Self::Progress),
                "reset" => Some(Self::Reset),
                "theory" => Some(Self::Theory),
                "practice" => Some(Self::Practice),
                "quiz" | "quizzes" | "tests" => Some(Self::Quizzes),
                "resources" => Some(Self::Resources),
                _ => None,
            };
        }

        Self::MENU
            .into_iter()
            .flatten()
            .find(|command| command.label().is_some_and(|label| label == text))
            .copied()
    }

    /// Main-menu button label, for commands that have one.
    #[must_use]
    pub const fn label(&self) -> Option<&'static str> {
        match self {
            Self::Theory => Some("📚 Theory"),
            Self::Practice => Some("🔍 Practice"),
            Self::Quizzes => Some("📝 Quizzes"),
            Self::Resources => Some("🔗 Resources"),
            Self::Progress => Some("📊 Progress"),
            Self::Start | Self::Help | Self::Reset => None,
        }
    }

    /// Layout of the main reply keyboard.
    pub const MENU: [&'static [Self]; 3] = [
        &[Self::Theory, Self::Practice],
        &[Self::Quizzes, Self::Resources],
        &[Self::Progress],
    ];

    /// Returns all slash commands with their descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/start", "Show the main menu"),
            ("/progress", "Show where you are in the course"),
            ("/reset", "Start the course over"),
            ("/help", "Show this help message"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parse_agree() {
        let requests = [
            Request::Modules,
            Request::SelectModule(3),
            Request::SelectSubmodule(2, 4),
            Request::ViewPage(1, 5, 3),
            Request::Resume,
            Request::Quizzes,
            Request::QuizIntro(5),
            Request::Ask {
                module: 2,
                index: 3,
                score: 1,
            },
            Request::Answer {
                module: 4,
                index: 2,
                score: 2,
                choice: 3,
            },
            Request::PracticeMenu,
            Request::PracticeModule(1),
            Request::PracticeTask(1, 0),
            Request::Reset,
            Request::ResetConfirm,
        ];

        for request in requests {
            let token = request.encode();
            assert!(token.len() <= MAX_CALLBACK_DATA_LEN, "{token} too long");
            assert_eq!(Request::parse(&token), Ok(request), "token {token}");
        }
    }

    #[test]
    fn test_encoding_format() {
        assert_eq!(Request::ViewPage(1, 2, 3).encode(), "page:1:2:3");
        assert_eq!(
            Request::Ask {
                module: 1,
                index: 0,
                score: 0
            }
            .encode(),
            "ask:1:0:0"
        );
        assert_eq!(Request::ResetConfirm.encode(), "reset_ok");
    }

    #[test]
    fn test_large_values_fit_callback_limit() {
        let token = Request::Answer {
            module: u32::MAX,
            index: 9_999_999,
            score: 9_999_999,
            choice: 9_999_999,
        }
        .encode();
        assert!(token.len() <= MAX_CALLBACK_DATA_LEN);
    }

    #[test]
    fn test_parse_unknown_action() {
        assert_eq!(
            Request::parse("fly:1"),
            Err(RequestError::UnknownAction("fly".to_owned()))
        );
        assert_eq!(Request::parse("   "), Err(RequestError::Empty));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert!(matches!(
            Request::parse("page:1:2"),
            Err(RequestError::FieldCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            Request::parse("mods:1"),
            Err(RequestError::FieldCount { .. })
        ));
        assert!(matches!(
            Request::parse("ans:1:0:0"),
            Err(RequestError::FieldCount { .. })
        ));
        assert!(matches!(
            Request::parse("ask"),
            Err(RequestError::FieldCount { .. })
        ));
    }

    #[test]
    fn test_parse_non_integer_fields() {
        for token in ["mod:x", "sub:1:", "page:1:2:-3", "ptask:1:+2", "ask:1:0:1.5"] {
            assert!(
                matches!(Request::parse(token), Err(RequestError::InvalidField { .. })),
                "{token} should be rejected"
            );
        }
        assert!(matches!(
            Request::parse("mod:99999999999"),
            Err(RequestError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_parse_score_above_index() {
        assert_eq!(
            Request::parse("ask:1:2:3"),
            Err(RequestError::ScoreAboveIndex { score: 3, index: 2 })
        );
        assert!(Request::parse("ans:1:0:1:0").is_err());
    }

    #[test]
    fn test_menu_commands() {
        assert_eq!(MenuCommand::parse("/start"), Some(MenuCommand::Start));
        assert_eq!(
            MenuCommand::parse("/start@course_bot"),
            Some(MenuCommand::Start)
        );
        assert_eq!(MenuCommand::parse("/HELP"), Some(MenuCommand::Help));
        assert_eq!(MenuCommand::parse("/progress"), Some(MenuCommand::Progress));
        assert_eq!(MenuCommand::parse("/reset now"), Some(MenuCommand::Reset));
        assert_eq!(MenuCommand::parse("/unknown"), None);
    }

    #[test]
    fn test_menu_labels() {
        assert_eq!(MenuCommand::parse("📚 Theory"), Some(MenuCommand::Theory));
        assert_eq!(MenuCommand::parse(" 🔍 Practice "), Some(MenuCommand::Practice));
        assert_eq!(MenuCommand::parse("📝 Quizzes"), Some(MenuCommand::Quizzes));
        assert_eq!(MenuCommand::parse("🔗 Resources"), Some(MenuCommand::Resources));
        assert_eq!(MenuCommand::parse("📊 Progress"), Some(MenuCommand::Progress));
        assert_eq!(MenuCommand::parse("hello"), None);
    }

    #[test]
    fn test_every_menu_button_parses_back() {
        for command in MenuCommand::MENU.into_iter().flatten() {
            let label = command.label().unwrap();
            assert_eq!(MenuCommand::parse(label), Some(*command));
        }
    }
}

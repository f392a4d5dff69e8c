//! Transport-neutral replies produced by the request handler.

use std::path::PathBuf;

use super::types::{MenuCommand, Request};

/// An inline button that sends a request back when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub request: Request,
}

impl Button {
    #[must_use]
    pub fn new(text: impl Into<String>, request: Request) -> Self {
        Self {
            text: text.into(),
            request,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons attached to the message, one inner vector per row.
    Inline(Vec<Vec<Button>>),

    /// Persistent reply keyboard with text buttons.
    Menu(Vec<Vec<String>>),
}

impl Keyboard {
    /// One button per row.
    #[must_use]
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self::Inline(buttons.into_iter().map(|b| vec![b]).collect())
    }

    /// The main reply keyboard.
    #[must_use]
    pub fn main_menu() -> Self {
        Self::Menu(
            MenuCommand::MENU
                .iter()
                .map(|row| row.iter().filter_map(MenuCommand::label).map(str::to_owned).collect())
                .collect(),
        )
    }

    /// Every inline button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        let rows: &[Vec<Button>] = match self {
            Self::Inline(rows) => rows,
            Self::Menu(_) => &[],
        };
        rows.iter().flatten()
    }
}

/// A message to show: HTML text, an optional image and an optional keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub image: Option<PathBuf>,
    pub keyboard: Option<Keyboard>,
}

impl Screen {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            keyboard: None,
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Option<PathBuf>) -> Self {
        self.image = image;
        self
    }

    /// Finds an inline button by its request.
    #[must_use]
    pub fn button(&self, request: Request) -> Option<&Button> {
        self.keyboard
            .as_ref()
            .and_then(|k| k.buttons().find(|b| b.request == request))
    }
}

/// Short notice shown when a button is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,

    /// Show as a modal alert instead of a transient notice.
    pub alert: bool,
}

/// What to send back for one incoming event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub toast: Option<Toast>,
    pub screen: Option<Screen>,
}

impl Reply {
    #[must_use]
    pub fn screen(screen: Screen) -> Self {
        Self {
            toast: None,
            screen: Some(screen),
        }
    }

    #[must_use]
    pub fn toast(text: impl Into<String>) -> Self {
        Self {
            toast: Some(Toast {
                text: text.into(),
                alert: false,
            }),
            screen: None,
        }
    }

    #[must_use]
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            toast: Some(Toast {
                text: text.into(),
                alert: true,
            }),
            screen: None,
        }
    }

    #[must_use]
    pub fn with_toast(mut self, text: impl Into<String>) -> Self {
        self.toast = Some(Toast {
            text: text.into(),
            alert: false,
        });
        self
    }
}

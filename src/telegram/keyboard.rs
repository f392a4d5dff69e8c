//! Conversion of reply keyboards into Bot API markup.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup,
};

use crate::commands::{Button, Keyboard};

/// Inline keyboard with one callback button per [`Button`].
#[must_use]
pub fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.clone(), b.request.encode()))
            .collect::<Vec<_>>()
    }))
}

/// Markup for a message being sent.
#[must_use]
pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::Menu(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                rows.iter()
                    .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>()),
            )
            .resize_keyboard(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::commands::Request;

    #[test]
    fn test_inline_buttons_carry_encoded_requests() {
        let markup = inline_markup(&[
            vec![
                Button::new("Back", Request::ViewPage(1, 1, 1)),
                Button::new("Next", Request::ViewPage(1, 1, 3)),
            ],
            vec![Button::new("Topics", Request::SelectModule(1))],
        ]);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        let button = &markup.inline_keyboard[0][1];
        assert_eq!(button.text, "Next");
        assert_eq!(
            button.kind,
            InlineKeyboardButtonKind::CallbackData("page:1:1:3".to_owned())
        );
    }

    #[test]
    fn test_main_menu_is_reply_keyboard() {
        let ReplyMarkup::Keyboard(markup) = reply_markup(&Keyboard::main_menu()) else {
            panic!("expected a reply keyboard");
        };
        assert_eq!(markup.keyboard.len(), 3);
        assert_eq!(markup.keyboard[0][0].text, "📚 Theory");
    }
}

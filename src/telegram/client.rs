//! Bot API client: update dispatch and screen delivery.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, InputFile, ParseMode, User};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::keyboard::{inline_markup, reply_markup};
use crate::commands::{Keyboard, MenuCommand, RequestHandler, Screen};
use crate::config::TelegramConfig;
use crate::course::Submission;

/// Errors that can occur while talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Bot API request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("User id {0} is out of range for the progress store")]
    InvalidUser(u64),
}

type HandlerResult = Result<(), TelegramError>;

/// The running bot: a Bot API client plus the request handler.
pub struct CourseBot {
    bot: Bot,
    handler: Arc<RequestHandler>,
}

impl CourseBot {
    #[must_use]
    pub fn new(config: &TelegramConfig, handler: Arc<RequestHandler>) -> Self {
        Self {
            bot: Bot::new(config.bot_token.clone()),
            handler,
        }
    }

    /// Publishes the slash commands shown in the client's command menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the Bot API rejects the request.
    pub async fn register_commands(&self) -> Result<(), TelegramError> {
        let commands = MenuCommand::all_commands()
            .into_iter()
            .map(|(command, description)| BotCommand::new(command.trim_start_matches('/'), description));
        self.bot.set_my_commands(commands).await?;
        debug!("Bot commands registered");
        Ok(())
    }

    /// Processes updates until Ctrl-C.
    ///
    /// Updates from one chat are handled one at a time, in order.
    pub async fn run(self) {
        let schema = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        info!("Listening for updates...");
        Dispatcher::builder(self.bot, schema)
            .dependencies(dptree::deps![self.handler])
            .default_handler(|update| async move {
                debug!("Ignoring update {:?}", update.id);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        info!("Dispatcher stopped");
    }
}

fn progress_user(user: &User) -> Result<crate::progress::UserId, TelegramError> {
    i64::try_from(user.id.0).map_err(|_| TelegramError::InvalidUser(user.id.0))
}

async fn on_message(bot: Bot, msg: Message, handler: Arc<RequestHandler>) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = progress_user(user)?;

    let reply = if msg.document().is_some() {
        Some(handler.handle_submission(user_id, Submission::Document))
    } else if msg.photo().is_some() {
        Some(handler.handle_submission(user_id, Submission::Screenshot))
    } else if let Some(text) = msg.text() {
        handler.try_handle_text(user_id, text).await
    } else {
        None
    };

    let Some(screen) = reply.and_then(|r| r.screen) else {
        debug!("No reply for message {:?} from user {}", msg.id, user_id);
        return Ok(());
    };
    send_screen(&bot, msg.chat.id, &screen).await
}

async fn on_callback(bot: Bot, query: CallbackQuery, handler: Arc<RequestHandler>) -> HandlerResult {
    let user_id = progress_user(&query.from)?;
    let data = query.data.as_deref().unwrap_or_default();
    let reply = handler.handle_callback(user_id, data).await;

    // Always answered, so the client stops showing a spinner
    let mut answer = bot.answer_callback_query(query.id.clone());
    if let Some(toast) = &reply.toast {
        answer = answer.text(toast.text.clone()).show_alert(toast.alert);
    }

    let deliver = async {
        let Some(screen) = &reply.screen else {
            return Ok(());
        };
        match query.regular_message() {
            Some(message) => replace_screen(&bot, message, screen).await,
            None => send_screen(&bot, ChatId::from(query.from.id), screen).await,
        }
    };
    answer_then_deliver(user_id, answer, deliver).await
}

/// Answers a callback query, then delivers its screen.
///
/// A failed answer (a query that went stale while the store was busy) is
/// logged and the screen is still delivered.
async fn answer_then_deliver<A, T, E, D>(
    user_id: crate::progress::UserId,
    answer: A,
    deliver: D,
) -> HandlerResult
where
    A: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
    D: Future<Output = HandlerResult>,
{
    if let Err(e) = answer.await {
        warn!("Failed to answer callback from user {}: {}", user_id, e);
    }
    deliver.await
}

/// Shows a screen in place of the message whose button was pressed.
///
/// Edits the message when possible. Screens with an image or a reply
/// keyboard, and messages that cannot be edited, are sent anew and the old
/// message is deleted.
async fn replace_screen(bot: &Bot, message: &Message, screen: &Screen) -> HandlerResult {
    let editable = screen.image.is_none() && !matches!(screen.keyboard, Some(Keyboard::Menu(_)));

    if editable {
        let mut edit = bot
            .edit_message_text(message.chat.id, message.id, screen.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(Keyboard::Inline(rows)) = &screen.keyboard {
            edit = edit.reply_markup(inline_markup(rows));
        }
        match edit.await {
            Ok(_) => return Ok(()),
            Err(e) => debug!("Could not edit message {:?}: {}, sending a new one", message.id, e),
        }
    }

    send_screen(bot, message.chat.id, screen).await?;
    if let Err(e) = bot.delete_message(message.chat.id, message.id).await {
        debug!("Could not delete message {:?}: {}", message.id, e);
    }
    Ok(())
}

/// Sends a screen as a new message. An image that cannot be sent falls back to text.
async fn send_screen(bot: &Bot, chat: ChatId, screen: &Screen) -> HandlerResult {
    let markup = screen.keyboard.as_ref().map(reply_markup);

    if let Some(path) = &screen.image {
        let mut photo = bot
            .send_photo(chat, InputFile::file(path.clone()))
            .caption(screen.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            photo = photo.reply_markup(markup);
        }
        match photo.await {
            Ok(_) => return Ok(()),
            Err(e) => warn!("Image send failed for {}: {}", path.display(), e),
        }
    }

    let mut message = bot
        .send_message(chat, screen.text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(markup) = markup {
        message = message.reply_markup(markup);
    }
    message.await?;
    Ok(())
}

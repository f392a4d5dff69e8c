//! Telegram frontend.
//!
//! Receives updates through the Bot API, hands them to the request handler
//! and delivers the replies as messages, edits and callback answers.

mod client;
mod keyboard;

pub use client::{CourseBot, TelegramError};
pub use keyboard::{inline_markup, reply_markup};

//! Request handling module.
//!
//! Turns callback data and menu messages into typed requests, runs them
//! against the course logic and renders transport-neutral replies.

mod handler;
mod reply;
mod types;

pub use handler::RequestHandler;
pub use reply::{Button, Keyboard, Reply, Screen, Toast};
pub use types::{MAX_CALLBACK_DATA_LEN, MenuCommand, Request, RequestError};

//! Wireshark Course Bot Library
//!
//! A Telegram bot that teaches network analysis with Wireshark.
//!
//! This crate provides the core functionality for:
//! - Loading and validating the course catalog and its pages
//! - Tracking each user's position and completed modules in `SQLite`
//! - Navigating theory pages, running quizzes and gating practice tasks
//! - Serving it all through inline keyboards via the Telegram Bot API

pub mod catalog;
pub mod commands;
pub mod config;
pub mod course;
pub mod progress;
pub mod telegram;

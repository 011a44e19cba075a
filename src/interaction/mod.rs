//! Event handling and user interactions for relay-bot.
//!
//! This module provides functionality for handling inbound Slack deliveries:
//! - The HTTP boundary: handshake, dedup, and status replies
//! - The app mention workflow: routing to weather or completion and replying
//! - Keyword intent classification

pub mod app_mention;
pub mod intent;
pub mod webhook;

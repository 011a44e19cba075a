//! Core components, types, and utilities for the relay-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Fixed directives and user-facing replies.
//! - Common types, errors, and result handling.
//! - An injectable wall clock.

pub mod clock;
pub mod config;
pub mod error;
pub mod prompts;
pub mod types;

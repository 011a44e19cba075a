//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by the relay-bot:
//! - Chat services (e.g., Slack)
//! - Dedup caches (in-process, SurrealDB)
//! - LLM services (e.g., any OpenAI-compatible completion API)
//! - Weather services (e.g., Yahoo! JAPAN YOLP)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod dedup;
pub mod llm;
pub mod weather;

//! Entity pipeline worker.
//!
//! Lexes post captions into hashtags, mentions and URLs, renders the
//! linkified HTML-safe caption, persists normalized entity rows and emits a
//! notification event per freshly created mention.

pub mod config;
pub mod consumers;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;

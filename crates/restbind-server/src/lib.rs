//! restbind HTTP Server Library
//!
//! Hosts an in-memory notes resource through the binder; exposed as a
//! library so the router can be exercised in tests.

pub mod api;
pub mod config;
pub mod notes;

//! GitHub push notifier - tunnels a local webhook endpoint through a public
//! relay and surfaces push events as desktop notifications.
//!
//! This library provides the core lifecycle: tunnel supervision, webhook
//! registration, signed-callback serving, and notification dispatch.

pub mod config;
pub mod github;
pub mod notify;
pub mod orchestrator;
pub mod server;
pub mod tunnel;
pub mod types;
pub mod webhook;

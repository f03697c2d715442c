//! GitHub API access for webhook registration.
//!
//! - `client`: octocrab wrapper scoped to the configured repository.
//! - `error`: registration error type preserving GitHub's diagnostics.
//! - `hooks`: create/delete operations against the repository hooks API.

pub mod client;
pub mod error;
pub mod hooks;

pub use client::GithubClient;
pub use error::RegistrationError;
pub use hooks::{deregister, register, WebhookRegistration};

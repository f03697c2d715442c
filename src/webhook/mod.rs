//! Inbound webhook handling.
//!
//! Two concerns live here:
//! - `signature`: HMAC-SHA256 verification of the `X-Hub-Signature-256`
//!   header, the first gate every callback passes through.
//! - `payload`: partial parsing of push-event bodies and notification
//!   building.

pub mod payload;
pub mod signature;

pub use payload::PushEvent;
pub use signature::{compute_signature, format_signature_header, verify};

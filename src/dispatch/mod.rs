//! Webhook dispatch.
//!
//! Sends the analysis request to the remote workflow and hands back the
//! parsed JSON body, or a failure tagged by kind.

pub mod client;

pub use client::{DispatchError, WebhookClient};

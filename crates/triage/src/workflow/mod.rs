//! Send-workflow integration
//!
//! The actual delivery of a reply is done by an external automation
//! workflow reached through a webhook. This module provides:
//! - The [`SendWorkflow`] trait, the seam used by the draft actions
//! - [`WebhookClient`], the HTTP implementation

mod webhook;

pub use webhook::{DispatchError, SendRequest, SendWorkflow, WebhookClient};

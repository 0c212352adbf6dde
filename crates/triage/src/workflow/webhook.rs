//! Webhook client for the external send-workflow

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;

use crate::models::EmailId;

/// Body posted to the send-workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendRequest {
    /// Reply to dispatch
    pub id: EmailId,
    /// Anchor email of the reply's thread, when it could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_email_id: Option<EmailId>,
}

/// Failure to hand a reply to the send-workflow
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("send workflow rejected reply {id} with HTTP {status}")]
    Status { id: String, status: u16 },
    #[error("send workflow unreachable for reply {id}: {reason}")]
    Transport { id: String, reason: String },
}

/// External workflow that performs the actual email dispatch
pub trait SendWorkflow: Send + Sync {
    /// Ask the workflow to send a reply; `Ok` means it accepted the request
    fn dispatch(&self, request: &SendRequest) -> Result<()>;
}

/// Send-workflow reached over an HTTP webhook
pub struct WebhookClient {
    agent: ureq::Agent,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SendWorkflow for WebhookClient {
    fn dispatch(&self, request: &SendRequest) -> Result<()> {
        debug!("POST {} for reply {}", self.url, request.id);

        match self.agent.post(&self.url).send_json(request) {
            Ok(response) if response.status().is_success() => {
                info!("Send workflow accepted reply {}", request.id);
                Ok(())
            }
            Ok(response) => Err(DispatchError::Status {
                id: request.id.to_string(),
                status: response.status().as_u16(),
            }
            .into()),
            Err(ureq::Error::StatusCode(status)) => Err(DispatchError::Status {
                id: request.id.to_string(),
                status,
            }
            .into()),
            Err(e) => Err(DispatchError::Transport {
                id: request.id.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

//! Action handler for draft replies
//!
//! Coordinates between the row storage service and the send-workflow.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use crate::models::{Email, EmailId};
use crate::notify::{Notice, Notifier};
use crate::query::assemble_threads;
use crate::storage::{EmailPatch, TriageStore};
use crate::workflow::{SendRequest, SendWorkflow};

/// Why a draft action did not complete
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("email {id} not found")]
    NotFound { id: String },
    #[error("email {id} is not a draft")]
    NotADraft { id: String },
    #[error("draft {id} was rejected; validate it before sending")]
    Rejected { id: String },
    #[error("could not load email {id}: {reason}")]
    Lookup { id: String, reason: String },
    #[error("failed to update draft {id}: {reason}")]
    DraftUpdate { id: String, reason: String },
    #[error("failed to send reply {id}: {reason}")]
    Dispatch { id: String, reason: String },
    /// The workflow sent the reply but storage still shows a draft
    #[error("reply {id} was sent but its status could not be recorded: {reason}")]
    DispatchedButUnrecorded { id: String, reason: String },
}

/// Result of a successful send
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// The reply as stored after the status change
    pub reply: Email,
    /// Anchor email of the reply's thread, if it was resolved
    pub original_email_id: Option<EmailId>,
}

/// Handler for draft actions: edit, validate and send
///
/// Sending happens in up to three steps:
/// 1. Write the edited body, when it changed
/// 2. Hand the reply to the send-workflow
/// 3. Record `sent` status and timestamps
///
/// A failure stops the sequence and the draft stays a draft. The steps are
/// not transactional: if step 3 fails after step 2 succeeded, the email went
/// out but storage still shows a draft, which is reported as
/// [`ActionError::DispatchedButUnrecorded`].
pub struct ActionHandler {
    store: Arc<dyn TriageStore>,
    workflow: Arc<dyn SendWorkflow>,
    notifier: Arc<dyn Notifier>,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(
        store: Arc<dyn TriageStore>,
        workflow: Arc<dyn SendWorkflow>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            workflow,
            notifier,
        }
    }

    /// Rewrite the body of a draft reply
    ///
    /// Returns the stored row. Nothing is retried on failure.
    pub fn update_draft(&self, id: &EmailId, body: &str) -> Result<Email> {
        self.require_draft(id)?;

        match self.store.update_email(id, &EmailPatch::body(body)) {
            Ok(updated) => {
                info!("Updated draft {}", id);
                self.notifier.notify(Notice::success("Draft saved"));
                Ok(updated)
            }
            Err(e) => {
                self.notifier.notify(Notice::error("Failed to save draft"));
                Err(ActionError::DraftUpdate {
                    id: id.to_string(),
                    reason: format!("{:#}", e),
                }
                .into())
            }
        }
    }

    /// Validate a draft reply and send it through the send-workflow
    ///
    /// `edited_body` is written first when it differs from the stored body.
    pub fn validate_and_send(&self, id: &EmailId, edited_body: Option<&str>) -> Result<SendReceipt> {
        let draft = self.require_draft(id)?;

        if let Some(body) = edited_body
            && body != draft.body_text()
        {
            self.update_draft(id, body)?;
        }

        let original_email_id = self.resolve_original(&draft);
        let request = SendRequest {
            id: id.clone(),
            original_email_id: original_email_id.clone(),
        };

        if let Err(e) = self.workflow.dispatch(&request) {
            self.notifier.notify(Notice::error("Failed to send reply"));
            return Err(ActionError::Dispatch {
                id: id.to_string(),
                reason: format!("{:#}", e),
            }
            .into());
        }

        let reply = match self.store.update_email(id, &EmailPatch::sent(Utc::now())) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Reply {} dispatched but status update failed: {:#}", id, e);
                self.notifier
                    .notify(Notice::error("Reply sent, but failed to update reply status"));
                return Err(ActionError::DispatchedButUnrecorded {
                    id: id.to_string(),
                    reason: format!("{:#}", e),
                }
                .into());
            }
        };

        info!("Sent reply {}", id);
        self.notifier.notify(Notice::success("Reply sent successfully"));
        Ok(SendReceipt {
            reply,
            original_email_id,
        })
    }

    /// Load an email and make sure it is still a draft
    fn require_draft(&self, id: &EmailId) -> Result<Email> {
        let email = match self.store.get_email(id) {
            Ok(Some(email)) => email,
            Ok(None) => {
                self.notifier.notify(Notice::error("Reply not found"));
                return Err(ActionError::NotFound { id: id.to_string() }.into());
            }
            Err(e) => {
                self.notifier.notify(Notice::error("Failed to load reply"));
                return Err(ActionError::Lookup {
                    id: id.to_string(),
                    reason: format!("{:#}", e),
                }
                .into());
            }
        };

        if !email.is_draft() {
            self.notifier
                .notify(Notice::warning("This reply has already been sent"));
            return Err(ActionError::NotADraft { id: id.to_string() }.into());
        }
        Ok(email)
    }

    /// Anchor email of the draft's thread, other than the draft itself
    fn resolve_original(&self, draft: &Email) -> Option<EmailId> {
        let thread_id = draft.thread()?;
        match self.store.list_thread_emails(thread_id) {
            Ok(rows) => assemble_threads(rows)
                .into_iter()
                .next()
                .map(|t| t.original_email.id)
                .filter(|anchor| *anchor != draft.id),
            Err(e) => {
                warn!(
                    "Could not resolve original email for {}: {:#}",
                    draft.id, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DraftStatus, Role};
    use crate::notify::{NoticeBoard, NoticeLevel};
    use crate::storage::InMemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWorkflow {
        requests: Mutex<Vec<SendRequest>>,
        fail: bool,
    }

    impl SendWorkflow for RecordingWorkflow {
        fn dispatch(&self, request: &SendRequest) -> Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                anyhow::bail!("HTTP 500");
            }
            Ok(())
        }
    }

    fn seed() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store
            .upsert_email(
                Email::builder(EmailId::new("o1"))
                    .thread("t1")
                    .incoming()
                    .role(Role::Original)
                    .category("lead")
                    .body("Can we talk pricing?")
                    .received_at(Utc::now() - chrono::Duration::minutes(10))
                    .build(),
            )
            .unwrap();
        store
            .upsert_email(
                Email::builder(EmailId::new("d1"))
                    .thread("t1")
                    .outgoing()
                    .role(Role::Reply)
                    .status(DraftStatus::Draft)
                    .body("Sure, here are our plans.")
                    .received_at(Utc::now() - chrono::Duration::minutes(5))
                    .build(),
            )
            .unwrap();
        Arc::new(store)
    }

    fn handler(
        store: Arc<InMemoryStore>,
        workflow: Arc<RecordingWorkflow>,
    ) -> (ActionHandler, Arc<NoticeBoard>) {
        let board = Arc::new(NoticeBoard::new());
        (ActionHandler::new(store, workflow, board.clone()), board)
    }

    #[test]
    fn test_send_resolves_original_and_marks_sent() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow::default());
        let (handler, board) = handler(store.clone(), workflow.clone());

        let receipt = handler.validate_and_send(&EmailId::new("d1"), None).unwrap();
        assert!(receipt.reply.is_sent());
        assert!(receipt.reply.sent_at.is_some());
        assert_eq!(receipt.original_email_id, Some(EmailId::new("o1")));

        let requests = workflow.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].original_email_id, Some(EmailId::new("o1")));

        assert_eq!(board.drain().last().unwrap().level, NoticeLevel::Success);
    }

    #[test]
    fn test_workflow_failure_keeps_draft() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow {
            fail: true,
            ..Default::default()
        });
        let (handler, board) = handler(store.clone(), workflow);

        let err = handler.validate_and_send(&EmailId::new("d1"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::Dispatch { .. })
        ));

        let stored = store.get_email(&EmailId::new("d1")).unwrap().unwrap();
        assert!(stored.is_draft());
        assert_eq!(board.drain()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_status_write_failure_after_dispatch() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow::default());
        let (handler, _board) = handler(store.clone(), workflow.clone());

        store.set_fail_writes(true);
        let err = handler.validate_and_send(&EmailId::new("d1"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::DispatchedButUnrecorded { .. })
        ));
        assert_eq!(workflow.requests.lock().unwrap().len(), 1);

        store.set_fail_writes(false);
        assert!(store.get_email(&EmailId::new("d1")).unwrap().unwrap().is_draft());
    }

    #[test]
    fn test_edited_body_is_written_before_dispatch() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow::default());
        let (handler, _board) = handler(store.clone(), workflow);

        let receipt = handler
            .validate_and_send(&EmailId::new("d1"), Some("Edited reply"))
            .unwrap();
        assert_eq!(receipt.reply.body.as_deref(), Some("Edited reply"));
    }

    #[test]
    fn test_failed_body_update_skips_dispatch() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow::default());
        let (handler, board) = handler(store.clone(), workflow.clone());

        store.set_fail_writes(true);
        let err = handler
            .validate_and_send(&EmailId::new("d1"), Some("Edited reply"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::DraftUpdate { .. })
        ));
        assert!(workflow.requests.lock().unwrap().is_empty());
        assert_eq!(board.drain()[0].message, "Failed to save draft");
    }

    #[test]
    fn test_sent_reply_cannot_be_resent() {
        let store = seed();
        let workflow = Arc::new(RecordingWorkflow::default());
        let (handler, _board) = handler(store.clone(), workflow.clone());

        handler.validate_and_send(&EmailId::new("d1"), None).unwrap();
        let err = handler.validate_and_send(&EmailId::new("d1"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::NotADraft { .. })
        ));
        assert_eq!(workflow.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_draft() {
        let (handler, _board) = handler(seed(), Arc::new(RecordingWorkflow::default()));
        let err = handler.update_draft(&EmailId::new("nope"), "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::NotFound { .. })
        ));
    }
}

//! In-memory editing session for a single draft reply

use anyhow::Result;
use log::debug;

use super::{ActionError, ActionHandler, SendReceipt};
use crate::models::Email;

/// Local review verdict on an AI-drafted reply
///
/// Never written to storage: a rejected draft stays a `draft` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Pending,
    Validated,
    Rejected,
}

/// Editing state for one draft: the persisted row plus the text being edited
#[derive(Debug, Clone)]
pub struct DraftEditor {
    draft: Email,
    buffer: String,
    editing: bool,
    review: Review,
}

impl DraftEditor {
    pub fn new(draft: Email) -> Self {
        let buffer = draft.body_text().to_string();
        Self {
            draft,
            buffer,
            editing: false,
            review: Review::Pending,
        }
    }

    /// The row as last seen in storage
    pub fn draft(&self) -> &Email {
        &self.draft
    }

    /// Text currently shown in the editor
    pub fn body(&self) -> &str {
        &self.buffer
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn review(&self) -> Review {
        self.review
    }

    /// Whether the buffer differs from the stored body
    pub fn is_dirty(&self) -> bool {
        self.buffer != self.draft.body_text()
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.editing = true;
        self.buffer = body.into();
    }

    /// Drop local changes
    pub fn cancel(&mut self) {
        self.buffer = self.draft.body_text().to_string();
        self.editing = false;
    }

    pub fn validate(&mut self) {
        self.review = Review::Validated;
    }

    pub fn reject(&mut self) {
        debug!("Draft {} rejected locally", self.draft.id);
        self.review = Review::Rejected;
    }

    /// Persist the buffer; on failure the buffer reverts to the stored body
    pub fn save(&mut self, handler: &ActionHandler) -> Result<()> {
        match handler.update_draft(&self.draft.id, &self.buffer) {
            Ok(updated) => {
                self.draft = updated;
                self.buffer = self.draft.body_text().to_string();
                self.editing = false;
                Ok(())
            }
            Err(e) => {
                self.cancel();
                Err(e)
            }
        }
    }

    /// Save pending edits, then validate and send the draft
    pub fn send(&mut self, handler: &ActionHandler) -> Result<SendReceipt> {
        if self.review == Review::Rejected {
            return Err(ActionError::Rejected {
                id: self.draft.id.to_string(),
            }
            .into());
        }

        if self.is_dirty() {
            self.save(handler)?;
        }

        let receipt = handler.validate_and_send(&self.draft.id, None)?;
        self.draft = receipt.reply.clone();
        self.buffer = self.draft.body_text().to_string();
        self.editing = false;
        self.review = Review::Validated;
        Ok(receipt)
    }
}

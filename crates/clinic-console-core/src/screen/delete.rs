//! Two-step delete guard.

use crate::entity::RecordId;

/// Holds the record a user asked to delete until they confirm or cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteConfirmation {
    staged: Option<RecordId>,
}

impl DeleteConfirmation {
    /// Stage a target, replacing any previous one.
    pub fn stage(&mut self, id: RecordId) {
        self.staged = Some(id);
    }

    pub fn staged(&self) -> Option<RecordId> {
        self.staged
    }

    pub fn is_pending(&self) -> bool {
        self.staged.is_some()
    }

    /// Discard the staged target.
    pub fn cancel(&mut self) -> Option<RecordId> {
        self.staged.take()
    }

    /// Consume the staged target for the confirmed delete.
    pub fn take(&mut self) -> Option<RecordId> {
        self.staged.take()
    }
}

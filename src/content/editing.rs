//! Inline editing: the edit-mode toggle and the editable field state
//! machine that decides when a commit actually issues a write.

use super::repository::ContentRepository;
use serde_json::Value;

/// Process-wide edit state, constructed once and passed down explicitly so
/// tests can substitute their own repository.
///
/// `is_admin` is a display hint only. It tells the UI whether to offer the
/// edit toggle; it is never an authorization decision. Privileged writes
/// are re-validated by the server on every admin request.
pub struct EditModeController {
    edit_mode_active: bool,
    is_admin: bool,
    repository: ContentRepository,
}

impl EditModeController {
    pub fn new(repository: ContentRepository, is_admin: bool) -> EditModeController {
        EditModeController {
            edit_mode_active: false,
            is_admin,
            repository,
        }
    }

    pub fn edit_mode_active(&self) -> bool {
        self.edit_mode_active
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Flips between ViewMode and EditMode. The explicit toggle is the only
    /// transition; there is no timeout back to ViewMode.
    pub fn toggle_edit_mode(&mut self) {
        self.edit_mode_active = !self.edit_mode_active;
    }

    /// Saves one field of a section through the repository. Refused (no
    /// storage access) while edit mode is off.
    pub fn save_content(&self, section: &str, field: &str, value: Value) -> bool {
        if !self.edit_mode_active {
            return false;
        }
        self.repository.write_field(section, field, value)
    }
}

/// Outcome of committing an editable field.
#[derive(Debug, PartialEq, Eq)]
pub enum Commit {
    /// Draft equals the committed value: no write should be issued.
    Unchanged,
    /// Draft differs: exactly one write with this value should be issued,
    /// followed by a re-read of the section.
    Changed(String),
}

/// The click-to-edit widget, minus the rendering. Holds the last committed
/// value and the in-progress draft; an aborted edit reverts the draft and a
/// failed save keeps it for manual retry.
#[derive(Debug, Clone)]
pub struct EditableField {
    committed: String,
    draft: String,
    editing: bool,
}

impl EditableField {
    pub fn new<T: Into<String>>(initial: T) -> EditableField {
        let committed = initial.into();
        EditableField {
            draft: committed.clone(),
            committed,
            editing: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Click: enters the inline-editable state, but only while edit mode is
    /// active. When it is off the field renders as plain content.
    pub fn begin_edit(&mut self, controller: &EditModeController) -> bool {
        if controller.edit_mode_active() && !self.editing {
            self.editing = true;
        }
        self.editing
    }

    pub fn set_draft<T: Into<String>>(&mut self, value: T) {
        self.draft = value.into();
    }

    /// Escape: reverts to the last committed value and exits editing
    /// without saving.
    pub fn cancel(&mut self) {
        self.draft = self.committed.clone();
        self.editing = false;
    }

    /// Blur (or Enter): exits editing and reports whether a write is due.
    /// An unchanged draft is a no-op.
    pub fn commit(&mut self) -> Commit {
        self.editing = false;
        if self.draft == self.committed {
            Commit::Unchanged
        } else {
            Commit::Changed(self.draft.clone())
        }
    }

    /// Acknowledges a successful save, making the draft the new committed
    /// value. Not called on failure, so the unsaved draft survives.
    pub fn confirm_saved(&mut self) {
        self.committed = self.draft.clone();
    }
}

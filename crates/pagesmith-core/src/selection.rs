//! Selection and buffered-edit state
//!
//! Config edits apply to the in-memory tree immediately but are only sent
//! to the backend on an explicit save, so the editor tracks which widget
//! the property panel is bound to and whether it holds unsent changes.

/// At most one widget is selected at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    selected: Option<String>,
    dirty: bool,
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a widget. Re-selecting the current widget keeps pending
    /// edits; switching to a different one discards the dirty flag (the
    /// tree already holds the edited values).
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.selected.as_deref() != Some(id.as_str()) {
            self.dirty = false;
        }
        self.selected = Some(id);
    }

    /// Clear the selection, e.g. when the selected widget is deleted.
    pub fn clear(&mut self) {
        self.selected = None;
        self.dirty = false;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Mark the selected widget as holding edits not yet saved.
    pub fn mark_dirty(&mut self) {
        if self.selected.is_some() {
            self.dirty = true;
        }
    }

    /// Called after a successful save. A failed save keeps the flag so
    /// the user can retry.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

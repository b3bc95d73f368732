/// Tracks whether the document changed since it was loaded or last saved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtyTracker {
    dirty: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called by the owner after a successful save.
    pub fn clear(&mut self) {
        self.dirty = false;
    }
}

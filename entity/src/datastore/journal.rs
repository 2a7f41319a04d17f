//! Undo journal backing nested store transactions.

use uuid::Uuid;

use super::access::{Roles, Users};

/// Inverse of one primitive mutation.
#[derive(Debug, Clone)]
pub(crate) enum Undo {
    /// Restore `key` to `previous` (None removes it)
    Object {
        key: String,
        previous: Option<Vec<u8>>,
    },
    Registration {
        key: String,
        previous: Option<Vec<String>>,
    },
    /// Drop `id` from `tag` (undoes an insert)
    TagInserted { tag: String, id: Uuid },
    /// Put `id` back into `tag` at `position` (undoes a removal)
    TagRemoved {
        tag: String,
        id: Uuid,
        position: usize,
    },
    Users(Users),
    Roles(Roles),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint(usize);

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    depth: usize,
    entries: Vec<Undo>,
}

impl Journal {
    pub fn is_recording(&self) -> bool {
        self.depth > 0
    }

    pub fn record(&mut self, undo: Undo) {
        if self.is_recording() {
            self.entries.push(undo);
        }
    }

    pub fn begin(&mut self) -> Checkpoint {
        self.depth += 1;
        Checkpoint(self.entries.len())
    }

    pub fn commit(&mut self, _checkpoint: Checkpoint) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.clear();
        }
    }

    /// Pop every entry recorded since `checkpoint`, newest first.
    pub fn unwind(&mut self, checkpoint: Checkpoint) -> Vec<Undo> {
        self.depth = self.depth.saturating_sub(1);
        let mut undone = self.entries.split_off(checkpoint.0);
        undone.reverse();
        undone
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

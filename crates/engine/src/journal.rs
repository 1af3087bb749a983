//! Ordered storage of the operations recorded against one account.

use uuid::Uuid;

use crate::{EngineError, Operation, ResultEngine};

/// Chronological list of operations.
///
/// Entries are ordered by `registered_at`; operations sharing a timestamp keep
/// their insertion order, so back-dated inserts land where a statement would
/// show them without reshuffling same-instant entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationJournal {
    entries: Vec<Operation>,
}

impl OperationJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an operation at its chronological position.
    pub fn insert(&mut self, op: Operation) -> ResultEngine<&Operation> {
        if self.contains(op.id) {
            return Err(EngineError::ExistingKey(op.id.to_string()));
        }
        let index = self
            .entries
            .partition_point(|entry| entry.registered_at <= op.registered_at);
        self.entries.insert(index, op);
        Ok(&self.entries[index])
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Operation> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut Operation> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Removes an operation, failing with `UnknownOperation` if it is missing.
    pub fn remove(&mut self, id: Uuid) -> ResultEngine<Operation> {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => Ok(self.entries.remove(index)),
            None => Err(EngineError::UnknownOperation(id.to_string())),
        }
    }

    /// The other leg of a transfer or exchange, when it lives in this journal.
    #[must_use]
    pub fn partner(&self, op: &Operation) -> Option<&Operation> {
        let pair_id = op.pair_id?;
        self.entries
            .iter()
            .find(|entry| entry.pair_id == Some(pair_id) && entry.id != op.id)
    }

    /// Chronological order (oldest first).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Operation> {
        self.entries.iter()
    }

    /// Display order (newest first).
    pub fn iter_recent(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter().rev()
    }

    /// Balance seeds (snapshot checkpoints).
    pub fn markers(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter().filter(|entry| entry.is_marker())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("precondition failed")]
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Change<T> {
    pub kind: ChangeKind,
    pub doc: T,
}

/// One subscribable document collection of the shared realtime store.
///
/// Every writer goes through `put` or `conditional_update`; the latter is the
/// compare-and-swap primitive that serializes racing actors. The precondition
/// and the mutation run under the document's shard write lock, so a concurrent
/// writer either sees the state before the whole update or after it, never in
/// between.
pub struct Collection<T> {
    docs: DashMap<Uuid, T>,
    changes: broadcast::Sender<Change<T>>,
    receipt_seq: AtomicU64,
}

impl<T: Clone> Collection<T> {
    pub fn new(event_buffer_size: usize) -> Self {
        let (changes, _unused_rx) = broadcast::channel(event_buffer_size);
        Self {
            docs: DashMap::new(),
            changes,
            receipt_seq: AtomicU64::new(0),
        }
    }

    /// Monotonic receipt counter for documents that need a stable display
    /// order (offers are listed in the order they arrived).
    pub fn next_receipt(&self) -> u64 {
        self.receipt_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn put(&self, id: Uuid, doc: T) {
        self.docs.insert(id, doc.clone());
        let _ = self.changes.send(Change {
            kind: ChangeKind::Created,
            doc,
        });
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.docs.get(id).map(|entry| entry.value().clone())
    }

    pub fn query<F>(&self, filter: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Conditional write: applies `apply` only if `precondition` holds for the
    /// current document, otherwise reports `Conflict` and leaves the document
    /// untouched. The change event is emitted after the lock is released.
    pub fn conditional_update<P, A>(
        &self,
        id: Uuid,
        precondition: P,
        apply: A,
    ) -> Result<T, StoreError>
    where
        P: FnOnce(&T) -> bool,
        A: FnOnce(&mut T),
    {
        let updated = {
            let mut entry = self.docs.get_mut(&id).ok_or(StoreError::NotFound)?;
            if !precondition(entry.value()) {
                return Err(StoreError::Conflict);
            }
            apply(entry.value_mut());
            entry.value().clone()
        };

        let _ = self.changes.send(Change {
            kind: ChangeKind::Updated,
            doc: updated.clone(),
        });
        Ok(updated)
    }

    pub fn watch(&self) -> broadcast::Receiver<Change<T>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Doc {
        status: &'static str,
        owner: Option<usize>,
    }

    fn open_doc() -> Doc {
        Doc {
            status: "open",
            owner: None,
        }
    }

    #[test]
    fn put_then_get_roundtrips() {
        let collection = Collection::new(16);
        let id = Uuid::new_v4();
        collection.put(id, open_doc());

        assert_eq!(collection.get(&id), Some(open_doc()));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn conditional_update_applies_when_precondition_holds() {
        let collection = Collection::new(16);
        let id = Uuid::new_v4();
        collection.put(id, open_doc());

        let updated = collection
            .conditional_update(
                id,
                |doc| doc.status == "open",
                |doc| {
                    doc.status = "claimed";
                    doc.owner = Some(7);
                },
            )
            .unwrap();

        assert_eq!(updated.status, "claimed");
        assert_eq!(collection.get(&id).unwrap().owner, Some(7));
    }

    #[test]
    fn conditional_update_rejects_and_leaves_doc_untouched() {
        let collection = Collection::new(16);
        let id = Uuid::new_v4();
        collection.put(id, open_doc());

        let result = collection.conditional_update(
            id,
            |doc| doc.status == "claimed",
            |doc| doc.owner = Some(1),
        );

        assert_eq!(result, Err(StoreError::Conflict));
        assert_eq!(collection.get(&id), Some(open_doc()));
    }

    #[test]
    fn conditional_update_on_missing_doc_is_not_found() {
        let collection: Collection<Doc> = Collection::new(16);
        let result =
            collection.conditional_update(Uuid::new_v4(), |_| true, |doc| doc.owner = Some(1));
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[test]
    fn watch_receives_puts_and_updates() {
        let collection = Collection::new(16);
        let mut rx = collection.watch();
        let id = Uuid::new_v4();

        collection.put(id, open_doc());
        collection
            .conditional_update(id, |doc| doc.status == "open", |doc| doc.status = "claimed")
            .unwrap();

        let created = rx.try_recv().unwrap();
        assert_eq!(created.kind, ChangeKind::Created);
        let updated = rx.try_recv().unwrap();
        assert_eq!(updated.kind, ChangeKind::Updated);
        assert_eq!(updated.doc.status, "claimed");
    }

    #[test]
    fn racing_conditional_updates_admit_exactly_one_winner() {
        let collection = Arc::new(Collection::new(64));
        let id = Uuid::new_v4();
        collection.put(id, open_doc());

        let contenders = 8;
        let barrier = Arc::new(Barrier::new(contenders));
        let mut handles = Vec::new();

        for contender in 0..contenders {
            let collection = collection.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                collection.conditional_update(
                    id,
                    |doc| doc.status == "open",
                    |doc| {
                        doc.status = "claimed";
                        doc.owner = Some(contender);
                    },
                )
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(
            results.iter().filter(|r| **r == Err(StoreError::Conflict)).count(),
            contenders - 1
        );

        let doc = collection.get(&id).unwrap();
        assert_eq!(doc.status, "claimed");
        assert_eq!(doc.owner, winners[0].as_ref().unwrap().owner);
    }

    #[test]
    fn receipt_numbers_are_strictly_increasing() {
        let collection: Collection<Doc> = Collection::new(16);
        let first = collection.next_receipt();
        let second = collection.next_receipt();
        assert!(second > first);
    }
}

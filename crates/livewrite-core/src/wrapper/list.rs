// ── List reconciliation ──
//
// Shared by `Collection` and `Bucket`: a local copy of one page of
// records plus the server-side total, kept in step with CRUD deliveries.

use std::sync::Arc;

use livewrite_api::RealtimeEvent;
use tracing::{debug, warn};

use super::live::Phase;
use crate::event::{EventKind, ResourceKind, classify};
use crate::model::{Record, decode};

/// Ordered records plus the count reported by the backend.
///
/// `total` is the server-side count, so it can exceed `items.len()` when
/// the list was fetched with a limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<Arc<T>>,
    pub total: i64,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

impl<T: Record> ListState<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self {
            items: items.into_iter().map(Arc::new).collect(),
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.items.iter().find(|item| item.record_id() == id)
    }

    /// Identifiers in list order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.record_id()).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.record_id() == id)
    }

    /// Apply one classified change. Returns `true` if anything changed.
    ///
    /// Live semantics:
    /// - create appends and increments the count; a create for a record
    ///   already held replaces it in place and leaves the count alone, so
    ///   a list never holds two copies of one identifier
    /// - delete removes the first matching record and decrements the
    ///   count even when no record matched
    /// - update removes the matching record and appends the new payload,
    ///   leaving the count alone
    ///
    /// Replayed deliveries may already be part of the snapshot, so a
    /// delete for an absent record is skipped.
    pub(crate) fn apply(&mut self, kind: EventKind, item: T, phase: Phase) -> bool {
        let position = self.position(item.record_id());

        match (kind, phase, position) {
            (EventKind::Create, _, Some(pos)) => {
                if let Some(slot) = self.items.get_mut(pos) {
                    *slot = Arc::new(item);
                }
            }
            (EventKind::Create, _, _) => {
                self.items.push(Arc::new(item));
                self.total += 1;
            }
            (EventKind::Delete, Phase::Replay, None) => return false,
            (EventKind::Delete, _, _) => {
                if let Some(pos) = position {
                    self.items.remove(pos);
                }
                self.total -= 1;
            }
            (EventKind::Update, _, _) => {
                if let Some(pos) = position {
                    self.items.remove(pos);
                }
                self.items.push(Arc::new(item));
            }
        }

        true
    }
}

/// Classify a delivery for `resource`, decode its payload, and apply it.
pub(crate) fn apply_event<T: Record>(
    resource: ResourceKind,
    state: &mut ListState<T>,
    event: &RealtimeEvent,
    phase: Phase,
) -> bool {
    let Some(matched) = classify(resource, &event.events) else {
        debug!(%resource, events = ?event.events, "unclassified delivery ignored");
        return false;
    };

    match decode::<T>(&event.payload) {
        Ok(item) => state.apply(matched.kind(), item, phase),
        Err(e) => {
            warn!(%resource, error = %e, "could not decode delivery payload");
            false
        }
    }
}

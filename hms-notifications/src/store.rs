use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{Category, NotificationId, NotificationRecord};
use crate::reconcile::{self, SnapshotDiff};

/// The single on-screen alert slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub record: NotificationRecord,
    pub raised_at: DateTime<Utc>,
}

impl Toast {
    /// Whether the toast is still within its display window at `now`.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.raised_at).to_std() {
            Ok(elapsed) => elapsed < ttl,
            // raised_at lies in the future relative to `now`
            Err(_) => true,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<NotificationRecord>,
    toast: Option<Toast>,
    disposed: bool,
}

/// In-memory, newest-first collection of the session's notifications.
///
/// Cheap to clone (interior `Arc`). Every operation takes the lock once and
/// never holds it across an await point.
#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    inner: Arc<RwLock<StoreState>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Vec<NotificationRecord> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Always derived from the list; there is no separate counter to drift.
    pub fn unread_count(&self) -> usize {
        self.read().records.iter().filter(|r| !r.read).count()
    }

    pub fn get(&self, id: &NotificationId) -> Option<NotificationRecord> {
        self.read().records.iter().find(|r| &r.id == id).cloned()
    }

    /// Insert an optimistic record at the head and make it the active toast.
    ///
    /// After disposal the record is still built and returned but not kept.
    pub fn add_local(
        &self,
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> NotificationRecord {
        let mut record = NotificationRecord::local(category, title, message, now);
        let mut state = self.write();
        if state.disposed {
            return record;
        }

        while state.records.iter().any(|r| r.id == record.id) {
            record.id = NotificationId::mint_local(now);
        }

        state.records.insert(0, record.clone());
        state.toast = Some(Toast {
            record: record.clone(),
            raised_at: now,
        });
        record
    }

    /// Remove the record with `id`. Returns `false` if it was not present.
    pub fn clear(&self, id: &NotificationId) -> bool {
        let mut state = self.write();
        if state.disposed {
            return false;
        }
        let before = state.records.len();
        state.records.retain(|r| &r.id != id);
        before != state.records.len()
    }

    /// Flip one record to read. Returns `true` if its state changed.
    pub fn mark_read(&self, id: &NotificationId) -> bool {
        let mut state = self.write();
        if state.disposed {
            return false;
        }
        match state.records.iter_mut().find(|r| &r.id == id) {
            Some(record) if !record.read => {
                record.read = true;
                true
            }
            _ => false,
        }
    }

    /// Flip every record to read. Returns how many changed.
    pub fn mark_all_read(&self) -> usize {
        let mut state = self.write();
        if state.disposed {
            return 0;
        }
        let mut flipped = 0;
        for record in state.records.iter_mut().filter(|r| !r.read) {
            record.read = true;
            flipped += 1;
        }
        flipped
    }

    /// Replace the whole collection with a server snapshot.
    ///
    /// The diff against the previous contents is computed under the same lock
    /// so no other mutation can interleave. Returns `None` once disposed.
    pub fn replace_snapshot(
        &self,
        incoming: Vec<NotificationRecord>,
        now: DateTime<Utc>,
    ) -> Option<SnapshotDiff> {
        let incoming = reconcile::dedupe(incoming);
        let mut state = self.write();
        if state.disposed {
            return None;
        }

        let diff = reconcile::diff_snapshot(&state.records, &incoming);
        if let Some(record) = &diff.toast {
            state.toast = Some(Toast {
                record: record.clone(),
                raised_at: now,
            });
        }
        state.records = incoming;
        Some(diff)
    }

    pub fn toast(&self) -> Option<Toast> {
        self.read().toast.clone()
    }

    /// The toast's record while it is still within `ttl` of being raised.
    pub fn active_toast(&self, now: DateTime<Utc>, ttl: Duration) -> Option<NotificationRecord> {
        self.read()
            .toast
            .as_ref()
            .filter(|t| t.is_live(now, ttl))
            .map(|t| t.record.clone())
    }

    pub fn dismiss_toast(&self) -> bool {
        self.write().toast.take().is_some()
    }

    pub fn dispose(&self) {
        let mut state = self.write();
        state.disposed = true;
        state.toast = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.read().disposed
    }
}

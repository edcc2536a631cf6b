use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::broadcast;

use hms_shared::ClientError;

use crate::client::NotificationApi;
use crate::config::NotifyConfig;
use crate::models::{Category, NotificationId, NotificationRecord};
use crate::presentation::{self, NotificationView};
use crate::reconcile::{self, AckPlan, SnapshotDiff};
use crate::store::NotificationStore;

/// Externally visible changes, fanned out to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum CenterEvent {
    Synced { total: usize, unread: usize },
    ToastRaised(NotificationRecord),
    Added(NotificationRecord),
    /// `None` means every record.
    ReadStateChanged { id: Option<NotificationId> },
    Cleared(NotificationId),
    LoadingChanged(bool),
}

/// How one fetch cycle ended.
#[derive(Debug)]
pub enum SyncOutcome {
    Applied(SnapshotDiff),
    /// The snapshot arrived after the center was disposed.
    Discarded,
    /// Stale state was kept.
    Failed(ClientError),
}

/// How an acknowledgement ended. Unless disposed, the local flip happens in
/// every case.
#[derive(Debug)]
pub enum ReadAck {
    /// Local-only record; the backend was not contacted.
    LocalOnly,
    Confirmed,
    /// The backend call failed; the optimistic flip stays in place.
    Unconfirmed(ClientError),
    /// The center was disposed; nothing was sent or changed.
    Disposed,
}

#[derive(Debug, Clone)]
pub struct CenterOptions {
    pub toast_ttl: Duration,
    pub event_capacity: usize,
}

impl Default for CenterOptions {
    fn default() -> Self {
        Self {
            toast_ttl: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

impl From<&NotifyConfig> for CenterOptions {
    fn from(config: &NotifyConfig) -> Self {
        Self {
            toast_ttl: config.toast_ttl(),
            event_capacity: config.event_capacity.max(1),
        }
    }
}

struct Inner {
    api: Arc<dyn NotificationApi>,
    store: NotificationStore,
    loading: AtomicBool,
    toast_ttl: Duration,
    events: broadcast::Sender<CenterEvent>,
}

impl Inner {
    fn emit(&self, event: CenterEvent) -> usize {
        // Err only means nobody is subscribed right now.
        self.events.send(event).unwrap_or(0)
    }
}

/// Holds the loading flag for the duration of a non-quiet fetch and clears it
/// on drop, whatever way the fetch ends.
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn engage(inner: &'a Inner) -> Self {
        inner.loading.store(true, Ordering::SeqCst);
        inner.emit(CenterEvent::LoadingChanged(true));
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.loading.store(false, Ordering::SeqCst);
        self.inner.emit(CenterEvent::LoadingChanged(false));
    }
}

/// Session-scoped notification engine: the store, the remote calls that feed
/// and acknowledge it, and the toast slot.
///
/// Constructed once per session and handed to consumers; cloning shares the
/// same state.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn NotificationApi>, options: CenterOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity);
        Self {
            inner: Arc::new(Inner {
                api,
                store: NotificationStore::new(),
                loading: AtomicBool::new(false),
                toast_ttl: options.toast_ttl,
                events,
            }),
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.inner.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        self.inner.events.subscribe()
    }

    pub fn list(&self) -> Vec<NotificationRecord> {
        self.inner.store.list()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.store.unread_count()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// The list decorated for rendering at `now`.
    pub fn views(&self, now: DateTime<Utc>) -> Vec<NotificationView> {
        self.inner
            .store
            .list()
            .iter()
            .map(|r| presentation::present(r, now))
            .collect()
    }

    pub fn active_toast(&self, now: DateTime<Utc>) -> Option<NotificationRecord> {
        self.inner.store.active_toast(now, self.inner.toast_ttl)
    }

    pub fn dismiss_toast(&self) -> bool {
        self.inner.store.dismiss_toast()
    }

    /// Pull a snapshot from the backend and reconcile it into the store.
    ///
    /// A non-quiet fetch toggles the loading flag around the call. Failures are
    /// logged and leave the store untouched.
    pub async fn fetch(&self, quiet: bool) -> SyncOutcome {
        let _loading = (!quiet).then(|| LoadingGuard::engage(&self.inner));

        let records = match self.inner.api.list_notifications().await {
            Ok(records) => records,
            Err(e) => {
                counter!("notifications_fetch_total", "outcome" => "error").increment(1);
                tracing::warn!(
                    error = %e,
                    code = %e.code(),
                    transient = e.is_transient(),
                    quiet,
                    "notification fetch failed, keeping previous state"
                );
                return SyncOutcome::Failed(e);
            }
        };

        let Some(diff) = self.inner.store.replace_snapshot(records, Utc::now()) else {
            counter!("notifications_fetch_total", "outcome" => "discarded").increment(1);
            tracing::debug!("notification center disposed, discarding snapshot");
            return SyncOutcome::Discarded;
        };

        counter!("notifications_fetch_total", "outcome" => "ok").increment(1);
        let total = self.inner.store.len();
        let unread = self.inner.store.unread_count();
        tracing::debug!(
            total,
            unread,
            arrived = diff.newly_arrived.len(),
            quiet,
            "notifications synced"
        );
        self.inner.emit(CenterEvent::Synced { total, unread });

        if let Some(record) = &diff.toast {
            counter!("notifications_toast_total", "source" => "poll").increment(1);
            tracing::info!(
                notification_id = %record.id,
                category = %record.category,
                "new notification toast"
            );
            self.inner.emit(CenterEvent::ToastRaised(record.clone()));
        }

        SyncOutcome::Applied(diff)
    }

    /// Insert an optimistic notification after a mutation elsewhere succeeded.
    pub fn add_local(
        &self,
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> NotificationRecord {
        let record = self.inner.store.add_local(category, title, message, Utc::now());
        if self.inner.store.is_disposed() {
            return record;
        }

        counter!("notifications_toast_total", "source" => "local").increment(1);
        tracing::debug!(
            notification_id = %record.id,
            category = %record.category,
            "local notification added"
        );
        self.inner.emit(CenterEvent::Added(record.clone()));
        self.inner.emit(CenterEvent::ToastRaised(record.clone()));
        record
    }

    pub fn clear(&self, id: &NotificationId) -> bool {
        let removed = self.inner.store.clear(id);
        if removed {
            self.inner.emit(CenterEvent::Cleared(id.clone()));
        }
        removed
    }

    /// Acknowledge one notification.
    ///
    /// Server ids are acknowledged remotely first; local ids never are. The
    /// local record is flipped to read afterwards regardless of the remote
    /// result, and a failed acknowledgement is not rolled back.
    pub async fn mark_read(&self, id: &NotificationId) -> ReadAck {
        if self.inner.store.is_disposed() {
            return ReadAck::Disposed;
        }

        let ack = match reconcile::plan_mark_read(id) {
            AckPlan::LocalOnly => ReadAck::LocalOnly,
            AckPlan::Remote(server_id) => match self.inner.api.mark_read(server_id).await {
                Ok(()) => {
                    counter!("notifications_ack_total", "kind" => "single", "outcome" => "ok")
                        .increment(1);
                    ReadAck::Confirmed
                }
                Err(e) => {
                    counter!("notifications_ack_total", "kind" => "single", "outcome" => "error")
                        .increment(1);
                    tracing::warn!(
                        error = %e,
                        notification_id = server_id,
                        "failed to acknowledge notification, keeping optimistic read state"
                    );
                    ReadAck::Unconfirmed(e)
                }
            },
        };

        if self.inner.store.mark_read(id) {
            self.inner.emit(CenterEvent::ReadStateChanged { id: Some(id.clone()) });
        }
        ack
    }

    /// Acknowledge everything. Calls the backend unless disposed, then flips every
    /// local record to read.
    pub async fn mark_all_read(&self) -> ReadAck {
        if self.inner.store.is_disposed() {
            return ReadAck::Disposed;
        }

        let ack = match self.inner.api.mark_all_read().await {
            Ok(()) => {
                counter!("notifications_ack_total", "kind" => "all", "outcome" => "ok")
                    .increment(1);
                ReadAck::Confirmed
            }
            Err(e) => {
                counter!("notifications_ack_total", "kind" => "all", "outcome" => "error")
                    .increment(1);
                tracing::warn!(
                    error = %e,
                    "failed to acknowledge all notifications, keeping optimistic read state"
                );
                ReadAck::Unconfirmed(e)
            }
        };

        let flipped = self.inner.store.mark_all_read();
        if flipped > 0 {
            self.inner.emit(CenterEvent::ReadStateChanged { id: None });
        }
        ack
    }

    /// Tear down the session. Snapshots that resolve later are discarded and
    /// every mutating operation becomes a no-op.
    pub fn dispose(&self) {
        self.inner.store.dispose();
        tracing::debug!("notification center disposed");
    }
}

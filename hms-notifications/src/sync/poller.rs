use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::services::notification_service::NotificationCenter;

/// Recurring re-synchronization of a [`NotificationCenter`].
///
/// Starting performs one immediate, non-quiet fetch and then a quiet fetch
/// every `period`. Each fetch runs as its own task: a slow response never
/// delays the next tick, so fetches can overlap and the last one to resolve
/// wins the store.
///
/// `stop` consumes the poller, so it can only be called once. Dropping the
/// poller without stopping it still cancels the timer.
pub struct SyncPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SyncPoller {
    pub fn start(center: NotificationCenter, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "notification poller started");
            spawn_fetch(&center, false);

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("notification poller stopped");
                        break;
                    }
                    _ = ticker.tick() => spawn_fetch(&center, true),
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel the timer and wait for the loop to exit. Fetches already in
    /// flight are left to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "notification poller task ended abnormally");
            }
        }
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_fetch(center: &NotificationCenter, quiet: bool) {
    let center = center.clone();
    tokio::spawn(async move {
        center.fetch(quiet).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use hms_shared::ClientResult;

    use crate::client::NotificationApi;
    use crate::models::NotificationRecord;
    use crate::services::notification_service::tests::{rec, FakeApi};
    use crate::services::notification_service::{CenterEvent, CenterOptions};

    fn center_with(api: Arc<FakeApi>) -> NotificationCenter {
        NotificationCenter::new(api, CenterOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_every_period() {
        let api = Arc::new(FakeApi::default());
        api.push_snapshot(vec![rec(1, false)]);
        api.push_snapshot(vec![rec(2, false), rec(1, false)]);
        let center = center_with(api.clone());
        let mut events = center.subscribe();

        let poller = SyncPoller::start(center.clone(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.calls(), vec!["list"]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.calls(), vec!["list", "list"]);
        assert_eq!(center.unread_count(), 2);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen[0], CenterEvent::LoadingChanged(true));
        assert_eq!(seen[1], CenterEvent::Synced { total: 1, unread: 1 });
        assert_eq!(seen[2], CenterEvent::LoadingChanged(false));
        // Timer-driven fetch is quiet: no loading events after the first cycle.
        assert_eq!(seen[3], CenterEvent::Synced { total: 2, unread: 2 });
        assert!(matches!(seen[4], CenterEvent::ToastRaised(ref r) if r.id == rec(2, false).id));
        assert_eq!(seen.len(), 5);

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_the_timer() {
        let api = Arc::new(FakeApi::default());
        let poller = SyncPoller::start(center_with(api.clone()), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(poller.is_running());
        poller.stop().await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_cancels_the_timer() {
        let api = Arc::new(FakeApi::default());
        let poller = SyncPoller::start(center_with(api.clone()), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(poller);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.calls().len(), 1);
    }

    /// Backend slower than the poll period.
    struct SlowApi {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl NotificationApi for SlowApi {
        async fn list_notifications(&self) -> ClientResult<Vec<NotificationRecord>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let n = self.completed.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            Ok(vec![rec(n, false)])
        }

        async fn mark_read(&self, _id: u64) -> ClientResult<()> {
            Ok(())
        }

        async fn mark_all_read(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_overlap_and_late_results_are_dropped_after_dispose() {
        let api = Arc::new(SlowApi {
            delay: Duration::from_secs(45),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        });
        let center = NotificationCenter::new(api.clone(), CenterOptions::default());
        let poller = SyncPoller::start(center.clone(), Duration::from_secs(30));

        // t=0 and t=30 fetches are both outstanding at t=31.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 2);
        assert!(center.is_loading());

        // First fetch resolves at t=45.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(center.list().len(), 1);
        assert!(!center.is_loading());

        poller.stop().await;
        center.dispose();

        // The t=30 fetch resolves at t=75 into a disposed center.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.completed.load(Ordering::SeqCst), 2);
        assert_eq!(center.list().len(), 1);
        assert_eq!(center.list()[0].id, rec(1, false).id);
    }
}

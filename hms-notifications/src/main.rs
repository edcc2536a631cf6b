use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use hms_notifications::{
    CenterEvent, CenterOptions, HttpNotificationApi, NotificationCenter, NotifyConfig, SyncPoller,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hms_shared::telemetry::init_tracing("hms-notifications");

    let config = NotifyConfig::load()?;
    tracing::info!(
        api_base_url = %config.api_base_url,
        poll_interval_secs = config.poll_interval().as_secs(),
        authenticated = config.auth_token.is_some(),
        "hms-notifications starting"
    );

    let api = HttpNotificationApi::new(
        &config.api_base_url,
        config.auth_token.clone(),
        config.http_timeout(),
    )?;
    let center = NotificationCenter::new(Arc::new(api), CenterOptions::from(&config));

    // Log every change the dashboards would render.
    let mut events = center.subscribe();
    let feed = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CenterEvent::ToastRaised(record)) => {
                    tracing::info!(
                        notification_id = %record.id,
                        category = %record.category,
                        title = %record.title,
                        "toast"
                    );
                }
                Ok(CenterEvent::Synced { total, unread }) => {
                    tracing::info!(total, unread, "notifications synced");
                }
                Ok(other) => tracing::debug!(event = ?other, "notification event"),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("notification feed lagged, skipped {n} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let poller = SyncPoller::start(center.clone(), config.poll_interval());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    poller.stop().await;
    center.dispose();
    feed.abort();

    Ok(())
}

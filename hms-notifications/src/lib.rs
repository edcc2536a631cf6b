//! Client-side notification synchronization for the HMS dashboards.
//!
//! A [`NotificationCenter`] owns the session's notification list. A
//! [`SyncPoller`] refreshes it from the backend on a fixed cadence, every
//! refresh is diffed against the previous contents to decide whether a toast
//! is due, and read acknowledgements are applied optimistically.

pub mod client;
pub mod config;
pub mod models;
pub mod presentation;
pub mod reconcile;
pub mod services;
pub mod store;
pub mod sync;

pub use client::{HttpNotificationApi, NotificationApi};
pub use config::NotifyConfig;
pub use models::{Category, NotificationId, NotificationRecord};
pub use services::notification_service::{
    CenterEvent, CenterOptions, NotificationCenter, ReadAck, SyncOutcome,
};
pub use store::NotificationStore;
pub use sync::SyncPoller;

//! Snapshot diffing and read-state classification.
//!
//! Everything here is pure; the store applies the results under its lock.

use std::collections::HashSet;

use crate::models::{NotificationId, NotificationRecord};

/// Result of comparing a fetched snapshot with what the store held before.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDiff {
    /// Ids present in the incoming snapshot but not in the previous one, in
    /// snapshot order.
    pub newly_arrived: Vec<NotificationId>,
    /// The record to surface as a toast, if any.
    pub toast: Option<NotificationRecord>,
}

/// Drop repeated ids from a server snapshot, keeping the first occurrence.
pub fn dedupe(incoming: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
    let mut seen = HashSet::with_capacity(incoming.len());
    let before = incoming.len();
    let unique: Vec<_> = incoming
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();

    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "server snapshot contained duplicate notification ids"
        );
    }
    unique
}

/// Compare `previous` with `incoming` and decide toast eligibility.
///
/// A toast fires only when the previous snapshot was non-empty (so the first
/// fetch of a session never toasts) and the first unread record among the
/// newly arrived ones exists.
pub fn diff_snapshot(
    previous: &[NotificationRecord],
    incoming: &[NotificationRecord],
) -> SnapshotDiff {
    let known: HashSet<&NotificationId> = previous.iter().map(|r| &r.id).collect();
    let arrived: Vec<&NotificationRecord> = incoming
        .iter()
        .filter(|r| !known.contains(&r.id))
        .collect();

    let toast = if previous.is_empty() {
        None
    } else {
        arrived.iter().find(|r| !r.read).map(|r| (*r).clone())
    };

    SnapshotDiff {
        newly_arrived: arrived.into_iter().map(|r| r.id.clone()).collect(),
        toast,
    }
}

/// What acknowledging a single notification requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPlan {
    /// Server-known record: tell the backend, then flip locally.
    Remote(u64),
    /// Optimistic record with no server counterpart: flip locally only.
    LocalOnly,
}

pub fn plan_mark_read(id: &NotificationId) -> AckPlan {
    match id {
        NotificationId::Server(n) => AckPlan::Remote(*n),
        NotificationId::Local(_) => AckPlan::LocalOnly,
    }
}

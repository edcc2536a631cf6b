use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Category, NotificationId, NotificationRecord};

/// Display metadata derived from a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Style {
    pub icon: &'static str,
    pub color: &'static str,
    pub background: &'static str,
}

const FALLBACK: Style = Style {
    icon: "bell",
    color: "text-gray-600",
    background: "bg-gray-50",
};

pub fn style_for(category: Category) -> Style {
    match category {
        Category::Emergency => Style {
            icon: "alert-triangle",
            color: "text-red-600",
            background: "bg-red-50",
        },
        Category::Appointment => Style {
            icon: "calendar",
            color: "text-blue-600",
            background: "bg-blue-50",
        },
        Category::Payment => Style {
            icon: "credit-card",
            color: "text-green-600",
            background: "bg-green-50",
        },
        Category::System => Style {
            icon: "settings",
            color: "text-gray-600",
            background: "bg-gray-50",
        },
        Category::Success => Style {
            icon: "check-circle",
            color: "text-green-600",
            background: "bg-green-50",
        },
        Category::Error => Style {
            icon: "x-circle",
            color: "text-red-600",
            background: "bg-red-50",
        },
        Category::Info => Style {
            icon: "info",
            color: "text-blue-600",
            background: "bg-blue-50",
        },
        Category::Lab => Style {
            icon: "flask",
            color: "text-purple-600",
            background: "bg-purple-50",
        },
        Category::Unknown => FALLBACK,
    }
}

/// Coarse relative age: "just now", "Xm ago", "Xh ago", "Xd ago".
///
/// Timestamps in the future (clock skew against the server) read as "just now".
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let minutes = secs / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// A record decorated for rendering. Built on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub category: Category,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub icon: &'static str,
    pub color: &'static str,
    pub background: &'static str,
    pub age_label: String,
}

pub fn present(record: &NotificationRecord, now: DateTime<Utc>) -> NotificationView {
    let style = style_for(record.category);
    NotificationView {
        id: record.id.clone(),
        category: record.category,
        title: record.title.clone(),
        message: record.message.clone(),
        created_at: record.created_at,
        read: record.read,
        icon: style.icon,
        color: style.color,
        background: style.background,
        age_label: age_label(record.created_at, now),
    }
}

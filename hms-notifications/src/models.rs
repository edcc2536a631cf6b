use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

const LOCAL_SUFFIX_LEN: usize = 9;

/// Identity of a notification.
///
/// Server-assigned ids are numeric. Optimistic records created on this side
/// carry a composite `"{unix_millis}-{suffix}"` id until a poll replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    Server(u64),
    Local(String),
}

impl NotificationId {
    /// Mint a fresh local id for a record created at `now`.
    pub fn mint_local(now: DateTime<Utc>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(LOCAL_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self::Local(format!("{}-{suffix}", now.timestamp_millis()))
    }

    /// Classify a textual id: all digits is a server id, anything else local.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) if raw.bytes().all(|b| b.is_ascii_digit()) => Self::Server(n),
            _ => Self::Local(raw.to_string()),
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server(n) => write!(f, "{n}"),
            Self::Local(s) => f.write_str(s),
        }
    }
}

impl From<u64> for NotificationId {
    fn from(n: u64) -> Self {
        Self::Server(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Emergency,
    Appointment,
    Payment,
    System,
    Success,
    Error,
    Info,
    Lab,
    #[serde(other)]
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Appointment => "appointment",
            Self::Payment => "payment",
            Self::System => "system",
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Lab => "lab",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub category: Category,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl NotificationRecord {
    /// An unread optimistic record with a freshly minted local id.
    pub fn local(
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::mint_local(now),
            category,
            title: title.into(),
            message: message.into(),
            created_at: now,
            read: false,
        }
    }
}

// ─── Wire types ─────────────────────────────────────────────────────────────

/// One entry of `GET /notifications`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNotification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl From<RawNotification> for NotificationRecord {
    fn from(raw: RawNotification) -> Self {
        Self {
            id: raw.id,
            category: raw.category,
            title: raw.title,
            message: raw.message,
            created_at: raw.timestamp,
            read: raw.read,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotificationsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub notifications: Vec<RawNotification>,
    #[serde(default)]
    pub message: Option<String>,
}

use crate::{AnnouncementId, NewsId, Timestamp};
use serde::{Deserialize, Serialize};

/// Priority of announcements and news items
///
/// Announcements only use `Normal`, `High` and `Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub const FOR_NEWS: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];
    pub const FOR_ANNOUNCEMENTS: [Priority; 3] =
        [Priority::Normal, Priority::High, Priority::Urgent];

    pub fn code(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Priority::Urgent => "Dringend",
            Priority::High => "Hoch",
            Priority::Normal => "Normal",
            Priority::Low => "Niedrig",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::FOR_NEWS.into_iter().find(|p| p.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub valid_from: Option<Timestamp>,
    #[serde(default)]
    pub valid_until: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Body of `POST /announcements` and `PUT /announcements/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementData {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub id: NewsId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

/// Body of `POST /news` and `PUT /news/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsData {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub is_active: bool,
    pub expires_at: Option<Timestamp>,
}

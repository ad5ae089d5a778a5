use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories offered by the submission form. Stored categories stay free-form.
pub const CATEGORIES: &[&str] = &[
    "Feature Request",
    "Bug Report",
    "UI/UX",
    "Performance",
    "Documentation",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackStatus {
    New,
    UnderReview,
    Planned,
    InProgress,
    Completed,
}

impl FeedbackStatus {
    pub const ALL: [FeedbackStatus; 5] = [
        FeedbackStatus::New,
        FeedbackStatus::UnderReview,
        FeedbackStatus::Planned,
        FeedbackStatus::InProgress,
        FeedbackStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackStatus::New => "new",
            FeedbackStatus::UnderReview => "under-review",
            FeedbackStatus::Planned => "planned",
            FeedbackStatus::InProgress => "in-progress",
            FeedbackStatus::Completed => "completed",
        }
    }

    /// Human-readable label, e.g. "Under Review".
    pub fn label(self) -> &'static str {
        match self {
            FeedbackStatus::New => "New",
            FeedbackStatus::UnderReview => "Under Review",
            FeedbackStatus::Planned => "Planned",
            FeedbackStatus::InProgress => "In Progress",
            FeedbackStatus::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
    }

    /// Unreviewed items never appear on the roadmap.
    pub fn is_on_roadmap(self) -> bool {
        !matches!(self, FeedbackStatus::New | FeedbackStatus::UnderReview)
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub votes: i64,
    pub status: FeedbackStatus,
    #[serde(with = "crate::models::dates::required")]
    pub created_at: DateTime<Utc>,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl FeedbackItem {
    pub fn apply_vote(&mut self, direction: VoteDirection) {
        self.votes += direction.delta();
    }
}

/// What an end user fills in on the submission form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub wants_updates: bool,
}

/// Administrator-authored fields; status is freely chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDraft {
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: FeedbackStatus,
}

impl FeedbackItem {
    pub fn from_submission(id: String, submission: &FeedbackSubmission, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: submission.title.trim().to_string(),
            description: submission.description.trim().to_string(),
            votes: 0,
            status: FeedbackStatus::New,
            created_at: now,
            category: submission.category.clone(),
        }
    }

    pub fn from_draft(id: String, draft: &FeedbackDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            votes: 0,
            status: draft.status,
            created_at: now,
            category: draft.category.clone(),
        }
    }
}

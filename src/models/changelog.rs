use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogType {
    Feature,
    Improvement,
    Bugfix,
}

impl ChangelogType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangelogType::Feature => "feature",
            ChangelogType::Improvement => "improvement",
            ChangelogType::Bugfix => "bugfix",
        }
    }
}

impl fmt::Display for ChangelogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogStatus {
    Draft,
    Scheduled,
    Published,
}

impl ChangelogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangelogStatus::Draft => "draft",
            ChangelogStatus::Scheduled => "scheduled",
            ChangelogStatus::Published => "published",
        }
    }

    /// Statuses reachable from `self`.
    ///
    /// - `draft`     -> `scheduled`, `published`
    /// - `scheduled` -> `scheduled` (reschedule), `published`, `draft`
    /// - `published` -> `draft` (unpublish)
    pub fn valid_transitions(self) -> &'static [ChangelogStatus] {
        match self {
            ChangelogStatus::Draft => &[ChangelogStatus::Scheduled, ChangelogStatus::Published],
            ChangelogStatus::Scheduled => &[
                ChangelogStatus::Scheduled,
                ChangelogStatus::Published,
                ChangelogStatus::Draft,
            ],
            ChangelogStatus::Published => &[ChangelogStatus::Draft],
        }
    }

    pub fn validate_transition(self, next: ChangelogStatus) -> Result<(), AppError> {
        if self.valid_transitions().contains(&next) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Cannot transition changelog entry from '{}' to '{}'",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(with = "crate::models::dates::required")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: ChangelogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
    pub status: ChangelogStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::models::dates::optional"
    )]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::models::dates::optional"
    )]
    pub published_at: Option<DateTime<Utc>>,
}

impl ChangelogEntry {
    /// `scheduled_for` while scheduled, the reference `date` otherwise.
    pub fn effective_date(&self) -> DateTime<Utc> {
        match (self.status, self.scheduled_for) {
            (ChangelogStatus::Scheduled, Some(at)) => at,
            _ => self.date,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ChangelogStatus::Published
    }

    /// `scheduled_for` must be set exactly when the entry is scheduled.
    pub fn check_schedule(&self) -> Result<(), AppError> {
        let scheduled = self.status == ChangelogStatus::Scheduled;
        if scheduled == self.scheduled_for.is_some() {
            return Ok(());
        }
        Err(AppError::Validation(if scheduled {
            format!("Scheduled entry {} has no scheduledFor date", self.id)
        } else {
            format!("Entry {} is {} but has a scheduledFor date", self.id, self.status.as_str())
        }))
    }

    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.status.validate_transition(ChangelogStatus::Published)?;
        self.status = ChangelogStatus::Published;
        self.scheduled_for = None;
        self.published_at = Some(now);
        Ok(())
    }

    pub fn schedule(&mut self, at: DateTime<Utc>) -> Result<(), AppError> {
        self.status.validate_transition(ChangelogStatus::Scheduled)?;
        self.status = ChangelogStatus::Scheduled;
        self.scheduled_for = Some(at);
        Ok(())
    }

    /// Back to draft. `published_at` is kept as a record of the last publication.
    pub fn unpublish(&mut self) -> Result<(), AppError> {
        self.status.validate_transition(ChangelogStatus::Draft)?;
        self.status = ChangelogStatus::Draft;
        self.scheduled_for = None;
        Ok(())
    }

    /// Replace this entry with an edited copy of itself.
    ///
    /// A status change must be a valid transition. `published_at` is owned
    /// by the lifecycle: it is stamped with `now` when the edit publishes and
    /// otherwise keeps its stored value, whatever `edited` carries.
    pub fn apply_update(&mut self, edited: ChangelogEntry, now: DateTime<Utc>) -> Result<(), AppError> {
        edited.check_schedule()?;
        if edited.status != self.status {
            self.status.validate_transition(edited.status)?;
        }

        let published_at = if edited.is_published() && !self.is_published() {
            Some(now)
        } else {
            self.published_at
        };

        *self = ChangelogEntry {
            id: std::mem::take(&mut self.id),
            published_at,
            ..edited
        };
        Ok(())
    }
}

/// Administrator-editable content of an entry. Lifecycle is changed through
/// [`ChangelogEntry::publish`], [`ChangelogEntry::schedule`] and
/// [`ChangelogEntry::unpublish`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogDraft {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: ChangelogType,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub additional_details: Option<String>,
}

impl ChangelogDraft {
    pub fn into_entry(self, id: String, now: DateTime<Utc>) -> ChangelogEntry {
        ChangelogEntry {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            date: now,
            entry_type: self.entry_type,
            image: self.image.filter(|value| !value.trim().is_empty()),
            additional_details: self.additional_details.filter(|value| !value.trim().is_empty()),
            status: ChangelogStatus::Draft,
            scheduled_for: None,
            published_at: None,
        }
    }

    pub fn apply_to(self, entry: &mut ChangelogEntry) {
        entry.title = self.title.trim().to_string();
        entry.description = self.description.trim().to_string();
        entry.entry_type = self.entry_type;
        entry.image = self.image.filter(|value| !value.trim().is_empty());
        entry.additional_details = self.additional_details.filter(|value| !value.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dates::utc_date;

    fn draft_entry() -> ChangelogEntry {
        ChangelogDraft {
            title: "Faster search".to_string(),
            description: "Index rebuilt".to_string(),
            entry_type: ChangelogType::Improvement,
            image: Some("  ".to_string()),
            additional_details: None,
        }
        .into_entry("c-1".to_string(), utc_date(2024, 2, 15).unwrap())
    }

    #[test]
    fn new_entries_start_as_draft_without_blank_image() {
        let entry = draft_entry();
        assert_eq!(entry.status, ChangelogStatus::Draft);
        assert!(entry.image.is_none());
        assert!(entry.scheduled_for.is_none());
    }

    #[test]
    fn schedule_then_publish_clears_schedule_and_stamps_publication() {
        let mut entry = draft_entry();
        entry.schedule(utc_date(2024, 3, 1).unwrap()).unwrap();
        assert_eq!(entry.effective_date(), utc_date(2024, 3, 1).unwrap());

        entry.publish(utc_date(2024, 3, 2).unwrap()).unwrap();
        assert_eq!(entry.status, ChangelogStatus::Published);
        assert!(entry.scheduled_for.is_none());
        assert_eq!(entry.published_at, Some(utc_date(2024, 3, 2).unwrap()));
        assert_eq!(entry.effective_date(), utc_date(2024, 2, 15).unwrap());
    }

    #[test]
    fn unpublish_keeps_publication_timestamp() {
        let mut entry = draft_entry();
        entry.publish(utc_date(2024, 3, 2).unwrap()).unwrap();
        entry.unpublish().unwrap();
        assert_eq!(entry.status, ChangelogStatus::Draft);
        assert_eq!(entry.published_at, Some(utc_date(2024, 3, 2).unwrap()));
    }

    #[test]
    fn published_entries_cannot_be_rescheduled() {
        let mut entry = draft_entry();
        entry.publish(utc_date(2024, 3, 2).unwrap()).unwrap();
        assert!(entry.schedule(utc_date(2024, 4, 1).unwrap()).is_err());
        assert!(entry.publish(utc_date(2024, 4, 1).unwrap()).is_err());
    }

    #[test]
    fn schedule_date_must_match_status() {
        let mut entry = draft_entry();
        assert!(entry.check_schedule().is_ok());

        entry.status = ChangelogStatus::Scheduled;
        assert!(entry.check_schedule().is_err());

        entry.schedule(utc_date(2024, 3, 1).unwrap()).unwrap();
        assert!(entry.check_schedule().is_ok());
        entry.unpublish().unwrap();
        assert!(entry.check_schedule().is_ok());
    }

    #[test]
    fn edits_cannot_reschedule_a_published_entry() {
        let mut stored = draft_entry();
        stored.publish(utc_date(2024, 3, 2).unwrap()).unwrap();

        let edited = ChangelogEntry {
            status: ChangelogStatus::Scheduled,
            scheduled_for: Some(utc_date(2030, 1, 1).unwrap()),
            ..stored.clone()
        };
        let err = stored
            .apply_update(edited, utc_date(2024, 4, 1).unwrap())
            .expect_err("published -> scheduled");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stored.status, ChangelogStatus::Published);
    }

    #[test]
    fn edits_keep_publication_stamp_unless_publishing() {
        let mut stored = draft_entry();
        stored.publish(utc_date(2024, 3, 2).unwrap()).unwrap();

        let retitled = ChangelogEntry {
            title: "Much faster search".to_string(),
            status: ChangelogStatus::Draft,
            published_at: None,
            ..stored.clone()
        };
        stored.apply_update(retitled, utc_date(2024, 4, 1).unwrap()).unwrap();
        assert_eq!(stored.title, "Much faster search");
        assert_eq!(stored.status, ChangelogStatus::Draft);
        assert_eq!(stored.published_at, Some(utc_date(2024, 3, 2).unwrap()));

        let republished = ChangelogEntry {
            status: ChangelogStatus::Published,
            published_at: Some(utc_date(1999, 1, 1).unwrap()),
            ..stored.clone()
        };
        stored.apply_update(republished, utc_date(2024, 4, 1).unwrap()).unwrap();
        assert_eq!(stored.published_at, Some(utc_date(2024, 4, 1).unwrap()));
    }

    #[test]
    fn optional_dates_absent_in_json_read_as_none() {
        let json = r#"{"id":"1","title":"t","description":"d","date":"2024-02-10","type":"bugfix","status":"draft","scheduledFor":null}"#;
        let entry: ChangelogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, utc_date(2024, 2, 10).unwrap());
        assert!(entry.scheduled_for.is_none());
        assert!(entry.published_at.is_none());
    }
}

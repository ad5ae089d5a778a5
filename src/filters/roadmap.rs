use crate::filters::feedback::sort_feedback;
use crate::filters::params::{CategoryFilter, FeedbackSort};
use crate::models::feedback::{FeedbackItem, FeedbackStatus};
use crate::models::session::Session;
use serde::Serialize;

/// Roadmap items: category filter, unreviewed items dropped, then sorted.
///
/// `session` is accepted so role-aware rules can be added later; it does not
/// change the output today.
pub fn filter_roadmap(
    items: &[FeedbackItem],
    category: &CategoryFilter,
    sort: FeedbackSort,
    _session: &Session,
) -> Vec<FeedbackItem> {
    let mut filtered: Vec<FeedbackItem> = items
        .iter()
        .filter(|item| category.matches(&item.category))
        .filter(|item| item.status.is_on_roadmap())
        .cloned()
        .collect();

    sort_feedback(&mut filtered, sort);
    filtered
}

/// The three roadmap columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapBoard {
    pub planned: Vec<FeedbackItem>,
    pub in_progress: Vec<FeedbackItem>,
    pub completed: Vec<FeedbackItem>,
}

impl RoadmapBoard {
    pub const COLUMNS: [(FeedbackStatus, &'static str); 3] = [
        (FeedbackStatus::Planned, "Planned"),
        (FeedbackStatus::InProgress, "In Progress"),
        (FeedbackStatus::Completed, "Completed"),
    ];

    /// Split an already filtered and sorted sequence by status, keeping order.
    pub fn partition(items: &[FeedbackItem]) -> Self {
        let column = |status: FeedbackStatus| -> Vec<FeedbackItem> {
            items
                .iter()
                .filter(|item| item.status == status)
                .cloned()
                .collect()
        };

        Self {
            planned: column(FeedbackStatus::Planned),
            in_progress: column(FeedbackStatus::InProgress),
            completed: column(FeedbackStatus::Completed),
        }
    }

    pub fn column(&self, status: FeedbackStatus) -> &[FeedbackItem] {
        match status {
            FeedbackStatus::Planned => &self.planned,
            FeedbackStatus::InProgress => &self.in_progress,
            FeedbackStatus::Completed => &self.completed,
            FeedbackStatus::New | FeedbackStatus::UnderReview => &[],
        }
    }

    /// Column titles with their items, in display order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &[FeedbackItem])> + '_ {
        Self::COLUMNS
            .into_iter()
            .map(move |(status, title)| (title, self.column(status)))
    }

    pub fn len(&self) -> usize {
        self.planned.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Filter then partition, as the roadmap tab renders it.
pub fn roadmap_board(
    items: &[FeedbackItem],
    category: &CategoryFilter,
    sort: FeedbackSort,
    session: &Session,
) -> RoadmapBoard {
    RoadmapBoard::partition(&filter_roadmap(items, category, sort, session))
}

use crate::filters::params::{CategoryFilter, FeedbackSort, StatusFilter};
use crate::models::feedback::FeedbackItem;
use std::cmp::Ordering;

/// Visible feedback list: category and status filters, then a stable sort.
pub fn filter_feedback(
    items: &[FeedbackItem],
    category: &CategoryFilter,
    status: &StatusFilter,
    sort: FeedbackSort,
) -> Vec<FeedbackItem> {
    let mut filtered: Vec<FeedbackItem> = items
        .iter()
        .filter(|item| category.matches(&item.category))
        .filter(|item| status.matches(item.status.as_str()))
        .cloned()
        .collect();

    sort_feedback(&mut filtered, sort);
    log::debug!(
        "feedback filter kept {} of {} items (sort {})",
        filtered.len(),
        items.len(),
        sort.as_str()
    );
    filtered
}

/// `sort_by` is stable, so ties keep their incoming order.
pub(crate) fn sort_feedback(items: &mut [FeedbackItem], sort: FeedbackSort) {
    if sort == FeedbackSort::Unsorted {
        return;
    }
    items.sort_by(|a, b| compare_feedback(a, b, sort));
}

fn compare_feedback(a: &FeedbackItem, b: &FeedbackItem, sort: FeedbackSort) -> Ordering {
    match sort {
        FeedbackSort::VotesDesc => b.votes.cmp(&a.votes),
        FeedbackSort::VotesAsc => a.votes.cmp(&b.votes),
        FeedbackSort::DateDesc => b.created_at.cmp(&a.created_at),
        FeedbackSort::DateAsc => a.created_at.cmp(&b.created_at),
        FeedbackSort::Unsorted => Ordering::Equal,
    }
}

use crate::filters::params::{ChangelogSort, TypeFilter};
use crate::models::changelog::ChangelogEntry;
use crate::models::session::Session;
use std::cmp::Ordering;

/// Visible changelog entries.
///
/// Non-admin callers only ever see published entries; a scheduled entry whose
/// date has passed stays hidden until it is explicitly published. Admin
/// callers see every entry they pass in.
pub fn filter_changelog(
    entries: &[ChangelogEntry],
    entry_type: &TypeFilter,
    sort: ChangelogSort,
    session: &Session,
) -> Vec<ChangelogEntry> {
    let mut filtered: Vec<ChangelogEntry> = entries
        .iter()
        .filter(|entry| session.is_admin || entry.is_published())
        .filter(|entry| entry_type.matches(entry.entry_type.as_str()))
        .cloned()
        .collect();

    if sort != ChangelogSort::Unsorted {
        filtered.sort_by(|a, b| compare_entries(a, b, sort));
    }
    log::debug!(
        "changelog filter kept {} of {} entries (admin: {}, sort {})",
        filtered.len(),
        entries.len(),
        session.is_admin,
        sort.as_str()
    );
    filtered
}

fn compare_entries(a: &ChangelogEntry, b: &ChangelogEntry, sort: ChangelogSort) -> Ordering {
    match sort {
        ChangelogSort::DateDesc => b.effective_date().cmp(&a.effective_date()),
        ChangelogSort::DateAsc => a.effective_date().cmp(&b.effective_date()),
        ChangelogSort::Type => a.entry_type.as_str().cmp(b.entry_type.as_str()),
        ChangelogSort::Unsorted => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::params::parse;
    use crate::models::changelog::{ChangelogStatus, ChangelogType};
    use crate::models::dates::utc_date;
    use crate::models::defaults::default_changelog;

    fn ids(entries: &[ChangelogEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn anonymous_callers_only_see_published_entries() {
        let mut entries = default_changelog();
        // Scheduled date long past: still hidden.
        entries[1].scheduled_for = Some(utc_date(2000, 1, 1).unwrap());
        let out = filter_changelog(&entries, &TypeFilter::All, ChangelogSort::DateDesc, &Session::anonymous());
        assert_eq!(ids(&out), vec!["1"]);
    }

    #[test]
    fn scheduled_entries_sort_by_scheduled_date_for_admins() {
        let entries = default_changelog();
        let out = filter_changelog(&entries, &TypeFilter::All, ChangelogSort::DateDesc, &Session::admin());
        // 2024-03-01 (scheduled), 2024-02-20 (published), 2024-02-10 (draft)
        assert_eq!(ids(&out), vec!["2", "1", "3"]);

        let out = filter_changelog(&entries, &TypeFilter::All, ChangelogSort::DateAsc, &Session::admin());
        assert_eq!(ids(&out), vec!["3", "1", "2"]);
    }

    #[test]
    fn scheduled_without_date_falls_back_to_reference_date() {
        let mut entries = default_changelog();
        entries[1].scheduled_for = None;
        let out = filter_changelog(&entries, &TypeFilter::All, ChangelogSort::DateDesc, &Session::admin());
        assert_eq!(ids(&out), vec!["1", "2", "3"]);
    }

    #[test]
    fn type_filter_is_case_insensitive() {
        let entries = default_changelog();
        let out = filter_changelog(&entries, &parse("Bugfix"), ChangelogSort::DateDesc, &Session::admin());
        assert_eq!(ids(&out), vec!["3"]);
        let out = filter_changelog(&entries, &parse("all"), ChangelogSort::DateDesc, &Session::admin());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn type_sort_is_lexicographic() {
        let entries = default_changelog();
        let out = filter_changelog(&entries, &TypeFilter::All, ChangelogSort::Type, &Session::admin());
        let types: Vec<ChangelogType> = out.iter().map(|entry| entry.entry_type).collect();
        assert_eq!(
            types,
            vec![ChangelogType::Bugfix, ChangelogType::Feature, ChangelogType::Improvement]
        );
    }

    #[test]
    fn drafts_stay_hidden_from_anonymous_callers_under_any_type() {
        let entries = default_changelog();
        for selector in ["All", "feature", "improvement", "bugfix"] {
            let out = filter_changelog(&entries, &parse(selector), ChangelogSort::Type, &Session::anonymous());
            assert!(out.iter().all(|entry| entry.status == ChangelogStatus::Published));
        }
    }
}

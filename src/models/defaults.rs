use crate::models::changelog::{ChangelogEntry, ChangelogStatus, ChangelogType};
use crate::models::dates::utc_date;
use crate::models::feedback::{FeedbackItem, FeedbackStatus};
use crate::models::user::{User, SEEDED_ADMIN_EMAIL};
use chrono::{DateTime, Utc};

// Seed dates are literals; `seed_dates_are_real_days` keeps them valid.
fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    utc_date(year, month, day).unwrap_or_default()
}

/// Feedback shown on a fresh install.
pub fn default_feedback() -> Vec<FeedbackItem> {
    vec![
        FeedbackItem {
            id: "1".to_string(),
            title: "Dark mode support".to_string(),
            description: "Add dark mode support for better visibility in low-light conditions"
                .to_string(),
            votes: 156,
            status: FeedbackStatus::InProgress,
            created_at: seed_date(2024, 2, 15),
            category: "UI/UX".to_string(),
        },
        FeedbackItem {
            id: "2".to_string(),
            title: "Mobile app".to_string(),
            description: "Native mobile application for iOS and Android".to_string(),
            votes: 243,
            status: FeedbackStatus::Planned,
            created_at: seed_date(2024, 2, 10),
            category: "Platform".to_string(),
        },
        FeedbackItem {
            id: "3".to_string(),
            title: "API Documentation".to_string(),
            description: "Comprehensive API documentation with examples".to_string(),
            votes: 89,
            status: FeedbackStatus::Completed,
            created_at: seed_date(2024, 2, 1),
            category: "Developer Tools".to_string(),
        },
    ]
}

/// Changelog shown on a fresh install: one entry per lifecycle status.
pub fn default_changelog() -> Vec<ChangelogEntry> {
    vec![
        ChangelogEntry {
            id: "1".to_string(),
            title: "New Dashboard Layout".to_string(),
            description: "The dashboard has been redesigned around usability: key metrics are \
                          grouped together and navigation is more direct."
                .to_string(),
            date: seed_date(2024, 2, 20),
            entry_type: ChangelogType::Feature,
            image: Some(
                "https://images.unsplash.com/photo-1551288049-bebda4e38f71?auto=format&fit=crop&q=80&w=1000"
                    .to_string(),
            ),
            additional_details: Some(
                "• Reorganized navigation\n• Customizable widgets\n• Improved data visualization\n• Better mobile layout"
                    .to_string(),
            ),
            status: ChangelogStatus::Published,
            scheduled_for: None,
            published_at: Some(seed_date(2024, 2, 20)),
        },
        ChangelogEntry {
            id: "2".to_string(),
            title: "Performance Improvements".to_string(),
            description: "Page loads and server response times are down across the platform."
                .to_string(),
            date: seed_date(2024, 2, 15),
            entry_type: ChangelogType::Improvement,
            image: Some(
                "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&q=80&w=1000"
                    .to_string(),
            ),
            additional_details: Some(
                "• Lazy loading for images\n• Optimized database queries\n• Compressed static assets"
                    .to_string(),
            ),
            status: ChangelogStatus::Scheduled,
            scheduled_for: Some(seed_date(2024, 3, 1)),
            published_at: None,
        },
        ChangelogEntry {
            id: "3".to_string(),
            title: "Fixed Login Issues".to_string(),
            description: "Several authentication problems affecting sign-in have been fixed."
                .to_string(),
            date: seed_date(2024, 2, 10),
            entry_type: ChangelogType::Bugfix,
            image: Some(
                "https://images.unsplash.com/photo-1633265486064-086b219458ec?auto=format&fit=crop&q=80&w=1000"
                    .to_string(),
            ),
            additional_details: Some(
                "• Token expiration handling\n• SSO integration fixes\n• Clearer error messages"
                    .to_string(),
            ),
            status: ChangelogStatus::Draft,
            scheduled_for: None,
            published_at: None,
        },
    ]
}

pub fn seeded_admin(now: DateTime<Utc>) -> User {
    User {
        id: "1".to_string(),
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        email: SEEDED_ADMIN_EMAIL.to_string(),
        password: "admin123".to_string(),
        is_admin: true,
        created_at: now,
    }
}

use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use feedback_board_lib::commands::db::{Collection, RecordStore};
use feedback_board_lib::commands::notify::{Mailer, NotifyOutcome, WelcomeEmail, WelcomeNotifier};
use feedback_board_lib::commands::records::{changelog_crud, feedback_crud, user_crud};
use feedback_board_lib::commands::settings::{get_settings, save_settings};
use feedback_board_lib::commands::shell::{AppShell, NoticeKind, Tab};
use feedback_board_lib::error::AppError;
use feedback_board_lib::filters::params::FeedbackSort;
use feedback_board_lib::models::changelog::{ChangelogEntry, ChangelogStatus, ChangelogType};
use feedback_board_lib::models::dates::utc_date;
use feedback_board_lib::models::defaults::{default_changelog, default_feedback};
use feedback_board_lib::models::feedback::{
    FeedbackItem, FeedbackStatus, FeedbackSubmission, VoteDirection,
};
use feedback_board_lib::models::user::NewUser;

fn create_workspace() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let workspace_path = temp_dir.path().to_string_lossy().to_string();
    (temp_dir, workspace_path)
}

/// Workspace whose settings make login and notifications instant.
async fn create_fast_workspace() -> (TempDir, String) {
    let (tmp, workspace_path) = create_workspace();
    save_settings(
        workspace_path.clone(),
        json!({ "loginLatencyMs": 0, "welcomeEmailDelayMs": 0 }),
    )
    .await
    .expect("save settings");
    (tmp, workspace_path)
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<WelcomeEmail>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &WelcomeEmail) -> Result<(), String> {
        self.sent.lock().expect("mailer lock").push(email.clone());
        Ok(())
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: "engine".to_string(),
        is_admin: false,
    }
}

#[tokio::test]
async fn settings_commands_round_trip_and_merge_partial_updates() {
    let (_tmp, workspace_path) = create_workspace();

    let initial = get_settings(workspace_path.clone())
        .await
        .expect("load settings");
    assert_eq!(initial["loginLatencyMs"], json!(500));
    assert_eq!(initial["welcomeEmailDelayMs"], json!(1000));

    let saved = save_settings(
        workspace_path.clone(),
        json!({
            "loginLatencyMs": 0,
            "defaultFeedbackSort": "date-desc"
        }),
    )
    .await
    .expect("save settings");

    assert_eq!(saved["loginLatencyMs"], json!(0));
    assert_eq!(saved["defaultFeedbackSort"], json!("date-desc"));
    assert_eq!(saved["welcomeEmailDelayMs"], initial["welcomeEmailDelayMs"]);

    let reloaded = get_settings(workspace_path.clone())
        .await
        .expect("reload settings");
    assert_eq!(reloaded, saved);

    let shell = AppShell::open(&workspace_path).expect("open shell");
    assert_eq!(shell.ui().feedback_filters.sort, FeedbackSort::DateDesc);
}

#[tokio::test]
async fn feedback_commands_support_full_crud_contract() {
    let (_tmp, workspace_path) = create_workspace();

    let item = FeedbackItem {
        id: "fb-1".to_string(),
        title: "Keyboard shortcuts".to_string(),
        description: "Let me vote with the keyboard".to_string(),
        votes: 0,
        status: FeedbackStatus::UnderReview,
        created_at: utc_date(2024, 2, 20).unwrap(),
        category: "UI/UX".to_string(),
    };

    let created = feedback_crud(workspace_path.clone(), "create".to_string(), Some(item.clone()), None)
        .await
        .expect("create feedback");
    assert_eq!(created["status"], json!("created"));

    let duplicate = feedback_crud(workspace_path.clone(), "create".to_string(), Some(item.clone()), None).await;
    assert!(duplicate.expect_err("duplicate id").starts_with("DB error"));

    let read = feedback_crud(workspace_path.clone(), "read".to_string(), None, Some(item.id.clone()))
        .await
        .expect("read feedback");
    assert_eq!(read["title"], json!(item.title.clone()));
    assert_eq!(read["status"], json!("under-review"));
    assert_eq!(read["createdAt"], json!("2024-02-20T00:00:00Z"));

    let up = feedback_crud(workspace_path.clone(), "upvote".to_string(), None, Some(item.id.clone()))
        .await
        .expect("upvote");
    assert_eq!(up["votes"], json!(1));
    let down = feedback_crud(workspace_path.clone(), "downvote".to_string(), None, Some(item.id.clone()))
        .await
        .expect("downvote");
    assert_eq!(down["votes"], json!(0));

    let updated = feedback_crud(
        workspace_path.clone(),
        "update".to_string(),
        Some(FeedbackItem {
            status: FeedbackStatus::Planned,
            ..item.clone()
        }),
        None,
    )
    .await
    .expect("update feedback");
    assert_eq!(updated["status"], json!("updated"));

    let ghost = feedback_crud(
        workspace_path.clone(),
        "update".to_string(),
        Some(FeedbackItem {
            id: "ghost".to_string(),
            ..item.clone()
        }),
        None,
    )
    .await
    .expect("update unknown feedback");
    assert_eq!(ghost["status"], json!("unchanged"));

    let list = feedback_crud(workspace_path.clone(), "list".to_string(), None, None)
        .await
        .expect("list feedback");
    let items = list.as_array().expect("feedback list array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], json!("planned"));

    let deleted = feedback_crud(workspace_path.clone(), "delete".to_string(), None, Some(item.id.clone()))
        .await
        .expect("delete feedback");
    assert_eq!(deleted["status"], json!("deleted"));

    let missing = feedback_crud(workspace_path.clone(), "read".to_string(), None, Some(item.id.clone()))
        .await
        .expect("read deleted feedback");
    assert!(missing.is_null());

    let unknown = feedback_crud(workspace_path.clone(), "archive".to_string(), None, None).await;
    assert_eq!(unknown.expect_err("unknown op"), "Unknown operation: archive");
}

#[tokio::test]
async fn changelog_dates_survive_the_store() {
    let (_tmp, workspace_path) = create_workspace();

    let entry = ChangelogEntry {
        id: "cl-9".to_string(),
        title: "Dark mode".to_string(),
        description: "Theme follows the system".to_string(),
        date: utc_date(2024, 2, 25).unwrap(),
        entry_type: ChangelogType::Feature,
        image: None,
        additional_details: Some("Toggle in settings".to_string()),
        status: ChangelogStatus::Scheduled,
        scheduled_for: Some(utc_date(2024, 3, 10).unwrap()),
        published_at: None,
    };

    changelog_crud(workspace_path.clone(), "create".to_string(), Some(entry.clone()), None)
        .await
        .expect("create entry");

    let read = changelog_crud(workspace_path.clone(), "read".to_string(), None, Some(entry.id.clone()))
        .await
        .expect("read entry");
    assert_eq!(read["type"], json!("feature"));
    assert_eq!(read["scheduledFor"], json!("2024-03-10T00:00:00Z"));
    assert!(read.get("publishedAt").is_none());

    let decoded: ChangelogEntry = serde_json::from_value(read).expect("decode entry");
    assert_eq!(decoded, entry);

    let published = changelog_crud(workspace_path.clone(), "publish".to_string(), None, Some(entry.id.clone()))
        .await
        .expect("publish entry");
    assert_eq!(published["status"], json!("published"));

    let again = changelog_crud(workspace_path.clone(), "publish".to_string(), None, Some(entry.id.clone())).await;
    assert!(again.expect_err("already published").contains("Cannot transition"));

    let unscheduled = changelog_crud(
        workspace_path.clone(),
        "create".to_string(),
        Some(ChangelogEntry {
            id: "cl-10".to_string(),
            scheduled_for: None,
            ..entry.clone()
        }),
        None,
    )
    .await;
    assert!(unscheduled.is_err());
}

#[tokio::test]
async fn changelog_updates_follow_the_lifecycle() {
    let (_tmp, workspace_path) = create_fast_workspace().await;
    drop(AppShell::open(&workspace_path).expect("seed workspace"));

    let read = changelog_crud(workspace_path.clone(), "read".to_string(), None, Some("1".to_string()))
        .await
        .expect("read seeded entry");
    let published: ChangelogEntry = serde_json::from_value(read).expect("decode entry");
    assert_eq!(published.status, ChangelogStatus::Published);

    let rescheduled = changelog_crud(
        workspace_path.clone(),
        "update".to_string(),
        Some(ChangelogEntry {
            status: ChangelogStatus::Scheduled,
            scheduled_for: Some(utc_date(2030, 1, 1).unwrap()),
            ..published.clone()
        }),
        None,
    )
    .await;
    assert!(rescheduled.expect_err("published -> scheduled").contains("Cannot transition"));

    let stored = changelog_crud(workspace_path.clone(), "read".to_string(), None, Some("1".to_string()))
        .await
        .expect("read after rejected update");
    assert_eq!(stored["status"], json!("published"));
    assert!(stored.get("scheduledFor").is_none());

    let drafted = changelog_crud(
        workspace_path.clone(),
        "update".to_string(),
        Some(ChangelogEntry {
            title: "Dashboard, revisited".to_string(),
            status: ChangelogStatus::Draft,
            published_at: None,
            ..published.clone()
        }),
        None,
    )
    .await
    .expect("unpublish through update");
    assert_eq!(drafted["status"], json!("updated"));

    let stored = changelog_crud(workspace_path.clone(), "read".to_string(), None, Some("1".to_string()))
        .await
        .expect("read after unpublish");
    assert_eq!(stored["status"], json!("draft"));
    assert_eq!(stored["title"], json!("Dashboard, revisited"));
    assert_eq!(stored["publishedAt"], json!("2024-02-20T00:00:00Z"));
}

#[tokio::test]
async fn seeding_happens_once_per_workspace() {
    let (_tmp, workspace_path) = create_workspace();

    let store = RecordStore::open(&workspace_path).expect("open store");
    let first = store
        .seed_if_empty(&default_feedback(), &default_changelog())
        .expect("seed");
    assert!(first.any());
    drop(store);

    let store = RecordStore::open(&workspace_path).expect("reopen store");
    let second = store
        .seed_if_empty(&default_feedback(), &default_changelog())
        .expect("seed again");
    assert!(!second.any());
    assert_eq!(store.count(Collection::Feedback).expect("count"), 3);
    assert_eq!(store.get_all::<FeedbackItem>().expect("list"), default_feedback());
}

#[tokio::test]
async fn admin_session_survives_reopen_until_logout() {
    let (_tmp, workspace_path) = create_fast_workspace().await;

    let mut shell = AppShell::open(&workspace_path).expect("open shell");
    assert!(!shell.session().is_admin);
    shell.login("admin", "admin123").await.expect("login");
    drop(shell);

    let mut shell = AppShell::open(&workspace_path).expect("reopen shell");
    assert!(shell.session().is_admin);
    shell.set_tab(Tab::Admin);
    shell.logout().expect("logout");
    assert_eq!(shell.ui().active_tab, Tab::Feedback);
    drop(shell);

    let shell = AppShell::open(&workspace_path).expect("reopen after logout");
    assert!(!shell.session().is_admin);
}

#[tokio::test]
async fn creating_a_user_sends_a_welcome_email_in_the_background() {
    let (_tmp, workspace_path) = create_fast_workspace().await;

    let mailer = Arc::new(RecordingMailer::default());
    let notifier = WelcomeNotifier::new(mailer.clone(), Duration::ZERO, "https://board.example/login");
    let mut shell = AppShell::open(&workspace_path)
        .expect("open shell")
        .with_notifier(notifier);
    let mut outcomes = shell.subscribe_notifications();

    shell.login("admin", "admin123").await.expect("login");
    let user = shell.create_user(new_user("ada@example.com")).expect("create user");
    assert_eq!(shell.admin_view().expect("admin view").users.len(), 2);

    let outcome = outcomes.recv().await.expect("notification outcome");
    assert_eq!(
        outcome,
        NotifyOutcome::Sent {
            user_id: user.id.clone(),
            email: "ada@example.com".to_string(),
        }
    );

    let sent = mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Hello Ada Lovelace"));
    assert!(sent[0].body.contains("https://board.example/login"));
}

#[tokio::test]
async fn user_commands_protect_the_seeded_admin() {
    let (_tmp, workspace_path) = create_fast_workspace().await;
    drop(AppShell::open(&workspace_path).expect("seed workspace"));

    let refused = user_crud(workspace_path.clone(), "delete".to_string(), None, None, Some("1".to_string())).await;
    assert!(refused.is_err());

    let created = user_crud(
        workspace_path.clone(),
        "create".to_string(),
        Some(new_user("grace@example.com")),
        None,
        None,
    )
    .await
    .expect("create user");
    let id = created["id"].as_str().expect("user id").to_string();

    let list = user_crud(workspace_path.clone(), "list".to_string(), None, None, None)
        .await
        .expect("list users");
    assert_eq!(list.as_array().expect("user list").len(), 2);

    user_crud(workspace_path.clone(), "delete".to_string(), None, None, Some(id))
        .await
        .expect("delete user");
    let list = user_crud(workspace_path.clone(), "list".to_string(), None, None, None)
        .await
        .expect("list users");
    assert_eq!(list.as_array().expect("user list").len(), 1);
}

#[tokio::test]
async fn public_flows_do_not_need_a_session() {
    let (_tmp, workspace_path) = create_fast_workspace().await;
    let mut shell = AppShell::open(&workspace_path).expect("open shell");

    let before = shell.feedback_view().iter().find(|item| item.id == "3").map(|item| item.votes);
    shell.vote("3", VoteDirection::Up).expect("vote up");
    shell.vote("3", VoteDirection::Down).expect("vote down");
    let after = shell.feedback_view().iter().find(|item| item.id == "3").map(|item| item.votes);
    assert_eq!(before, after);

    let item = shell
        .submit_feedback(FeedbackSubmission {
            title: "Export to CSV".to_string(),
            category: "Feature Request".to_string(),
            description: "Download all feedback".to_string(),
            email: Some("fan@example.com".to_string()),
            wants_updates: true,
        })
        .expect("submit feedback");
    assert_eq!(item.status, FeedbackStatus::New);

    shell.set_feedback_filters("All", "New", "votes-desc");
    let view = shell.feedback_view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].id, item.id);

    shell.set_roadmap_filters("All", "votes-desc");
    let roadmap = shell.roadmap_view();
    assert!(roadmap.planned.iter().chain(&roadmap.in_progress).chain(&roadmap.completed).all(|i| i.id != item.id));

    let changelog = shell.changelog_view();
    assert!(changelog.iter().all(|entry| entry.status == ChangelogStatus::Published));

    let denied = shell.delete_feedback(&item.id);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert_eq!(shell.take_notice().map(|notice| notice.kind), Some(NoticeKind::Error));
}

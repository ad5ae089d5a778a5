//! Application state and user actions.
//!
//! Every action writes through the [`RecordStore`], re-reads the affected
//! collection in full and leaves the views to be re-derived by the filter
//! engine on the next read. Nothing is updated optimistically.

use crate::commands::auth::AuthGate;
use crate::commands::db::RecordStore;
use crate::commands::notify::{NotifyOutcome, WelcomeNotifier};
use crate::commands::settings::{load_effective_settings, EffectiveSettings};
use crate::error::{AppError, AppResult};
use crate::filters::params::{
    parse, CategoryFilter, ChangelogSort, FeedbackSort, StatusFilter, TypeFilter,
};
use crate::filters::{filter_changelog, filter_feedback, roadmap_board, RoadmapBoard};
use crate::models::changelog::{ChangelogDraft, ChangelogEntry};
use crate::models::defaults::{default_changelog, default_feedback};
use crate::models::feedback::{
    FeedbackDraft, FeedbackItem, FeedbackSubmission, VoteDirection, CATEGORIES,
};
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserPatch};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Feedback,
    Roadmap,
    Changelog,
    Admin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Feedback,
    Changelog,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackFilters {
    pub category: CategoryFilter,
    pub status: StatusFilter,
    pub sort: FeedbackSort,
}

impl FeedbackFilters {
    pub fn parse(category: &str, status: &str, sort: &str) -> Self {
        Self {
            category: parse(category),
            status: parse(status),
            sort: parse(sort),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadmapFilters {
    pub category: CategoryFilter,
    pub sort: FeedbackSort,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangelogFilters {
    pub entry_type: TypeFilter,
    pub sort: ChangelogSort,
}

impl ChangelogFilters {
    pub fn parse(entry_type: &str, sort: &str) -> Self {
        Self {
            entry_type: parse(entry_type),
            sort: parse(sort),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub active_tab: Tab,
    pub admin_tab: AdminTab,
    pub feedback_filters: FeedbackFilters,
    pub roadmap_filters: RoadmapFilters,
    pub changelog_filters: ChangelogFilters,
    pub admin_feedback_filters: FeedbackFilters,
    pub admin_changelog_filters: ChangelogFilters,
    pub submit_modal_open: bool,
    pub login_modal_open: bool,
    pub selected_feedback: Option<String>,
    pub selected_changelog: Option<String>,
    pub selected_user: Option<String>,
    pub notice: Option<Notice>,
}

impl UiState {
    pub fn with_defaults(settings: &EffectiveSettings) -> Self {
        Self {
            feedback_filters: FeedbackFilters {
                sort: settings.default_feedback_sort,
                ..FeedbackFilters::default()
            },
            roadmap_filters: RoadmapFilters {
                sort: settings.default_roadmap_sort,
                ..RoadmapFilters::default()
            },
            changelog_filters: ChangelogFilters {
                sort: settings.default_changelog_sort,
                ..ChangelogFilters::default()
            },
            admin_feedback_filters: FeedbackFilters {
                sort: FeedbackSort::DateDesc,
                ..FeedbackFilters::default()
            },
            ..Self::default()
        }
    }
}

/// Everything the admin panel renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminView {
    pub feedback: Vec<FeedbackItem>,
    pub changelog: Vec<ChangelogEntry>,
    pub users: Vec<User>,
}

pub struct AppShell {
    store: RecordStore,
    auth: AuthGate,
    notifier: WelcomeNotifier,
    session: Session,
    ui: UiState,
    feedback: Vec<FeedbackItem>,
    changelog: Vec<ChangelogEntry>,
    users: Vec<User>,
}

impl AppShell {
    /// Open the store under `workspace_path`, seed it on first run and
    /// restore the previous session.
    pub fn open(workspace_path: &str) -> AppResult<Self> {
        let settings = load_effective_settings(workspace_path).unwrap_or_else(|e| {
            log::warn!("Falling back to default settings: {e}");
            EffectiveSettings::default()
        });
        let store = RecordStore::open(workspace_path)?;
        Self::with_store(store, settings)
    }

    pub fn with_store(store: RecordStore, settings: EffectiveSettings) -> AppResult<Self> {
        store.seed_if_empty(&default_feedback(), &default_changelog())?;

        let auth = AuthGate::new(settings.login_latency);
        let session = auth.restore(&store)?;
        let mut shell = Self {
            store,
            auth,
            notifier: WelcomeNotifier::from_settings(&settings),
            session,
            ui: UiState::with_defaults(&settings),
            feedback: Vec::new(),
            changelog: Vec::new(),
            users: Vec::new(),
        };
        shell.reload_all()?;
        Ok(shell)
    }

    pub fn with_notifier(mut self, notifier: WelcomeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotifyOutcome> {
        self.notifier.subscribe()
    }

    // ---------------------------------------------------------------------
    // Navigation and filter selection
    // ---------------------------------------------------------------------

    /// Switching to the admin tab without a session opens the login modal;
    /// the admin view stays empty until login succeeds.
    pub fn set_tab(&mut self, tab: Tab) {
        self.ui.active_tab = tab;
        if tab == Tab::Admin && !self.session.is_admin {
            self.ui.login_modal_open = true;
        }
    }

    pub fn set_admin_tab(&mut self, tab: AdminTab) {
        self.ui.admin_tab = tab;
    }

    pub fn set_feedback_filters(&mut self, category: &str, status: &str, sort: &str) {
        self.ui.feedback_filters = FeedbackFilters::parse(category, status, sort);
    }

    pub fn set_admin_feedback_filters(&mut self, category: &str, status: &str, sort: &str) {
        self.ui.admin_feedback_filters = FeedbackFilters::parse(category, status, sort);
    }

    pub fn set_roadmap_filters(&mut self, category: &str, sort: &str) {
        self.ui.roadmap_filters = RoadmapFilters {
            category: parse(category),
            sort: parse(sort),
        };
    }

    pub fn set_changelog_filters(&mut self, entry_type: &str, sort: &str) {
        self.ui.changelog_filters = ChangelogFilters::parse(entry_type, sort);
    }

    pub fn set_admin_changelog_filters(&mut self, entry_type: &str, sort: &str) {
        self.ui.admin_changelog_filters = ChangelogFilters::parse(entry_type, sort);
    }

    pub fn open_submit_modal(&mut self) {
        self.ui.submit_modal_open = true;
    }

    pub fn close_submit_modal(&mut self) {
        self.ui.submit_modal_open = false;
    }

    pub fn close_login_modal(&mut self) {
        self.ui.login_modal_open = false;
    }

    pub fn select_feedback(&mut self, id: Option<&str>) {
        self.ui.selected_feedback = id.map(str::to_string);
    }

    pub fn select_changelog(&mut self, id: Option<&str>) {
        self.ui.selected_changelog = id.map(str::to_string);
    }

    pub fn select_user(&mut self, id: Option<&str>) {
        self.ui.selected_user = id.map(str::to_string);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.ui.notice.take()
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn feedback_view(&self) -> Vec<FeedbackItem> {
        let filters = &self.ui.feedback_filters;
        filter_feedback(&self.feedback, &filters.category, &filters.status, filters.sort)
    }

    pub fn roadmap_view(&self) -> RoadmapBoard {
        let filters = &self.ui.roadmap_filters;
        roadmap_board(&self.feedback, &filters.category, filters.sort, &self.session)
    }

    /// The public changelog: always evaluated without admin rights, so even
    /// a signed-in admin sees exactly what visitors see here.
    pub fn changelog_view(&self) -> Vec<ChangelogEntry> {
        let filters = &self.ui.changelog_filters;
        filter_changelog(&self.changelog, &filters.entry_type, filters.sort, &Session::anonymous())
    }

    pub fn admin_view(&self) -> Option<AdminView> {
        if !self.session.is_admin {
            return None;
        }

        let feedback_filters = &self.ui.admin_feedback_filters;
        let changelog_filters = &self.ui.admin_changelog_filters;
        Some(AdminView {
            feedback: filter_feedback(
                &self.feedback,
                &feedback_filters.category,
                &feedback_filters.status,
                feedback_filters.sort,
            ),
            changelog: filter_changelog(
                &self.changelog,
                &changelog_filters.entry_type,
                changelog_filters.sort,
                &self.session,
            ),
            users: self.users.clone(),
        })
    }

    pub fn selected_feedback(&self) -> Option<&FeedbackItem> {
        let id = self.ui.selected_feedback.as_deref()?;
        self.feedback.iter().find(|item| item.id == id)
    }

    pub fn selected_changelog(&self) -> Option<&ChangelogEntry> {
        let id = self.ui.selected_changelog.as_deref()?;
        self.changelog.iter().find(|entry| entry.id == id)
    }

    pub fn selected_user(&self) -> Option<&User> {
        let id = self.ui.selected_user.as_deref()?;
        self.users.iter().find(|user| user.id == id)
    }

    // ---------------------------------------------------------------------
    // Feedback actions
    // ---------------------------------------------------------------------

    pub fn vote(&mut self, id: &str, direction: VoteDirection) -> AppResult<FeedbackItem> {
        let result = self
            .store
            .modify_by_id::<FeedbackItem, AppError, _>(id, |item| {
                item.apply_vote(direction);
                Ok(())
            })
            .and_then(|item| item.ok_or_else(|| not_found("Feedback", id)));
        let result = self.after_feedback_write(result);

        let message = match direction {
            VoteDirection::Up => "Vote added successfully",
            VoteDirection::Down => "Vote removed successfully",
        };
        self.report(result, message)
    }

    /// End-user submission: always lands as `new` with zero votes.
    pub fn submit_feedback(&mut self, submission: FeedbackSubmission) -> AppResult<FeedbackItem> {
        let result = validate_submission(&submission).and_then(|()| {
            let item = FeedbackItem::from_submission(new_id(), &submission, now());
            self.store.insert(&item)?;
            Ok(item)
        });
        let result = self.after_feedback_write(result);
        if result.is_ok() {
            self.ui.submit_modal_open = false;
        }
        self.report(result, "Feedback submitted successfully")
    }

    pub fn create_feedback(&mut self, draft: FeedbackDraft) -> AppResult<FeedbackItem> {
        let result = self.require_admin().and_then(|()| {
            validate_required(&[
                ("title", &draft.title),
                ("description", &draft.description),
                ("category", &draft.category),
            ])?;
            let item = FeedbackItem::from_draft(new_id(), &draft, now());
            self.store.insert(&item)?;
            Ok(item)
        });
        let result = self.after_feedback_write(result);
        self.report(result, "Feedback created successfully")
    }

    /// Administrator edit of any field. Unknown ids are reported, not created.
    pub fn update_feedback(&mut self, item: FeedbackItem) -> AppResult<FeedbackItem> {
        let result = self.require_admin().and_then(|()| {
            if self.store.update_by_id(&item)? {
                Ok(item)
            } else {
                Err(not_found("Feedback", &item.id))
            }
        });
        let result = self.after_feedback_write(result);
        if result.is_ok() {
            self.ui.selected_feedback = None;
        }
        self.report(result, "Feedback updated successfully")
    }

    pub fn delete_feedback(&mut self, id: &str) -> AppResult<bool> {
        let result = self
            .require_admin()
            .and_then(|()| Ok(self.store.delete_by_id::<FeedbackItem>(id)?));
        let result = self.after_feedback_write(result);
        self.report(result, "Feedback deleted successfully")
    }

    // ---------------------------------------------------------------------
    // Changelog actions
    // ---------------------------------------------------------------------

    /// Create a draft entry (`id` is `None`) or edit the content of an
    /// existing one. Lifecycle status is left as it is on edit.
    pub fn save_changelog(&mut self, id: Option<&str>, draft: ChangelogDraft) -> AppResult<ChangelogEntry> {
        let result = self.require_admin().and_then(|()| {
            validate_required(&[("title", &draft.title), ("description", &draft.description)])?;
            match id {
                Some(id) => self
                    .store
                    .modify_by_id::<ChangelogEntry, AppError, _>(id, |entry| {
                        draft.apply_to(entry);
                        Ok(())
                    })?
                    .ok_or_else(|| not_found("Changelog entry", id)),
                None => {
                    let entry = draft.into_entry(new_id(), now());
                    self.store.insert(&entry)?;
                    Ok(entry)
                }
            }
        });
        let result = self.after_changelog_write(result);
        if result.is_ok() {
            self.ui.selected_changelog = None;
        }
        self.report(result, "Changelog updated successfully")
    }

    pub fn publish_changelog(&mut self, id: &str) -> AppResult<ChangelogEntry> {
        let published_at = now();
        let result = self.transition_changelog(id, |entry| entry.publish(published_at));
        self.report(result, "Changelog entry published")
    }

    pub fn schedule_changelog(&mut self, id: &str, at: DateTime<Utc>) -> AppResult<ChangelogEntry> {
        let result = self.transition_changelog(id, |entry| entry.schedule(at));
        self.report(result, "Changelog entry scheduled")
    }

    pub fn unpublish_changelog(&mut self, id: &str) -> AppResult<ChangelogEntry> {
        let result = self.transition_changelog(id, ChangelogEntry::unpublish);
        self.report(result, "Changelog entry unpublished")
    }

    pub fn delete_changelog(&mut self, id: &str) -> AppResult<bool> {
        let result = self
            .require_admin()
            .and_then(|()| Ok(self.store.delete_by_id::<ChangelogEntry>(id)?));
        let result = self.after_changelog_write(result);
        self.report(result, "Changelog entry deleted successfully")
    }

    fn transition_changelog<F>(&mut self, id: &str, apply: F) -> AppResult<ChangelogEntry>
    where
        F: FnOnce(&mut ChangelogEntry) -> AppResult<()>,
    {
        let result = self.require_admin().and_then(|()| {
            self.store
                .modify_by_id::<ChangelogEntry, AppError, _>(id, apply)?
                .ok_or_else(|| not_found("Changelog entry", id))
        });
        self.after_changelog_write(result)
    }

    // ---------------------------------------------------------------------
    // User actions
    // ---------------------------------------------------------------------

    /// The welcome email goes out in the background; subscribe through
    /// [`subscribe_notifications`](Self::subscribe_notifications) to observe it.
    pub fn create_user(&mut self, new_user: NewUser) -> AppResult<User> {
        let result = self.require_admin().and_then(|()| {
            validate_required(&[
                ("first name", &new_user.first_name),
                ("last name", &new_user.last_name),
                ("email", &new_user.email),
                ("password", &new_user.password),
            ])?;
            Ok(self.store.add_user(new_user, &self.notifier)?)
        });
        let result = self.after_users_write(result);
        self.report(result, "User created and welcome email sent")
    }

    pub fn update_user(&mut self, id: &str, patch: UserPatch) -> AppResult<User> {
        let result = self.require_admin().and_then(|()| {
            self.store
                .update_user(id, patch)?
                .ok_or_else(|| not_found("User", id))
        });
        let result = self.after_users_write(result);
        if result.is_ok() {
            self.ui.selected_user = None;
        }
        self.report(result, "User updated successfully")
    }

    /// The seeded administrator cannot be deleted. Unknown ids are a no-op.
    pub fn delete_user(&mut self, id: &str) -> AppResult<bool> {
        let result = self.require_admin().and_then(|()| {
            if let Some(user) = self.store.get_by_id::<User>(id)? {
                if user.is_seeded_admin() {
                    log::warn!("Refused to delete seeded admin account {id}");
                    return Err(AppError::Forbidden(
                        "the built-in admin account cannot be deleted".to_string(),
                    ));
                }
            }
            Ok(self.store.delete_by_id::<User>(id)?)
        });
        let result = self.after_users_write(result);
        self.report(result, "User deleted successfully")
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<()> {
        let result = self.auth.login(&self.store, username, password).await;
        let result = result.map(|session| {
            self.session = session;
            self.ui.login_modal_open = false;
        });
        self.report(result, "Logged in successfully")
    }

    /// Clear the session and move off the admin tab.
    pub fn logout(&mut self) -> AppResult<()> {
        let ui = &mut self.ui;
        let result = self
            .auth
            .logout(&self.store, || ui.active_tab = Tab::Feedback)
            .map_err(AppError::from)
            .map(|session| self.session = session);
        self.report(result, "Logged out successfully")
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn require_admin(&self) -> AppResult<()> {
        if self.session.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin session required".to_string()))
        }
    }

    fn reload_all(&mut self) -> AppResult<()> {
        self.feedback = self.store.get_all()?;
        self.changelog = self.store.get_all()?;
        self.users = self.store.get_all()?;
        Ok(())
    }

    fn after_feedback_write<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        let value = result?;
        self.feedback = self.store.get_all()?;
        Ok(value)
    }

    fn after_changelog_write<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        let value = result?;
        self.changelog = self.store.get_all()?;
        Ok(value)
    }

    fn after_users_write<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        let value = result?;
        self.users = self.store.get_all()?;
        Ok(value)
    }

    fn report<T>(&mut self, result: AppResult<T>, success: &str) -> AppResult<T> {
        self.ui.notice = Some(match &result {
            Ok(_) => Notice {
                kind: NoticeKind::Success,
                message: success.to_string(),
            },
            Err(e) => Notice {
                kind: NoticeKind::Error,
                message: e.to_string(),
            },
        });
        result
    }
}

/// The submission form only offers [`CATEGORIES`]; administrators may use others.
fn validate_submission(submission: &FeedbackSubmission) -> AppResult<()> {
    validate_required(&[
        ("title", &submission.title),
        ("description", &submission.description),
        ("category", &submission.category),
    ])?;

    if !CATEGORIES.contains(&submission.category.as_str()) {
        return Err(AppError::Validation(format!(
            "unknown category '{}'",
            submission.category
        )));
    }
    Ok(())
}

fn validate_required(fields: &[(&str, &String)]) -> AppResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!("missing required fields: {}", missing.join(", "))))
    }
}

fn not_found(entity: &'static str, id: &str) -> AppError {
    AppError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

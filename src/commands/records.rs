//! String-dispatched CRUD commands over the record store.
//!
//! Each call opens the workspace store, runs one operation and answers with a
//! JSON value. These are data-level contracts; session checks live in
//! [`AppShell`](crate::commands::shell::AppShell).

use crate::commands::db::RecordStore;
use crate::commands::notify::WelcomeNotifier;
use crate::commands::settings::load_effective_settings;
use crate::error::{AppError, StoreError};
use crate::models::changelog::ChangelogEntry;
use crate::models::feedback::{FeedbackItem, VoteDirection};
use crate::models::user::{NewUser, User, UserPatch};
use serde_json::{json, Value};

fn open_store(workspace_path: &str) -> Result<RecordStore, String> {
    RecordStore::open(workspace_path).map_err(db_err)
}

fn db_err(e: impl std::fmt::Display) -> String {
    format!("DB error: {e}")
}

// Updates of unknown ids write nothing.
fn update_status(updated: bool) -> &'static str {
    if updated {
        "updated"
    } else {
        "unchanged"
    }
}

pub async fn feedback_crud(
    workspace_path: String,
    operation: String,
    item: Option<FeedbackItem>,
    id: Option<String>,
) -> Result<Value, String> {
    let store = open_store(&workspace_path)?;

    match operation.as_str() {
        "create" => {
            let item = item.ok_or("Item required for create")?;
            store.insert(&item).map_err(db_err)?;
            Ok(json!({"status": "created", "id": item.id}))
        }
        "update" => {
            let item = item.ok_or("Item required for update")?;
            let updated = store.update_by_id(&item).map_err(db_err)?;
            Ok(json!({"status": update_status(updated), "id": item.id}))
        }
        "read" => {
            let id = id.ok_or("ID required for read")?;
            let item = store.get_by_id::<FeedbackItem>(&id).map_err(db_err)?;
            Ok(serde_json::to_value(item).unwrap_or(Value::Null))
        }
        "list" => {
            let items = store.get_all::<FeedbackItem>().map_err(db_err)?;
            Ok(serde_json::to_value(items).unwrap_or_default())
        }
        "upvote" | "downvote" => {
            let id = id.ok_or("ID required for vote")?;
            let direction = if operation == "upvote" {
                VoteDirection::Up
            } else {
                VoteDirection::Down
            };
            let item = store
                .modify_by_id::<FeedbackItem, StoreError, _>(&id, |item| {
                    item.apply_vote(direction);
                    Ok(())
                })
                .map_err(db_err)?
                .ok_or_else(|| format!("Feedback not found: {id}"))?;
            Ok(json!({"status": "voted", "id": item.id, "votes": item.votes}))
        }
        "delete" => {
            let id = id.ok_or("ID required for delete")?;
            store.delete_by_id::<FeedbackItem>(&id).map_err(db_err)?;
            Ok(json!({"status": "deleted"}))
        }
        _ => Err(format!("Unknown operation: {operation}")),
    }
}

pub async fn changelog_crud(
    workspace_path: String,
    operation: String,
    item: Option<ChangelogEntry>,
    id: Option<String>,
) -> Result<Value, String> {
    let store = open_store(&workspace_path)?;

    match operation.as_str() {
        "create" => {
            let item = item.ok_or("Item required for create")?;
            item.check_schedule().map_err(|e| e.to_string())?;
            store.insert(&item).map_err(db_err)?;
            Ok(json!({"status": "created", "id": item.id}))
        }
        "update" => {
            let item = item.ok_or("Item required for update")?;
            let id = item.id.clone();
            let updated = store
                .modify_by_id::<ChangelogEntry, AppError, _>(&id, |stored| {
                    stored.apply_update(item, chrono::Utc::now())
                })
                .map_err(|e| e.to_string())?;
            Ok(json!({"status": update_status(updated.is_some()), "id": id}))
        }
        "read" => {
            let id = id.ok_or("ID required for read")?;
            let entry = store.get_by_id::<ChangelogEntry>(&id).map_err(db_err)?;
            Ok(serde_json::to_value(entry).unwrap_or(Value::Null))
        }
        "list" => {
            let entries = store.get_all::<ChangelogEntry>().map_err(db_err)?;
            Ok(serde_json::to_value(entries).unwrap_or_default())
        }
        "publish" | "unpublish" => {
            let id = id.ok_or("ID required for publish")?;
            let publish = operation == "publish";
            let entry = store
                .modify_by_id::<ChangelogEntry, AppError, _>(&id, |entry| {
                    if publish {
                        entry.publish(chrono::Utc::now())
                    } else {
                        entry.unpublish()
                    }
                })
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Changelog entry not found: {id}"))?;
            Ok(json!({"status": entry.status.as_str(), "id": entry.id}))
        }
        "delete" => {
            let id = id.ok_or("ID required for delete")?;
            store.delete_by_id::<ChangelogEntry>(&id).map_err(db_err)?;
            Ok(json!({"status": "deleted"}))
        }
        _ => Err(format!("Unknown operation: {operation}")),
    }
}

pub async fn user_crud(
    workspace_path: String,
    operation: String,
    item: Option<NewUser>,
    patch: Option<UserPatch>,
    id: Option<String>,
) -> Result<Value, String> {
    let store = open_store(&workspace_path)?;

    match operation.as_str() {
        "create" => {
            let item = item.ok_or("Item required for create")?;
            let settings = load_effective_settings(&workspace_path)?;
            let notifier = WelcomeNotifier::from_settings(&settings);
            let user = store.add_user(item, &notifier).map_err(db_err)?;
            Ok(json!({"status": "created", "id": user.id}))
        }
        "update" => {
            let id = id.ok_or("ID required for update")?;
            let patch = patch.ok_or("Patch required for update")?;
            let user = store.update_user(&id, patch).map_err(db_err)?;
            Ok(json!({"status": update_status(user.is_some()), "id": id}))
        }
        "read" => {
            let id = id.ok_or("ID required for read")?;
            let user = store.get_by_id::<User>(&id).map_err(db_err)?;
            Ok(serde_json::to_value(user).unwrap_or(Value::Null))
        }
        "list" => {
            let users = store.get_all::<User>().map_err(db_err)?;
            Ok(serde_json::to_value(users).unwrap_or_default())
        }
        "delete" => {
            let id = id.ok_or("ID required for delete")?;
            if let Some(user) = store.get_by_id::<User>(&id).map_err(db_err)? {
                if user.is_seeded_admin() {
                    return Err("The built-in admin account cannot be deleted".to_string());
                }
            }
            store.delete_by_id::<User>(&id).map_err(db_err)?;
            Ok(json!({"status": "deleted"}))
        }
        _ => Err(format!("Unknown operation: {operation}")),
    }
}

use crate::commands::notify::WelcomeNotifier;
use crate::error::{StoreError, StoreResult};
use crate::models::changelog::ChangelogEntry;
use crate::models::defaults::seeded_admin;
use crate::models::feedback::FeedbackItem;
use crate::models::user::{NewUser, User, UserPatch};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DB_SCHEMA_VERSION: i64 = 1;
const DATA_DIR: &str = ".feedbackboard";
const DB_FILE: &str = "board.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Feedback,
    Changelog,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Feedback, Collection::Changelog, Collection::Users];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Feedback => "feedback_items",
            Collection::Changelog => "changelog_entries",
            Collection::Users => "users",
        }
    }

    fn initialized_marker(self) -> String {
        format!("initialized:{}", self.key())
    }
}

/// A document stored in one of the collections, addressed by its id.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

impl Record for FeedbackItem {
    const COLLECTION: Collection = Collection::Feedback;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for ChangelogEntry {
    const COLLECTION: Collection = Collection::Changelog;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Which collections a [`RecordStore::seed_if_empty`] call populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub feedback: bool,
    pub changelog: bool,
    pub users: bool,
}

impl SeedReport {
    pub fn any(&self) -> bool {
        self.feedback || self.changelog || self.users
    }
}

pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        // Written by a newer build; keep going on the tables we know.
        log::warn!("Store schema version {version} is newer than {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL CHECK(collection IN ('feedback_items', 'changelog_entries', 'users')),
            id TEXT NOT NULL,
            position INTEGER NOT NULL,
            data_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_position ON records(collection, position);

        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )
}

pub fn data_dir(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path).join(DATA_DIR)
}

/// Persistence for the feedback, changelog and user collections plus a small
/// key-value area for flags.
///
/// Records are indexed by `(collection, id)`; listing order comes from an
/// explicit `position` column. Writes are last-write-wins with no versioning.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(workspace_path: &str) -> StoreResult<Self> {
        let dir = data_dir(workspace_path);
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Unavailable(format!("cannot create {}: {e}", dir.display())))?;

        let db_path = dir.join(DB_FILE);
        let conn = Connection::open(&db_path)
            .map_err(|e| StoreError::Unavailable(format!("cannot open {}: {e}", db_path.display())))?;
        log::info!("Opened record store at {}", db_path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory store: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Every record of `T`'s collection in listing order.
    pub fn get_all<T: Record>(&self) -> StoreResult<Vec<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data_json FROM records WHERE collection = ?1 ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![T::COLLECTION.key()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data_json) = row?;
            match serde_json::from_str::<T>(&data_json) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!(
                    "Skipping unreadable {} record {id}: {e}",
                    T::COLLECTION.key()
                ),
            }
        }

        Ok(records)
    }

    pub fn get_by_id<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        load_one(&self.conn, id)
    }

    /// Replace the whole collection; the slice order becomes the listing order.
    pub fn save_all<T: Record>(&self, records: &[T]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let collection = T::COLLECTION;

        tx.execute("DELETE FROM records WHERE collection = ?1", params![collection.key()])?;
        let now = chrono::Utc::now().timestamp();
        for (position, record) in records.iter().enumerate() {
            let data_json = serde_json::to_string(record)?;
            tx.execute(
                "INSERT OR REPLACE INTO records (collection, id, position, data_json, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![collection.key(), record.id(), position as i64, data_json, now],
            )?;
        }
        mark_initialized(&tx, collection)?;

        tx.commit()?;
        log::debug!("Saved {} {} records", records.len(), collection.key());
        Ok(())
    }

    /// Insert at the head of the listing. Fails if the id is already taken.
    pub fn insert<T: Record>(&self, record: &T) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let collection = T::COLLECTION;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM records WHERE collection = ?1 AND id = ?2)",
            params![collection.key(), record.id()],
            |row| row.get(0),
        )?;
        if exists {
            return Err(StoreError::Conflict {
                collection: collection.key(),
                id: record.id().to_string(),
            });
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MIN(position), 0) - 1 FROM records WHERE collection = ?1",
            params![collection.key()],
            |row| row.get(0),
        )?;

        let data_json = serde_json::to_string(record)?;
        tx.execute(
            "INSERT INTO records (collection, id, position, data_json, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![collection.key(), record.id(), position, data_json, chrono::Utc::now().timestamp()],
        )?;
        mark_initialized(&tx, collection)?;

        tx.commit()?;
        Ok(())
    }

    /// Overwrite the stored record with the same id. Returns `false` when no
    /// such record exists, in which case nothing is written.
    pub fn update_by_id<T: Record>(&self, record: &T) -> StoreResult<bool> {
        let updated = write_data(&self.conn, record.id(), record)?;
        Ok(updated)
    }

    /// Read-modify-write of one record inside a transaction. `apply` failing
    /// leaves the stored record untouched.
    pub fn modify_by_id<T, E, F>(&self, id: &str, apply: F) -> Result<Option<T>, E>
    where
        T: Record,
        E: From<StoreError>,
        F: FnOnce(&mut T) -> Result<(), E>,
    {
        let tx = self.conn.unchecked_transaction().map_err(StoreError::from)?;
        let Some(mut record) = load_one::<T>(&tx, id)? else {
            return Ok(None);
        };

        apply(&mut record)?;
        write_data(&tx, id, &record)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(Some(record))
    }

    /// Hard delete. Unknown ids are a no-op and return `false`.
    pub fn delete_by_id<T: Record>(&self, id: &str) -> StoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![T::COLLECTION.key(), id],
        )?;
        mark_initialized(&tx, T::COLLECTION)?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn count(&self, collection: Collection) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection.key()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Whether the collection has ever been written, even if it is now empty.
    pub fn is_initialized(&self, collection: Collection) -> StoreResult<bool> {
        Ok(self.kv_get(&collection.initialized_marker())?.is_some())
    }

    /// Populate every collection that has never been written. Users get the
    /// single seeded administrator. Calling it again is a no-op.
    pub fn seed_if_empty(
        &self,
        default_feedback: &[FeedbackItem],
        default_changelog: &[ChangelogEntry],
    ) -> StoreResult<SeedReport> {
        let mut report = SeedReport::default();

        if !self.is_initialized(Collection::Feedback)? {
            self.save_all(default_feedback)?;
            report.feedback = true;
        }
        if !self.is_initialized(Collection::Changelog)? {
            self.save_all(default_changelog)?;
            report.changelog = true;
        }
        if !self.is_initialized(Collection::Users)? {
            self.save_all(&[seeded_admin(chrono::Utc::now())])?;
            report.users = true;
        }

        if report.any() {
            log::info!("Seeded empty store: {report:?}");
        }
        Ok(report)
    }

    /// Create a user and start the welcome notification without waiting on it.
    pub fn add_user(&self, new_user: NewUser, notifier: &WelcomeNotifier) -> StoreResult<User> {
        let user = new_user.into_user(uuid::Uuid::new_v4().to_string(), chrono::Utc::now());
        self.insert(&user)?;
        log::info!("Created user {} ({})", user.id, user.email);

        // Fire and forget: the outcome goes to the notifier's channel.
        let _ = notifier.notify_new_user(&user);
        Ok(user)
    }

    pub fn update_user(&self, id: &str, patch: UserPatch) -> StoreResult<Option<User>> {
        self.modify_by_id::<User, StoreError, _>(id, |user| {
            patch.apply_to(user);
            Ok(())
        })
    }

    pub fn kv_get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn load_one<T: Record>(conn: &Connection, id: &str) -> StoreResult<Option<T>> {
    let data_json: Option<String> = conn
        .query_row(
            "SELECT data_json FROM records WHERE collection = ?1 AND id = ?2",
            params![T::COLLECTION.key(), id],
            |row| row.get(0),
        )
        .optional()?;

    match data_json {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn write_data<T: Record>(conn: &Connection, id: &str, record: &T) -> StoreResult<bool> {
    let data_json = serde_json::to_string(record)?;
    let changed = conn.execute(
        "UPDATE records SET data_json = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
        params![T::COLLECTION.key(), id, data_json, chrono::Utc::now().timestamp()],
    )?;
    Ok(changed > 0)
}

fn mark_initialized(conn: &Connection, collection: Collection) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, 'true')",
        params![collection.initialized_marker()],
    )?;
    Ok(())
}

//! Admin sign-in gate.
//!
//! A single fixed credential pair unlocks the admin view, and the signed-in
//! flag is kept in the record store so it survives restarts. This is a
//! demonstration stand-in, not a security boundary: anyone who can read the
//! source or write the store can set the flag. There is no lockout, rate
//! limiting or attempt tracking.

use crate::commands::db::RecordStore;
use crate::error::{AppError, AppResult, StoreResult};
use crate::models::session::Session;
use std::time::Duration;

pub const AUTH_FLAG_KEY: &str = "isAuthenticated";

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct AuthGate {
    latency: Duration,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl AuthGate {
    /// `latency` is waited out before every login answer.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Session as persisted by the last login or logout.
    pub fn restore(&self, store: &RecordStore) -> StoreResult<Session> {
        let flag = store.kv_get(AUTH_FLAG_KEY)?;
        Ok(Session {
            is_admin: flag.as_deref() == Some("true"),
        })
    }

    pub async fn login(
        &self,
        store: &RecordStore,
        username: &str,
        password: &str,
    ) -> AppResult<Session> {
        tokio::time::sleep(self.latency).await;

        if username != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            log::warn!("Rejected login attempt for '{username}'");
            return Err(AppError::AuthenticationFailed);
        }

        store.kv_set(AUTH_FLAG_KEY, "true")?;
        log::info!("Admin logged in");
        Ok(Session::admin())
    }

    /// Clear the flag, then run `on_complete` (typically navigating away
    /// from admin-only views).
    pub fn logout<F: FnOnce()>(&self, store: &RecordStore, on_complete: F) -> StoreResult<Session> {
        store.kv_remove(AUTH_FLAG_KEY)?;
        log::info!("Admin logged out");
        on_complete();
        Ok(Session::anonymous())
    }
}

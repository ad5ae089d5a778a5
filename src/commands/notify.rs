//! Welcome notification sent when an administrator creates a user.
//!
//! Delivery runs as a detached task. Callers never wait on it and a failure
//! never affects the user record; every outcome is logged and published on a
//! broadcast channel that interested parties can [`subscribe`](WelcomeNotifier::subscribe) to.

use crate::commands::settings::EffectiveSettings;
use crate::models::user::User;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const OUTCOME_CAPACITY: usize = 64;
pub const DEFAULT_LOGIN_URL: &str = "http://localhost:5173/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl WelcomeEmail {
    pub fn for_user(user: &User, login_url: &str) -> Self {
        let body = format!(
            "Hello {},\n\n\
             Your account has been created successfully!\n\n\
             You can log in using the following credentials:\n\
             Email: {}\n\
             Password: (the password you set during registration)\n\n\
             Click here to log in: {}\n\n\
             Best regards,\n\
             Product Feedback Team\n",
            user.full_name(),
            user.email,
            login_url
        );

        Self {
            to: user.email.clone(),
            subject: "Welcome to Product Feedback".to_string(),
            body,
        }
    }
}

/// Delivery backend. Implementations must be cheap to share across tasks.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &WelcomeEmail) -> Result<(), String>;
}

/// Writes the message to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &WelcomeEmail) -> Result<(), String> {
        log::info!("Sending welcome email to {}", email.to);
        log::debug!("{}", email.body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent { user_id: String, email: String },
    Failed { user_id: String, email: String, error: String },
    Skipped { user_id: String },
}

pub struct WelcomeNotifier {
    mailer: Arc<dyn Mailer>,
    delay: Duration,
    login_url: String,
    enabled: bool,
    outcomes: broadcast::Sender<NotifyOutcome>,
}

impl Default for WelcomeNotifier {
    fn default() -> Self {
        Self::new(Arc::new(LogMailer), Duration::from_millis(1000), DEFAULT_LOGIN_URL)
    }
}

impl WelcomeNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, delay: Duration, login_url: impl Into<String>) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);
        Self {
            mailer,
            delay,
            login_url: login_url.into(),
            enabled: true,
            outcomes,
        }
    }

    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self::new(
            Arc::new(LogMailer),
            settings.welcome_email_delay,
            settings.login_url.clone(),
        )
        .with_enabled(settings.welcome_emails_enabled)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotifyOutcome> {
        self.outcomes.subscribe()
    }

    /// Start delivery for `user` and return immediately.
    ///
    /// Returns the task handle when a task was spawned. Without a tokio
    /// runtime nothing can be spawned; the failure is logged and published
    /// like any other.
    pub fn notify_new_user(&self, user: &User) -> Option<JoinHandle<NotifyOutcome>> {
        if !self.enabled {
            log::debug!("Welcome emails disabled, skipping user {}", user.id);
            self.publish(NotifyOutcome::Skipped {
                user_id: user.id.clone(),
            });
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Failed to send welcome email to {}: {e}", user.email);
                self.publish(NotifyOutcome::Failed {
                    user_id: user.id.clone(),
                    email: user.email.clone(),
                    error: e.to_string(),
                });
                return None;
            }
        };

        let email = WelcomeEmail::for_user(user, &self.login_url);
        let user_id = user.id.clone();
        let mailer = Arc::clone(&self.mailer);
        let sender = self.outcomes.clone();
        let delay = self.delay;

        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = match mailer.send(&email) {
                Ok(()) => NotifyOutcome::Sent {
                    user_id,
                    email: email.to,
                },
                Err(error) => {
                    log::error!("Failed to send welcome email to {}: {error}", email.to);
                    NotifyOutcome::Failed {
                        user_id,
                        email: email.to,
                        error,
                    }
                }
            };
            // No subscribers is fine.
            let _ = sender.send(outcome.clone());
            outcome
        }))
    }

    fn publish(&self, outcome: NotifyOutcome) {
        let _ = self.outcomes.send(outcome);
    }
}

//! Session workflow: login, registration and logout.

use std::sync::Arc;

use gateway::{AuthApi, models::Credentials};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use utils::{
    msg::{Notification, Notifier},
    session::SessionStore,
};

/// Where the UI should navigate after a completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// The authenticated landing area.
    Home,
    /// The login entry point.
    Login,
}

pub struct SessionWorkflow<A: ?Sized> {
    api: Arc<A>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
}

impl<A: AuthApi + ?Sized> SessionWorkflow<A> {
    pub fn new(api: Arc<A>, store: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            store,
            notifier,
        }
    }

    /// Exchange credentials for a session token, persist it and signal
    /// navigation home. Returns `None` when the attempt failed; entered
    /// credentials remain with the caller for a retry.
    pub async fn login(&self, email: &str, password: SecretString) -> Option<Landing> {
        let credentials = Credentials {
            email: email.to_string(),
            password,
        };
        match self.api.login(&credentials).await {
            Ok(token) => {
                if let Err(e) = self.store.save(&token) {
                    warn!(error = %e, "could not persist session token");
                    self.notifier
                        .notify(Notification::error(format!("Could not save session: {e}")));
                    return None;
                }
                self.notifier.notify(Notification::success("Logged in"));
                Some(Landing::Home)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.notifier
                    .notify(Notification::error(format!("Login failed: {e}")));
                None
            }
        }
    }

    /// Register a new account. The confirmation password must match
    /// byte-for-byte before any request is attempted; success signals
    /// navigation to the login entry point.
    pub async fn register(
        &self,
        email: &str,
        password: SecretString,
        confirm_password: SecretString,
    ) -> Option<Landing> {
        if password.expose_secret() != confirm_password.expose_secret() {
            self.notifier
                .notify(Notification::error("Passwords do not match"));
            return None;
        }

        let credentials = Credentials {
            email: email.to_string(),
            password,
        };
        match self.api.register(&credentials).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success("Registered, please log in"));
                Some(Landing::Login)
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                self.notifier
                    .notify(Notification::error(format!("Registration failed: {e}")));
                None
            }
        }
    }

    /// Destroy the persisted session.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear session token");
        }
        self.notifier.notify(Notification::info("Logged out"));
    }
}

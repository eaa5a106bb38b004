//! Auth/session collaborator: bearer credentials and the auth-failure policy.
//!
//! POLICY
//! ======
//! A request failing with 401/403 triggers one credential refresh. If the
//! refresh succeeds the request is re-issued exactly once and its result is
//! returned as-is. If the refresh fails, the session is torn down and every
//! registered session-ended hook runs (the host uses this to send the user
//! back to the sign-in entry point). Any other failure is logged and handed
//! back to the caller without a retry.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::future::Future;
use std::sync::{Mutex, PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tracing::{error, info, warn};

use crate::error::{DeckError, Result};
use crate::model::UserId;
use crate::wire::LoginResponse;

pub const REFRESH_TOKEN_HEADER: &str = "refresh-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

impl From<LoginResponse> for Credentials {
    fn from(login: LoginResponse) -> Self {
        Self {
            access_token: login.jwt_token,
            refresh_token: login.refresh_token,
            user_id: login.id,
            name: login.name,
            email: login.email,
        }
    }
}

/// Exchanges expiring credentials for fresh ones.
#[async_trait::async_trait]
pub trait CredentialRefresh: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the credentials cannot be renewed.
    async fn refresh(&self, current: &Credentials) -> Result<Credentials>;
}

/// Refresh strategy for backends without a refresh endpoint: always fails,
/// so any auth failure ends the session.
pub struct NoRefresh;

#[async_trait::async_trait]
impl CredentialRefresh for NoRefresh {
    async fn refresh(&self, _current: &Credentials) -> Result<Credentials> {
        Err(DeckError::SessionExpired)
    }
}

type SessionHook = Box<dyn Fn() + Send + Sync>;

pub struct AuthSession {
    credentials: RwLock<Option<Credentials>>,
    refresher: Box<dyn CredentialRefresh>,
    on_expired: Mutex<Vec<SessionHook>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(refresher: impl CredentialRefresh + 'static) -> Self {
        Self { credentials: RwLock::new(None), refresher: Box::new(refresher), on_expired: Mutex::new(Vec::new()) }
    }

    /// Signed-in session with no refresh capability.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        let session = Self::new(NoRefresh);
        session.set_credentials(Some(credentials));
        session
    }

    pub fn login(&self, login: LoginResponse) {
        info!(user_id = login.id, "signed in");
        self.set_credentials(Some(login.into()));
    }

    pub fn logout(&self) {
        self.set_credentials(None);
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }

    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        self.credentials().map(|c| c.user_id)
    }

    /// Current user id, required by every write request body.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out.
    pub fn user_id(&self) -> Result<UserId> {
        self.id().ok_or(DeckError::NotAuthenticated)
    }

    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    /// Headers carrying the bearer token and refresh token. Empty when
    /// signed out.
    #[must_use]
    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(credentials) = self.credentials() else {
            return headers;
        };
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", credentials.access_token)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(refresh) = credentials.refresh_token.as_deref() {
            if let Ok(value) = HeaderValue::from_str(refresh) {
                headers.insert(HeaderName::from_static(REFRESH_TOKEN_HEADER), value);
            }
        }
        headers
    }

    /// Register a hook run when the session is torn down after a failed refresh.
    pub fn on_session_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    /// Apply the failure policy to `err`, re-invoking `retry` at most once.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` when the refresh fails, the retry's error if
    /// the retried request fails, and `err` unchanged for non-auth failures.
    pub async fn handle_common_error<T, F, Fut>(&self, err: DeckError, retry: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !err.is_auth_failure() {
            error!(error = %err, code = err.error_code(), "remote request failed");
            return Err(err);
        }

        if self.refresh().await {
            info!("credentials refreshed; retrying request once");
            let result = retry().await;
            if let Err(e) = &result {
                error!(error = %e, code = e.error_code(), "retried request failed");
            }
            return result;
        }

        self.expire();
        Err(DeckError::SessionExpired)
    }

    async fn refresh(&self) -> bool {
        let Some(current) = self.credentials() else {
            return false;
        };
        match self.refresher.refresh(&current).await {
            Ok(fresh) => {
                self.set_credentials(Some(fresh));
                true
            }
            Err(e) => {
                warn!(error = %e, "credential refresh failed");
                false
            }
        }
    }

    fn expire(&self) {
        error!("session expired; signing out");
        self.logout();
        let hooks = self.on_expired.lock().unwrap_or_else(PoisonError::into_inner);
        for hook in hooks.iter() {
            hook();
        }
    }
}

/// Run `op`, routing a failure through [`AuthSession::handle_common_error`]
/// with `op` itself as the retry.
///
/// # Errors
///
/// See [`AuthSession::handle_common_error`].
pub async fn with_auth_retry<T, F, Fut>(auth: &AuthSession, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(err) => auth.handle_common_error(err, &op).await,
    }
}

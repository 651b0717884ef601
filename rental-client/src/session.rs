//! Session Store
//!
//! Holds the bearer token and the authenticated identity, persists the token
//! through [`KeyValueStore`], and publishes every change on a `watch`
//! channel. Until [`SessionStore::restore_session`] settles the state is
//! [`SessionState::Unknown`], distinct from both signed-in and signed-out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use shared::models::Role;
use shared::permissions::{self, Capability};
use shared::{AuthResponse, Identity, LoginRequest, ProfileUpdate, RegisterRequest};
use tokio::sync::{Mutex, watch};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiRequest, HttpClient, interpret};
use crate::payload;
use crate::security_log;
use crate::storage::{KeyValueStore, TOKEN_KEY};

const IDENTITY_KEYS: &[&str] = &["user", "profile", "identity"];

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Durable storage not read yet
    #[default]
    Unknown,
    /// No token
    Anonymous,
    /// Token loaded, profile not confirmed yet
    Pending,
    /// Token only; the profile fetch failed for a reason other than 401
    Degraded,
    /// Token and confirmed identity
    Authenticated,
}

impl SessionState {
    /// A token is held (polling may run)
    pub fn has_token(&self) -> bool {
        matches!(
            self,
            SessionState::Pending | SessionState::Degraded | SessionState::Authenticated
        )
    }

    /// Restoration finished one way or the other
    pub fn is_settled(&self) -> bool {
        !matches!(self, SessionState::Unknown | SessionState::Pending)
    }
}

/// Snapshot of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: SessionState,
    pub token: Option<String>,
    pub identity: Option<Identity>,
}

impl Session {
    fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            token: None,
            identity: None,
        }
    }

    fn authenticated(token: String, identity: Identity) -> Self {
        Self {
            state: SessionState::Authenticated,
            token: Some(token),
            identity: Some(identity),
        }
    }
}

struct SessionInner {
    http: Arc<dyn HttpClient>,
    storage: Arc<dyn KeyValueStore>,
    login_max_attempts: u32,
    login_backoff: Duration,
    tx: watch::Sender<Session>,
    /// Held across a durable token write and the matching publish
    token_writes: Mutex<()>,
}

/// Session Store
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn KeyValueStore>,
        login_max_attempts: u32,
        login_backoff: Duration,
    ) -> Self {
        let (tx, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(SessionInner {
                http,
                storage,
                login_max_attempts: login_max_attempts.max(1),
                login_backoff,
                tx,
                token_writes: Mutex::new(()),
            }),
        }
    }

    // ========== Observation ==========

    pub fn snapshot(&self) -> Session {
        self.inner.tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.tx.borrow().state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.tx.borrow().identity.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.tx.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Watch every session transition
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.tx.subscribe()
    }

    /// Wait until restoration has settled
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        match rx.wait_for(|session| session.state.is_settled()).await {
            Ok(session) => session.state,
            // Sender lives in `self`, so this only happens during teardown
            Err(_) => self.state(),
        }
    }

    // ========== Permissions ==========

    /// Capability check against the current identity (fails closed)
    pub fn can(&self, capability: Capability) -> bool {
        permissions::can(self.inner.tx.borrow().identity.as_ref(), capability)
    }

    /// Coarse role-order check
    pub fn has_role_at_least(&self, minimum: Role) -> bool {
        self.inner
            .tx
            .borrow()
            .identity
            .as_ref()
            .is_some_and(|identity| identity.has_role_at_least(minimum))
    }

    /// Guard used before any network call of a protected operation
    pub fn require(&self, capability: Capability) -> ClientResult<()> {
        let session = self.inner.tx.borrow();
        match &session.identity {
            Some(identity) if permissions::can(Some(identity), capability) => Ok(()),
            Some(identity) => {
                security_log!(
                    WARN,
                    "permission_denied",
                    user_id = %identity.id,
                    role = %identity.role,
                    capability = %capability
                );
                Err(ClientError::PermissionDenied(capability))
            }
            None => {
                security_log!(
                    WARN,
                    "permission_denied",
                    capability = %capability,
                    anonymous = true
                );
                Err(ClientError::NotAuthenticated)
            }
        }
    }

    /// Token or `NotAuthenticated`
    pub fn require_token(&self) -> ClientResult<String> {
        self.token().ok_or(ClientError::NotAuthenticated)
    }

    // ========== Authentication ==========

    /// Log in, retrying transport failures with linear backoff
    ///
    /// Server rejections (any status) are returned on the first attempt.
    pub async fn login(&self, credentials: LoginRequest) -> ClientResult<Identity> {
        let auth = self.request_login(&credentials).await?;
        Ok(self.establish(auth, "login").await)
    }

    /// Register a new account and sign in with it
    pub async fn register(&self, fields: RegisterRequest) -> ClientResult<Identity> {
        let auth = self.request_register(&fields).await?;
        Ok(self.establish(auth, "register").await)
    }

    /// Exchange credentials for a token without touching the session
    pub(crate) async fn request_login(
        &self,
        credentials: &LoginRequest,
    ) -> ClientResult<AuthResponse> {
        let mut attempt = 1u32;
        loop {
            match self.authenticate("auth/login", credentials).await {
                Ok(auth) => return Ok(auth),
                Err(e) if e.is_transport() && attempt < self.inner.login_max_attempts => {
                    let delay = self.inner.login_backoff * attempt;
                    tracing::warn!(
                        attempt,
                        max_attempts = self.inner.login_max_attempts,
                        error = %e,
                        "Login attempt failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    security_log!(
                        WARN,
                        "login_failed",
                        email = %credentials.email,
                        attempts = attempt,
                        error = %e
                    );
                    return Err(e);
                }
            }
        }
    }

    pub(crate) async fn request_register(
        &self,
        fields: &RegisterRequest,
    ) -> ClientResult<AuthResponse> {
        self.authenticate("auth/register", fields).await.inspect_err(|e| {
            security_log!(WARN, "register_failed", email = %fields.email, error = %e);
        })
    }

    async fn authenticate<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<AuthResponse> {
        let request = ApiRequest::post(path).json(body)?;
        let reply = self.inner.http.execute(request).await?;
        let body = match interpret(reply) {
            Ok(body) => payload::unwrap_data(body),
            // No session is involved yet, so a 401 here rejects the credentials
            Err(ClientError::Unauthorized(message)) => {
                return Err(ClientError::InvalidCredentials(message));
            }
            Err(e) => return Err(e),
        };
        serde_json::from_value::<AuthResponse>(body)
            .map_err(|e| ClientError::InvalidResponse(format!("auth response: {}", e)))
    }

    /// Persist the token and publish the new identity in one transition
    pub(crate) async fn establish(&self, auth: AuthResponse, event: &'static str) -> Identity {
        let AuthResponse { token, user } = auth;
        let writes = self.inner.token_writes.lock().await;
        if let Err(e) = self.inner.storage.set(TOKEN_KEY, token.clone()).await {
            tracing::warn!(error = %e, "Failed to persist auth token");
        }
        self.inner
            .tx
            .send_replace(Session::authenticated(token, user.clone()));
        drop(writes);
        security_log!(INFO, event, user_id = %user.id, role = %user.role);
        user
    }

    /// Log out; never fails
    ///
    /// Server-side invalidation runs in the background and its outcome is
    /// ignored. Local state is cleared unconditionally.
    pub async fn logout(&self) {
        if let Some(token) = self.token() {
            let http = Arc::clone(&self.inner.http);
            tokio::spawn(async move {
                let request = ApiRequest::post("auth/logout").with_bearer(Some(token));
                if let Err(e) = http.execute(request).await {
                    tracing::debug!(error = %e, "Server logout failed");
                }
            });
        }
        let user_id = self.identity().map(|identity| identity.id);
        self.clear().await;
        security_log!(INFO, "logout", user_id = ?user_id);
    }

    async fn clear(&self) {
        let _writes = self.inner.token_writes.lock().await;
        self.clear_locked().await;
    }

    /// Durable token goes first so no observer sees Anonymous while the
    /// old token can still be restored
    async fn clear_locked(&self) {
        if let Err(e) = self.inner.storage.remove(TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove persisted auth token");
        }
        self.inner.tx.send_replace(Session::anonymous());
    }

    /// Restore the session from durable storage (run once at startup)
    ///
    /// A failed profile fetch leaves the session token-only (`Degraded`)
    /// unless the server answered 401.
    pub async fn restore_session(&self) -> SessionState {
        let token = match self.inner.storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted auth token");
                None
            }
        };

        let Some(token) = token else {
            self.inner.tx.send_replace(Session::anonymous());
            tracing::debug!("No persisted session");
            return SessionState::Anonymous;
        };

        self.inner.tx.send_replace(Session {
            state: SessionState::Pending,
            token: Some(token.clone()),
            identity: None,
        });

        match self.fetch_profile().await {
            Ok(identity) => {
                self.confirm(&token, identity);
            }
            Err(ClientError::Unauthorized(_)) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed, keeping token-only session");
                self.inner.tx.send_if_modified(|session| {
                    if session.token.as_deref() == Some(token.as_str()) {
                        session.state = SessionState::Degraded;
                        true
                    } else {
                        false
                    }
                });
            }
        }
        self.state()
    }

    /// Re-fetch the profile; promotes a degraded session
    pub async fn refresh_profile(&self) -> ClientResult<Identity> {
        let token = self.require_token()?;
        let identity = self.fetch_profile().await?;
        self.confirm(&token, identity.clone());
        Ok(identity)
    }

    /// Update the own profile; the identity is replaced only on success
    pub async fn update_profile(&self, update: ProfileUpdate) -> ClientResult<Identity> {
        let token = self.require_token()?;
        let request = ApiRequest::put("auth/profile").json(&update)?;
        let body = self.send(request).await?;

        let identity = match payload::entity_of::<Identity>(body, IDENTITY_KEYS) {
            Some(identity) => identity,
            None => {
                let mut identity = self.identity().ok_or_else(|| {
                    ClientError::InvalidResponse("profile response carried no user".into())
                })?;
                update.apply_to(&mut identity);
                identity
            }
        };
        self.confirm(&token, identity.clone());
        Ok(identity)
    }

    async fn fetch_profile(&self) -> ClientResult<Identity> {
        let body = self.send(ApiRequest::get("auth/profile")).await?;
        payload::entity_of(body, IDENTITY_KEYS)
            .ok_or_else(|| ClientError::InvalidResponse("profile response carried no user".into()))
    }

    /// Set the identity if the session still holds `token`
    fn confirm(&self, token: &str, identity: Identity) {
        let applied = self.inner.tx.send_if_modified(|session| {
            if session.token.as_deref() == Some(token) {
                session.identity = Some(identity);
                session.state = SessionState::Authenticated;
                true
            } else {
                false
            }
        });
        if !applied {
            tracing::debug!("Session changed while fetching profile, discarding result");
        }
    }

    // ========== Authenticated requests ==========

    /// Execute a request with the current bearer token and classify the reply
    ///
    /// A 401 answer to an authenticated request ends the session.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
        let token = self.token();
        let reply = self
            .inner
            .http
            .execute(request.with_bearer(token.clone()))
            .await?;
        let result = interpret(reply);
        if let (Err(ClientError::Unauthorized(message)), Some(token)) = (&result, &token) {
            self.expire(token, message).await;
        }
        result
    }

    /// Clear the session after a 401, unless it was replaced meanwhile
    async fn expire(&self, token: &str, reason: &str) {
        let _writes = self.inner.token_writes.lock().await;
        if self.token().as_deref() != Some(token) {
            return;
        }
        let user_id = self.identity().map(|identity| identity.id);
        self.clear_locked().await;
        security_log!(WARN, "session_expired", user_id = ?user_id, reason = %reason);
    }
}

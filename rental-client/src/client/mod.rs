//! Composition root
//!
//! `RentalClient` wires the Session Store, the Mutation Gateway, the
//! Snackbar and the Notification Poller around one transport and one
//! durable store. Each component stays usable on its own.

mod builder;

pub use builder::RentalClientBuilder;

use std::sync::Arc;

use serde::Serialize;
use shared::{Identity, LoginRequest, RegisterRequest};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::Gateway;
use crate::http::HttpClient;
use crate::poller::{CHANGE_CHANNEL_CAPACITY, NotificationPoller, ReservationChange};
use crate::response::Outcome;
use crate::session::{SessionState, SessionStore};
use crate::snackbar::Snackbar;
use crate::storage::KeyValueStore;

/// Client core of the rental app
pub struct RentalClient {
    config: ClientConfig,
    session: SessionStore,
    gateway: Gateway,
    snackbar: Snackbar,
    changes: broadcast::Sender<ReservationChange>,
    shutdown: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RentalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RentalClient")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl RentalClient {
    pub fn builder() -> RentalClientBuilder {
        RentalClientBuilder::new()
    }

    fn assemble(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let session = SessionStore::new(
            http,
            Arc::clone(&storage),
            config.login_max_attempts,
            config.login_backoff,
        );
        let gateway = Gateway::new(session.clone(), storage);
        let snackbar = Snackbar::new(config.snackbar_duration);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            config,
            session,
            gateway,
            snackbar,
            changes,
            shutdown: CancellationToken::new(),
            poller: Mutex::new(None),
        }
    }

    // ========== Lifecycle ==========

    /// Restore the session, load durable favorites, start the poller
    pub async fn start(&self) -> SessionState {
        let state = self.session.restore_session().await;
        self.gateway.load_favorites().await;

        let mut poller = self.poller.lock().await;
        if poller.is_none() && !self.shutdown.is_cancelled() {
            *poller = Some(
                NotificationPoller::new(
                    self.gateway.clone(),
                    self.snackbar.clone(),
                    self.changes.clone(),
                    self.config.reservation_poll_interval,
                    self.config.unread_poll_interval,
                    self.shutdown.child_token(),
                )
                .spawn(),
            );
        }

        tracing::info!(state = ?state, base_url = %self.config.base_url, "Rental client started");
        state
    }

    /// Log in; user-scoped caches are dropped when the user changes
    pub async fn login(&self, credentials: LoginRequest) -> ClientResult<Identity> {
        let auth = self.session.request_login(&credentials).await?;
        self.prepare_for(&auth.user).await;
        Ok(self.session.establish(auth, "login").await)
    }

    pub async fn register(&self, fields: RegisterRequest) -> ClientResult<Identity> {
        let auth = self.session.request_register(&fields).await?;
        self.prepare_for(&auth.user).await;
        Ok(self.session.establish(auth, "register").await)
    }

    /// Drop user-scoped data unless it provably belongs to `incoming`
    ///
    /// Runs before the new identity is published so session observers never
    /// see it next to the previous user's data.
    async fn prepare_for(&self, incoming: &Identity) {
        let previous = self.session.snapshot();
        let stale = match &previous.identity {
            Some(identity) => identity.id != incoming.id,
            // token-only or expired sessions cannot vouch for the cached data
            None => previous.state.has_token() || self.gateway.holds_user_data().await,
        };
        if stale {
            tracing::debug!(user_id = %incoming.id, "Signing in as a different user");
            self.gateway.clear_user_data().await;
        }
    }

    /// Log out and drop user-scoped data; never fails
    pub async fn logout(&self) {
        self.session.logout().await;
        self.gateway.clear_user_data().await;
    }

    /// Stop the poller and wait for it
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.poller.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Notification poller ended abnormally");
        }
        tracing::info!("Rental client shut down");
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn snackbar(&self) -> &Snackbar {
        &self.snackbar
    }

    /// Reservation changes detected by the poller
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ReservationChange> {
        self.changes.subscribe()
    }

    /// Convert a result for the UI, surfacing failures on the Snackbar
    pub fn report<T: Serialize>(&self, result: ClientResult<T>) -> Outcome<T> {
        let outcome = Outcome::from(result);
        if !outcome.success {
            self.snackbar.show(outcome.message.clone());
        }
        outcome
    }
}

impl Drop for RentalClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

//! Demo auth: username-only sign-up and log-in against the sync provider.
//!
//! The view shows the auth overlay until the state reaches
//! [`AuthStateKind::SignedIn`]. The current state is published on a watch
//! channel so other services can follow it.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use mc_core::error::{McError, McResult};
use mc_models::Account;

use crate::context::SyncContext;
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Discriminator of the auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthStateKind {
    /// Existing users have not been loaded yet.
    Loading,
    /// Waiting for the user to sign up or log in.
    Ready,
    SignedIn,
}

impl std::fmt::Display for AuthStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::SignedIn => write!(f, "signedIn"),
        }
    }
}

/// Snapshot of demo auth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthState {
    pub state: AuthStateKind,
    /// Usernames that can log in.
    pub existing_users: Vec<String>,
    /// The signed-in account.
    pub account: Option<Account>,
}

impl AuthState {
    fn loading() -> Self {
        Self {
            state: AuthStateKind::Loading,
            existing_users: Vec::new(),
            account: None,
        }
    }
}

/// Whether the auth overlay must be shown over the primary view.
pub fn should_show_auth_overlay(auth: &AuthState) -> bool {
    auth.state != AuthStateKind::SignedIn
}

/// Demo auth service.
pub struct DemoAuth {
    state: ServiceState,
    context: SyncContext,
    event_bus: EventBus,
    auth_tx: watch::Sender<AuthState>,
}

impl DemoAuth {
    pub fn new(context: SyncContext, event_bus: EventBus) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::loading());
        Self {
            state: ServiceState::Created,
            context,
            event_bus,
            auth_tx,
        }
    }

    pub fn current(&self) -> AuthState {
        self.auth_tx.borrow().clone()
    }

    /// Follow auth state changes.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    pub fn account(&self) -> Option<Account> {
        self.auth_tx.borrow().account.clone()
    }

    /// Load the known usernames. Moves `Loading` to `Ready`.
    pub async fn refresh(&mut self) -> McResult<()> {
        let users = self.existing_users().await?;
        let signed_in = self.auth_tx.borrow().state == AuthStateKind::SignedIn;
        if signed_in {
            self.auth_tx.send_modify(|auth| auth.existing_users = users);
        } else {
            self.publish(AuthState {
                state: AuthStateKind::Ready,
                existing_users: users,
                account: None,
            });
        }
        Ok(())
    }

    /// Create a new account and sign in as it.
    pub async fn sign_up(&mut self, username: &str) -> McResult<Account> {
        self.ensure_signed_out()?;
        let username = normalize(username)?;
        let account = self.context.provider()?.create_account(username).await?;
        info!("signed up as {}", account.username);
        self.sign_in(account.clone()).await?;
        Ok(account)
    }

    /// Sign in as an existing account.
    pub async fn log_in(&mut self, username: &str) -> McResult<Account> {
        self.ensure_signed_out()?;
        let username = normalize(username)?;
        let account = self
            .context
            .provider()?
            .find_account(username)
            .await?
            .ok_or_else(|| McError::Auth(format!("no account named {username}")))?;
        info!("logged in as {}", account.username);
        self.sign_in(account.clone()).await?;
        Ok(account)
    }

    /// Sign out. No-op when nobody is signed in.
    pub async fn log_out(&mut self) -> McResult<()> {
        if self.auth_tx.borrow().state != AuthStateKind::SignedIn {
            debug!("log_out with nobody signed in");
            return Ok(());
        }
        let users = self.existing_users().await?;
        self.publish(AuthState {
            state: AuthStateKind::Ready,
            existing_users: users,
            account: None,
        });
        info!("logged out");
        Ok(())
    }

    async fn sign_in(&mut self, account: Account) -> McResult<()> {
        let users = self.existing_users().await?;
        self.publish(AuthState {
            state: AuthStateKind::SignedIn,
            existing_users: users,
            account: Some(account),
        });
        Ok(())
    }

    async fn existing_users(&self) -> McResult<Vec<String>> {
        let accounts = self.context.provider()?.list_accounts().await?;
        Ok(accounts.into_iter().map(|a| a.username).collect())
    }

    fn ensure_signed_out(&self) -> McResult<()> {
        if self.auth_tx.borrow().state == AuthStateKind::SignedIn {
            return Err(McError::InvalidState("already signed in".into()));
        }
        Ok(())
    }

    fn publish(&self, auth: AuthState) {
        let event = AppEvent::AuthStateChanged {
            state: auth.state,
            username: auth.account.as_ref().map(|a| a.username.clone()),
        };
        self.auth_tx.send_replace(auth);
        self.event_bus.emit(event);
    }
}

fn normalize(username: &str) -> McResult<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(McError::Auth("username must not be empty".into()));
    }
    Ok(username)
}

impl Service for DemoAuth {
    fn name(&self) -> &str {
        "auth"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> McResult<()> {
        self.state = ServiceState::Running;
        info!("auth service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> McResult<()> {
        self.state = ServiceState::Stopped;
        info!("auth service stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mc_core::constants::DEFAULT_SYNC_PEER;
    use mc_sync::{MemoryProvider, PeerEndpoint};

    async fn auth() -> DemoAuth {
        let endpoint = PeerEndpoint::parse(DEFAULT_SYNC_PEER).unwrap();
        let ctx = SyncContext::new(Arc::new(MemoryProvider::new()), endpoint);
        let bus = EventBus::new(16);
        ctx.connect(&bus).await.unwrap();
        DemoAuth::new(ctx, bus)
    }

    #[tokio::test]
    async fn test_overlay_tracks_auth_state() {
        let mut auth = auth().await;
        assert_eq!(auth.current().state, AuthStateKind::Loading);
        assert!(should_show_auth_overlay(&auth.current()));

        auth.refresh().await.unwrap();
        assert_eq!(auth.current().state, AuthStateKind::Ready);
        assert!(should_show_auth_overlay(&auth.current()));

        auth.sign_up("alice").await.unwrap();
        assert_eq!(auth.current().state, AuthStateKind::SignedIn);
        assert!(!should_show_auth_overlay(&auth.current()));

        auth.log_out().await.unwrap();
        assert!(should_show_auth_overlay(&auth.current()));
        assert_eq!(auth.current().existing_users, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_log_in_requires_existing_user() {
        let mut auth = auth().await;
        auth.refresh().await.unwrap();
        assert!(matches!(auth.log_in("bob").await, Err(McError::Auth(_))));

        auth.sign_up(" bob ").await.unwrap();
        auth.log_out().await.unwrap();
        let account = auth.log_in("bob").await.unwrap();
        assert_eq!(account.username, "bob");
        assert_eq!(auth.account(), Some(account));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_blank_and_double_sign_in() {
        let mut auth = auth().await;
        assert!(matches!(auth.sign_up("   ").await, Err(McError::Auth(_))));
        auth.sign_up("carol").await.unwrap();
        assert!(matches!(auth.sign_up("dave").await, Err(McError::InvalidState(_))));
    }

    #[test]
    fn test_state_kind_serializes_camel_case() {
        let json = serde_json::to_string(&AuthStateKind::SignedIn).unwrap();
        assert_eq!(json, "\"signedIn\"");
    }
}

//! Current-session tracking with change notification.

use std::time::Duration;

use tokio::sync::watch;

use super::{
    AuthError, AuthResult, AuthSession, AuthUser, SessionPersistence, SignUpOutcome,
    SupabaseAuthClient,
};

/// Session state as seen by subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Startup restore has not finished yet
    #[default]
    Pending,
    /// Restore finished; `None` means anonymous
    Resolved(Option<AuthSession>),
}

impl SessionState {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Resolved(Some(session)) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        self.session().map(|session| &session.user)
    }
}

/// Receiving side of session transitions.
pub type SessionWatch = watch::Receiver<SessionState>;

/// Owns the signed-in session (or its absence) for one running app.
///
/// Every transition, including the initial resolution, is published on a
/// watch channel. Without an auth client the manager is local-only and
/// resolves straight to anonymous.
pub struct AuthSessionManager<S: SessionPersistence> {
    client: Option<SupabaseAuthClient<S>>,
    state: watch::Sender<SessionState>,
}

impl<S: SessionPersistence> AuthSessionManager<S> {
    pub fn new(client: Option<SupabaseAuthClient<S>>) -> Self {
        let (state, _) = watch::channel(SessionState::Pending);
        Self { client, state }
    }

    /// Manager for builds without a configured auth backend.
    pub fn local_only() -> Self {
        Self::new(None)
    }

    pub const fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Restore the persisted session once and mark the state resolved.
    ///
    /// Restore failures are logged and resolve to anonymous so startup can
    /// continue in local mode.
    pub async fn initialize(&self) -> Option<AuthUser> {
        let restored = match &self.client {
            Some(client) => client.restore_session().await.unwrap_or_else(|error| {
                tracing::warn!("Could not restore auth session: {}", error);
                None
            }),
            None => None,
        };
        self.adopt_session(restored);
        self.current_user()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let client = self.client()?;
        let session = client.sign_in(email, password).await?;
        let user = session.user.clone();
        self.adopt_session(Some(session));
        tracing::info!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let client = self.client()?;
        let outcome = client.sign_up(email, password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.adopt_session(Some(session.clone()));
        }
        Ok(outcome)
    }

    /// Sign out remotely when possible; the local session is always dropped.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let session = self.current_session();
        if let (Some(client), Some(session)) = (&self.client, session) {
            if let Err(error) = client.sign_out(&session.access_token).await {
                tracing::warn!("Remote sign-out failed, clearing local session: {}", error);
                client.forget_session()?;
            }
        }
        self.adopt_session(None);
        Ok(())
    }

    /// Publish a session obtained outside the sign-in flow.
    pub fn adopt_session(&self, session: Option<AuthSession>) {
        self.state.send_replace(SessionState::Resolved(session));
    }

    pub fn subscribe(&self) -> SessionWatch {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().session().is_some()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        self.state.borrow().session().cloned()
    }

    /// Wait until the startup restore has resolved, up to `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> AuthResult<Option<AuthUser>> {
        let mut receiver = self.state.subscribe();
        let resolved = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(SessionState::is_resolved)
                .await
                .map(|state| state.user().cloned())
        })
        .await;

        match resolved {
            Ok(Ok(user)) => Ok(user),
            Ok(Err(_)) | Err(_) => Err(AuthError::NotReady),
        }
    }

    fn client(&self) -> AuthResult<&SupabaseAuthClient<S>> {
        self.client.as_ref().ok_or(AuthError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStore;

    fn session_for(user_id: &str) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX / 2,
            user: AuthUser {
                id: user_id.to_string(),
                email: Some(format!("{user_id}@example.com")),
            },
        }
    }

    #[tokio::test]
    async fn local_only_manager_resolves_anonymous() {
        let manager = AuthSessionManager::<MemorySessionStore>::local_only();
        assert!(!manager.is_configured());
        assert_eq!(manager.initialize().await, None);
        assert_eq!(
            manager.wait_ready(Duration::from_millis(10)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn restores_persisted_session_on_initialize() {
        let store = MemorySessionStore::default();
        store.save_session(&session_for("u1")).unwrap();
        let client = SupabaseAuthClient::new("https://demo.supabase.co", "anon", store).unwrap();
        let manager = AuthSessionManager::new(Some(client));

        let user = manager.initialize().await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(manager.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_ready_times_out_while_pending() {
        let manager = AuthSessionManager::<MemorySessionStore>::local_only();
        let error = manager
            .wait_ready(Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(error, AuthError::NotReady));
    }

    #[tokio::test]
    async fn subscribers_see_every_transition() {
        let manager = AuthSessionManager::<MemorySessionStore>::local_only();
        let mut watch = manager.subscribe();

        manager.adopt_session(Some(session_for("u1")));
        watch.changed().await.unwrap();
        assert_eq!(watch.borrow_and_update().user().unwrap().id, "u1");

        manager.sign_out().await.unwrap();
        watch.changed().await.unwrap();
        assert_eq!(*watch.borrow_and_update(), SessionState::Resolved(None));
    }

    #[tokio::test]
    async fn sign_in_without_backend_is_not_configured() {
        let manager = AuthSessionManager::<MemorySessionStore>::local_only();
        let error = manager.sign_in("a@b.c", "secret").await.unwrap_err();
        assert!(matches!(error, AuthError::NotConfigured));
    }
}

//! Session persistence in the OS keychain, one entry per CLI profile.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use inkpad_core::auth::{
    AuthError, AuthResult, AuthSession, AuthSessionManager, SessionPersistence,
    SupabaseAuthClient,
};
use inkpad_core::config::BackendConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "inkpad-cli";

#[derive(Clone)]
pub struct KeyringSessionStore {
    username: String,
}

impl KeyringSessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for KeyringSessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .remove(&self.username);
        Ok(())
    }
}

pub type CliSessionManager = AuthSessionManager<KeyringSessionStore>;

/// Session manager for a profile; local-only when no backend is configured.
pub fn session_manager(
    profile_name: &str,
    backend: Option<&BackendConfig>,
) -> AuthResult<CliSessionManager> {
    let client = backend
        .map(|config| {
            SupabaseAuthClient::new(
                &config.supabase_url,
                config.supabase_anon_key.clone(),
                KeyringSessionStore::new(profile_name),
            )
        })
        .transpose()?;
    Ok(AuthSessionManager::new(client))
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    KeyringSessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    KeyringSessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use inkpad_core::auth::AuthUser;

    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: Some("user@example.com".to_string()),
            },
        }
    }

    #[test]
    fn sessions_are_scoped_per_profile() {
        let work = KeyringSessionStore::new("auth-test-work");
        work.save_session(&session()).unwrap();

        assert_eq!(load_stored_session("auth-test-work").unwrap(), Some(session()));
        assert_eq!(load_stored_session("auth-test-home").unwrap(), None);

        clear_stored_session("auth-test-work").unwrap();
        assert_eq!(load_stored_session("auth-test-work").unwrap(), None);
    }

    #[test]
    fn manager_without_backend_is_local_only() {
        let manager = session_manager("auth-test-local", None).unwrap();
        assert!(!manager.is_configured());
    }

    #[test]
    fn manager_with_backend_is_configured() {
        let backend = BackendConfig::resolve(
            Some("https://demo.supabase.co".to_string()),
            Some("anon".to_string()),
            None,
        )
        .unwrap()
        .unwrap();
        let manager = session_manager("auth-test-remote", Some(&backend)).unwrap();
        assert!(manager.is_configured());
    }
}

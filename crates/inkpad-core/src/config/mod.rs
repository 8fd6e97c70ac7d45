//! Backend and store configuration.
//!
//! A missing backend configuration is valid and means local-only mode; a
//! half-filled one is an error so typos do not silently disable sync.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_NOTES_TABLE: &str = "notes";
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const NOTES_TABLE_ENV: &str = "INKPAD_NOTES_TABLE";

/// Public endpoint and key for the hosted notes backend.
///
/// The anon key is safe to ship; row access is enforced per user server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    #[serde(default = "default_notes_table")]
    pub notes_table: String,
}

fn default_notes_table() -> String {
    DEFAULT_NOTES_TABLE.to_string()
}

impl BackendConfig {
    /// Validate and normalize raw values; all-empty input yields `Ok(None)`.
    pub fn resolve(
        url: Option<String>,
        anon_key: Option<String>,
        notes_table: Option<String>,
    ) -> Result<Option<Self>, String> {
        let url = normalize_text_option(url);
        let anon_key = normalize_text_option(anon_key);

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                if !is_http_url(&url) {
                    return Err(format!(
                        "{SUPABASE_URL_ENV} must include http:// or https://"
                    ));
                }
                Ok(Some(Self {
                    supabase_url: url.trim_end_matches('/').to_string(),
                    supabase_anon_key: anon_key,
                    notes_table: normalize_text_option(notes_table)
                        .unwrap_or_else(default_notes_table),
                }))
            }
            (Some(_), None) => Err(format!(
                "{SUPABASE_URL_ENV} is set but {SUPABASE_ANON_KEY_ENV} is missing"
            )),
            (None, Some(_)) => Err(format!(
                "{SUPABASE_ANON_KEY_ENV} is set but {SUPABASE_URL_ENV} is missing"
            )),
        }
    }

    /// Read `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `INKPAD_NOTES_TABLE`.
    pub fn from_env() -> Result<Option<Self>, String> {
        Self::resolve(
            std::env::var(SUPABASE_URL_ENV).ok(),
            std::env::var(SUPABASE_ANON_KEY_ENV).ok(),
            std::env::var(NOTES_TABLE_ENV).ok(),
        )
    }

    /// PostgREST endpoint of the notes table.
    pub fn notes_endpoint(&self) -> String {
        let base = self
            .supabase_url
            .trim_end_matches('/')
            .trim_end_matches("/auth/v1");
        format!("{base}/rest/v1/{}", self.notes_table)
    }
}

/// Tunables for the note store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Quiet period before an auto-save is written
    pub autosave_debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_allows_fully_absent_config() {
        assert_eq!(BackendConfig::resolve(None, Some("  ".into()), None), Ok(None));
    }

    #[test]
    fn resolve_rejects_partial_config() {
        let error =
            BackendConfig::resolve(Some("https://x.supabase.co".into()), None, None).unwrap_err();
        assert!(error.contains(SUPABASE_ANON_KEY_ENV));
        assert!(BackendConfig::resolve(None, Some("anon".into()), None).is_err());
    }

    #[test]
    fn resolve_requires_http_scheme() {
        let error =
            BackendConfig::resolve(Some("x.supabase.co".into()), Some("anon".into()), None)
                .unwrap_err();
        assert!(error.contains("http"));
    }

    #[test]
    fn notes_endpoint_uses_rest_path_and_default_table() {
        let config = BackendConfig::resolve(
            Some(" https://x.supabase.co/ ".into()),
            Some("anon".into()),
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.notes_table, "notes");
        assert_eq!(config.notes_endpoint(), "https://x.supabase.co/rest/v1/notes");
    }

    #[test]
    fn default_debounce_is_two_seconds() {
        assert_eq!(
            StoreOptions::default().autosave_debounce,
            Duration::from_secs(2)
        );
    }
}

//! Supabase GoTrue client: password sign-up/sign-in, refresh and sign-out.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{
    AuthError, AuthResult, AuthSession, AuthUser, SessionPersistence, SignUpOutcome,
    MIN_PASSWORD_LEN,
};
use crate::util::{is_http_url, unix_timestamp_now};

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

/// OAuth grant posted to `/token`.
enum Grant<'a> {
    Password { email: &'a str, password: &'a str },
    Refresh { refresh_token: &'a str },
}

impl Grant<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::Refresh { .. } => "refresh_token",
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Password { email, password } => {
                serde_json::json!({ "email": email.trim(), "password": password })
            }
            Self::Refresh { refresh_token } => {
                serde_json::json!({ "refresh_token": refresh_token })
            }
        }
    }
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// The persisted session, refreshed first when it has expired.
    ///
    /// A session that cannot be refreshed is forgotten rather than failing
    /// startup.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(saved) = self.store.load_session()? else {
            return Ok(None);
        };
        if !saved.is_expired() {
            return Ok(Some(saved));
        }

        match self.refresh_session(&saved.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Dropping saved session that could not be refreshed: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Register an account. Projects with email confirmation enabled answer
    /// without a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let body = serde_json::json!({ "email": email.trim(), "password": password });
        let response = self
            .post("signup", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let payload = ensure_success(response)
            .await?
            .json::<GoTrueResponse>()
            .await?;

        let Some(session) = payload.into_session()? else {
            return Ok(SignUpOutcome::ConfirmationRequired);
        };
        self.store.save_session(&session)?;
        Ok(SignUpOutcome::SignedIn(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;
        self.token(Grant::Password { email, password }).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }
        self.token(Grant::Refresh { refresh_token }).await
    }

    /// Revoke the session server-side and forget it locally.
    ///
    /// An already-invalid token (401) still counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self.post("logout", access_token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            ensure_success(response).await?;
        }
        self.store.clear_session()
    }

    pub fn forget_session(&self) -> AuthResult<()> {
        self.store.clear_session()
    }

    async fn token(&self, grant: Grant<'_>) -> AuthResult<AuthSession> {
        let response = self
            .post("token", &self.anon_key)
            .query(&[("grant_type", grant.name())])
            .json(&grant.body())
            .send()
            .await?;
        let session = ensure_success(response)
            .await?
            .json::<GoTrueResponse>()
            .await?
            .into_session()?
            .ok_or_else(|| {
                AuthError::Api(format!(
                    "The {} grant returned no session",
                    grant.name()
                ))
            })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    /// A POST to `{auth_url}/{path}` carrying the project key. `bearer` is
    /// the anon key for public endpoints or a user's access token.
    fn post(&self, path: &str, bearer: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{path}", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

async fn ensure_success(response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Api(parse_api_error(status, &body)))
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let base = url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(base) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    let base = base.strip_suffix("/auth/v1").unwrap_or(base);
    Ok(format!("{base}/auth/v1"))
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Validation("Email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    Ok(())
}

/// Session fields as GoTrue sends them, at the top level or under `session`.
#[derive(Debug, Default, Deserialize)]
struct SessionFields {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
}

impl SessionFields {
    fn or(self, other: Self) -> Self {
        Self {
            access_token: self.access_token.or(other.access_token),
            refresh_token: self.refresh_token.or(other.refresh_token),
            expires_at: self.expires_at.or(other.expires_at),
            expires_in: self.expires_in.or(other.expires_in),
            user: self.user.or(other.user),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueResponse {
    #[serde(flatten)]
    fields: SessionFields,
    session: Option<SessionFields>,
}

impl GoTrueResponse {
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let fields = self.fields.or(self.session.unwrap_or_default());
        let expires_at = fields.expires_at.or_else(|| {
            fields
                .expires_in
                .map(|seconds| unix_timestamp_now().saturating_add(seconds))
        });

        match (fields.access_token, fields.refresh_token, expires_at, fields.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: AuthUser {
                        id: user.id,
                        email: user.email,
                    },
                }))
            }
            // Sign-up awaiting email confirmation returns only the user.
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response is missing session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

/// GoTrue has used each of these keys for the human-readable message.
#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<GoTrueErrorBody>(body)
        .ok()
        .and_then(|payload| {
            payload
                .message
                .or(payload.msg)
                .or(payload.error_description)
                .or(payload.error)
        })
        .map_or_else(|| crate::util::compact_text(body), |message| message.trim().to_string());

    if message.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{message} ({})", status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStore;

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        assert_eq!(
            normalize_auth_url("https://demo.supabase.co/").unwrap(),
            "https://demo.supabase.co/auth/v1"
        );
        assert_eq!(
            normalize_auth_url("https://demo.supabase.co/auth/v1").unwrap(),
            "https://demo.supabase.co/auth/v1"
        );
        assert!(normalize_auth_url("demo.supabase.co").is_err());
    }

    #[test]
    fn user_only_response_means_confirmation_required() {
        let response: GoTrueResponse =
            serde_json::from_str(r#"{"user":{"id":"u1","email":"a@b.c"}}"#).unwrap();
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn nested_session_with_expires_in_is_accepted() {
        let response: GoTrueResponse = serde_json::from_str(
            r#"{"session":{"access_token":"at","refresh_token":"rt","expires_in":3600,
                "user":{"id":"u1","email":null}}}"#,
        )
        .unwrap();
        let session = response.into_session().unwrap().unwrap();
        assert_eq!(session.user.id, "u1");
        assert!(!session.is_expired());
    }

    #[test]
    fn top_level_fields_win_over_nested_session() {
        let response: GoTrueResponse = serde_json::from_str(
            r#"{"access_token":"top","refresh_token":"rt","expires_at":10,
                "user":{"id":"u1"},
                "session":{"access_token":"nested","expires_at":20}}"#,
        )
        .unwrap();
        let session = response.into_session().unwrap().unwrap();
        assert_eq!(session.access_token, "top");
        assert_eq!(session.expires_at, 10);
    }

    #[test]
    fn partial_session_is_an_error() {
        let response: GoTrueResponse =
            serde_json::from_str(r#"{"access_token":"at","user":{"id":"u1"}}"#).unwrap();
        assert!(matches!(response.into_session(), Err(AuthError::Api(_))));
    }

    #[test]
    fn parse_api_error_prefers_message_fields() {
        assert_eq!(
            parse_api_error(
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials (400)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[tokio::test]
    async fn sign_up_rejects_short_password_before_any_request() {
        let client =
            SupabaseAuthClient::new("https://demo.supabase.co", "anon", MemorySessionStore::default())
                .unwrap();
        let error = client.sign_up("me@example.com", "12345").await.unwrap_err();
        assert!(matches!(error, AuthError::Validation(_)));

        let error = client.sign_in("  ", "password").await.unwrap_err();
        assert!(matches!(error, AuthError::Validation(_)));
    }
}

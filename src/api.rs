//! REST envelope and auth interceptor shared by API clients
//!
//! Every API response is wrapped as `{ code, message, data }`. Requests
//! carry the bearer token from local storage; a 401 (HTTP status or envelope
//! code) drops the auth state and raises a single "session expired" toast.

use crate::error::{FreshenError, FreshenResult};
use crate::storage::{KeyValueStore, AUTH_KEYS, TOKEN_KEY};
use crate::toast::{ToastLevel, ToastService};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Message shown when the server rejects the token
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// How long the session-expired toast stays up
pub const SESSION_EXPIRED_TOAST: Duration = Duration::from_secs(3);

const UNAUTHORIZED: i64 = 401;

/// Response envelope used by every endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default, alias = "msg")]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.code == 200 || self.code == 0
    }
}

/// Transport-level failure of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    /// Server answered with a non-success status
    Status(u16),
    /// No usable response
    Transport(String),
}

/// Attaches credentials and reacts to rejected credentials
#[derive(Clone)]
pub struct AuthInterceptor {
    store: Arc<dyn KeyValueStore>,
    toasts: ToastService,
}

impl AuthInterceptor {
    pub fn new(store: Arc<dyn KeyValueStore>, toasts: ToastService) -> Self {
        Self { store, toasts }
    }

    /// `Authorization` header value, when a token is stored
    pub fn authorization(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => Some(format!("Bearer {}", token.trim())),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read auth token: {}", e);
                None
            }
        }
    }

    /// Drop auth state, notify the user, and produce the error to return
    pub fn on_unauthorized(&self) -> FreshenError {
        for key in AUTH_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove {}: {}", key, e);
            }
        }
        self.toasts.show_once(
            ToastLevel::Warning,
            SESSION_EXPIRED_MESSAGE,
            Some(SESSION_EXPIRED_TOAST),
        );
        FreshenError::Unauthorized
    }

    /// Turn a raw response (or failure) into the envelope's `data`
    pub fn interpret<T: DeserializeOwned>(
        &self,
        url: &str,
        response: Result<String, HttpFailure>,
    ) -> FreshenResult<T> {
        let body = match response {
            Ok(body) => body,
            Err(HttpFailure::Status(401)) => return Err(self.on_unauthorized()),
            Err(HttpFailure::Status(status)) => {
                return Err(FreshenError::ApiStatus {
                    url: url.to_string(),
                    status,
                })
            }
            Err(HttpFailure::Transport(reason)) => return Err(FreshenError::Http(reason)),
        };

        let envelope: ApiEnvelope = serde_json::from_str(&body)?;
        if envelope.code == UNAUTHORIZED {
            return Err(self.on_unauthorized());
        }
        if !envelope.is_success() {
            return Err(FreshenError::ApiEnvelope {
                code: envelope.code,
                message: envelope.message,
            });
        }

        Ok(serde_json::from_value(envelope.data)?)
    }
}

/// Minimal JSON API client built on the interceptor
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    interceptor: AuthInterceptor,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, interceptor: AuthInterceptor) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_defaults(),
            interceptor,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and return the envelope's `data`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> FreshenResult<T> {
        let url = self.url(path);
        let auth = self.interceptor.authorization();
        let agent = self.agent.clone();
        debug!("GET {}", url);

        let request_url = url.clone();
        let response = tokio::task::spawn_blocking(move || -> Result<String, HttpFailure> {
            let mut request = agent.get(&request_url).header("Accept", "application/json");
            if let Some(auth) = auth {
                request = request.header("Authorization", auth);
            }
            let mut response = request.call().map_err(|e| match e {
                ureq::Error::StatusCode(status) => HttpFailure::Status(status),
                other => HttpFailure::Transport(other.to_string()),
            })?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| HttpFailure::Transport(e.to_string()))
        })
        .await
        .map_err(|e| FreshenError::Internal(format!("request task failed: {}", e)))?;

        self.interceptor.interpret(&url, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, ROLES_KEY, USER_INFO_KEY};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Counter {
        id: u32,
        name: String,
    }

    fn interceptor() -> (AuthInterceptor, Arc<MemoryStore>, ToastService) {
        let store = Arc::new(MemoryStore::with_entries([
            (TOKEN_KEY, "jwt-123"),
            (USER_INFO_KEY, "{}"),
            (ROLES_KEY, "[]"),
            ("tablePageSize", "20"),
        ]));
        let toasts = ToastService::new();
        (
            AuthInterceptor::new(store.clone(), toasts.clone()),
            store,
            toasts,
        )
    }

    #[test]
    fn bearer_header_from_store() {
        let (interceptor, store, _) = interceptor();
        assert_eq!(interceptor.authorization().as_deref(), Some("Bearer jwt-123"));
        store.remove(TOKEN_KEY).unwrap();
        assert!(interceptor.authorization().is_none());
    }

    #[tokio::test]
    async fn success_envelope_yields_data() {
        let (interceptor, _, _) = interceptor();
        let counter: Counter = interceptor
            .interpret(
                "/counters/1",
                Ok(r#"{"code":200,"message":"ok","data":{"id":1,"name":"Window A"}}"#.to_string()),
            )
            .unwrap();
        assert_eq!(
            counter,
            Counter {
                id: 1,
                name: "Window A".to_string()
            }
        );
    }

    #[tokio::test]
    async fn error_envelope_carries_message() {
        let (interceptor, _, _) = interceptor();
        let err = interceptor
            .interpret::<serde_json::Value>("/tickets", Ok(r#"{"code":500,"msg":"queue closed"}"#.to_string()))
            .unwrap_err();
        match err {
            FreshenError::ApiEnvelope { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "queue closed");
            }
            other => panic!("expected ApiEnvelope, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unauthorized_clears_auth_and_toasts_once() {
        let (interceptor, store, toasts) = interceptor();

        let first = interceptor.interpret::<serde_json::Value>("/me", Err(HttpFailure::Status(401)));
        let second = interceptor.interpret::<serde_json::Value>(
            "/me",
            Ok(r#"{"code":401,"message":"expired"}"#.to_string()),
        );

        assert!(matches!(first, Err(FreshenError::Unauthorized)));
        assert!(matches!(second, Err(FreshenError::Unauthorized)));
        assert_eq!(store.keys().unwrap(), vec!["tablePageSize"]);

        let active = toasts.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, SESSION_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn other_status_is_retryable() {
        let (interceptor, store, _) = interceptor();
        let err = interceptor
            .interpret::<serde_json::Value>("/tickets", Err(HttpFailure::Status(503)))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
    }

    #[test]
    fn url_joins_cleanly() {
        let (interceptor, _, _) = interceptor();
        let client = ApiClient::new("https://api.example/v1/", interceptor);
        assert_eq!(client.url("/counters"), "https://api.example/v1/counters");
        assert_eq!(client.url("roles"), "https://api.example/v1/roles");
    }
}

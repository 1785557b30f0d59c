//! Session credentials and the session-invalidation hook.
//!
//! The pipeline never re-authenticates. It attaches whatever bearer token
//! the session holds and reports 401 responses back through
//! [`SessionHandler::on_unauthenticated`].

use std::sync::RwLock;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

pub trait SessionHandler: Send + Sync {
    /// Whether a bearer token is currently held.
    fn is_authenticated(&self) -> bool;

    /// Attach credentials (if any) to an outgoing request.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;

    /// Called whenever an upstream call answers 401.
    fn on_unauthenticated(&self);
}

type ExpiryHook = Box<dyn Fn() + Send + Sync>;

/// Session backed by an in-memory token and a caller-supplied expiry hook.
///
/// On a 401 the token is dropped first, then the hook runs.
pub struct StaticSession {
    token: RwLock<Option<SecretString>>,
    on_expired: ExpiryHook,
}

impl StaticSession {
    pub fn new(token: Option<String>, on_expired: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty()).map(SecretString::from)),
            on_expired: Box::new(on_expired),
        }
    }

    /// Session with no token and a no-op hook.
    pub fn anonymous() -> Self {
        Self::new(None, || {})
    }

    pub fn set_token(&self, token: String) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(SecretString::from(token));
    }
}

impl SessionHandler for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    fn on_unauthenticated(&self) {
        {
            let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
            *guard = None;
        }
        tracing::warn!("Session rejected by upstream; token cleared");
        (self.on_expired)();
    }
}

impl std::fmt::Debug for StaticSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

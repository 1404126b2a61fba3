use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

// Keys held in durable client-side storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    // Bearer token attached to every request.
    Access,
    // Rotation token returned alongside the access token.
    Refresh,
    // Correlates the login and OTP-verify steps; removed once verification succeeds.
    Email,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [SessionKey::Access, SessionKey::Refresh, SessionKey::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Access => "access",
            SessionKey::Refresh => "refresh",
            SessionKey::Email => "email",
        }
    }
}

// Port for session storage used by the pipeline and the sign-in flow.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, String>;
    async fn set(&self, key: SessionKey, value: String) -> Result<(), String>;
    async fn remove(&self, key: SessionKey) -> Result<bool, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session storage failure: {0}")]
pub struct StoreError(pub String);

// Opaque bearer credential. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Process-wide credential holder over an injected [`SessionStore`].
///
/// Writes happen only on OTP verification and sign-out, which the user serializes.
/// Nothing locks across an invocation, so a request racing a token rewrite may
/// carry either the old or the new token.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn SessionStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn access_token(&self) -> Result<Option<SessionToken>, StoreError> {
        let token = self.store.get(SessionKey::Access).await.map_err(StoreError)?;
        Ok(token.filter(|value| !value.is_empty()).map(SessionToken::new))
    }

    // Stores both tokens or neither: a failed refresh write rolls the access token back.
    pub async fn store_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        self.store
            .set(SessionKey::Access, access.to_string())
            .await
            .map_err(StoreError)?;

        if let Err(err) = self.store.set(SessionKey::Refresh, refresh.to_string()).await {
            if let Err(rollback) = self.store.remove(SessionKey::Access).await {
                tracing::error!(error = %rollback, "failed to roll back access token.");
            }
            return Err(StoreError(err));
        }
        Ok(())
    }

    pub async fn pending_email(&self) -> Result<Option<String>, StoreError> {
        self.store.get(SessionKey::Email).await.map_err(StoreError)
    }

    pub async fn set_pending_email(&self, email: &str) -> Result<(), StoreError> {
        self.store
            .set(SessionKey::Email, email.to_string())
            .await
            .map_err(StoreError)
    }

    pub async fn clear_pending_email(&self) -> Result<(), StoreError> {
        self.store
            .remove(SessionKey::Email)
            .await
            .map(|_| ())
            .map_err(StoreError)
    }

    // Drops every stored value; later requests go out without a bearer header.
    pub async fn clear(&self) -> Result<(), StoreError> {
        for key in SessionKey::ALL {
            self.store.remove(key).await.map_err(StoreError)?;
        }
        Ok(())
    }
}

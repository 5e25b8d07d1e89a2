//! Service authentication
//!
//! Credentials are either absent ("no auth", for emulators and public data)
//! or come from Application Default Credentials: a service account key, the
//! gcloud user login, or the metadata server.

use anyhow::{Context, Result};
use gcp_auth::TokenProvider;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Credentials used to authorize service requests
#[derive(Clone)]
pub struct AuthCredentials {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    NoAuth,
    Provider {
        provider: Arc<dyn TokenProvider>,
        token_cache: Arc<RwLock<Option<CachedToken>>>,
    },
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    scopes: Vec<String>,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid_for(&self, scopes: &[&str]) -> bool {
        Instant::now() < self.expires_at && self.scopes.iter().map(String::as_str).eq(scopes.iter().copied())
    }
}

impl AuthCredentials {
    /// Credentials from the Application Default Credentials chain
    pub async fn application_default() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
        )?;

        Ok(Self::from_provider(provider))
    }

    /// Credentials that never attach a token
    pub fn no_auth() -> Self {
        Self { inner: Inner::NoAuth }
    }

    pub fn from_provider(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner: Inner::Provider {
                provider,
                token_cache: Arc::new(RwLock::new(None)),
            },
        }
    }

    pub fn is_no_auth(&self) -> bool {
        matches!(self.inner, Inner::NoAuth)
    }

    /// Access token for the given scopes, `None` for no-auth credentials
    pub async fn token(&self, scopes: &[&str]) -> Result<Option<String>> {
        let Inner::Provider {
            provider,
            token_cache,
        } = &self.inner
        else {
            return Ok(None);
        };

        {
            let cache = token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid_for(scopes) {
                    return Ok(Some(cached.token.clone()));
                }
                tracing::debug!("Cached token expired or scoped differently, fetching new token");
            }
        }

        let token = provider
            .token(scopes)
            .await
            .context("Failed to get access token")?;
        let token_str = token.as_str().to_string();

        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;
        {
            let mut cache = token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                scopes: scopes.iter().map(|s| s.to_string()).collect(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(Some(token_str))
    }

    /// Drop any cached token and fetch a fresh one
    pub async fn refresh_token(&self, scopes: &[&str]) -> Result<Option<String>> {
        if let Inner::Provider { token_cache, .. } = &self.inner {
            let mut cache = token_cache.write().await;
            *cache = None;
        }

        self.token(scopes).await
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Inner::NoAuth => f.write_str("AuthCredentials::NoAuth"),
            Inner::Provider { .. } => f.write_str("AuthCredentials::ApplicationDefault"),
        }
    }
}

/// No-auth credentials are all equal; provider credentials are equal when they share a provider
impl PartialEq for AuthCredentials {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Inner::NoAuth, Inner::NoAuth) => true,
            (Inner::Provider { provider: a, .. }, Inner::Provider { provider: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_auth_has_no_token() {
        let credentials = AuthCredentials::no_auth();
        assert!(credentials.is_no_auth());
        assert_eq!(credentials.token(&["scope"]).await.unwrap(), None);
        assert_eq!(credentials.refresh_token(&["scope"]).await.unwrap(), None);
    }

    #[test]
    fn test_no_auth_equality() {
        assert_eq!(AuthCredentials::no_auth(), AuthCredentials::no_auth());
    }

    #[test]
    fn test_cached_token_scope_match() {
        let cached = CachedToken {
            token: "t".to_string(),
            scopes: vec!["a".to_string(), "b".to_string()],
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(cached.is_valid_for(&["a", "b"]));
        assert!(!cached.is_valid_for(&["a"]));

        let expired = CachedToken {
            expires_at: Instant::now() - Duration::from_secs(1),
            ..cached
        };
        assert!(!expired.is_valid_for(&["a", "b"]));
    }
}

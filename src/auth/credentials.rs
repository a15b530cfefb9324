//! Credential management for Twitter API authentication.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

/// A bearer token for application-only authentication.
#[derive(Clone)]
pub struct BearerToken {
    token: SecretString,
}

impl BearerToken {
    /// Create a new bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    /// Get the token value for building the `Authorization` header.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing API credentials.
///
/// Implement this trait to customize how the bearer token is retrieved,
/// for example from a secrets manager or environment variables.
pub trait CredentialsProvider: Send + Sync {
    /// Get the bearer token.
    fn bearer_token(&self) -> &BearerToken;
}

/// Static credentials provider that holds the token directly.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    token: BearerToken,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: BearerToken::new(token),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn bearer_token(&self) -> &BearerToken {
        &self.token
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn bearer_token(&self) -> &BearerToken {
        &self.token
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads the token from `TWITTER_BEARER_TOKEN`.
#[derive(Debug)]
pub struct EnvCredentials {
    token: BearerToken,
}

impl EnvCredentials {
    /// Environment variable holding the bearer token.
    pub const TOKEN_VAR: &str = "TWITTER_BEARER_TOKEN";

    /// Create credentials from the default environment variable.
    ///
    /// Returns [`TwitterError::MissingCredentials`](crate::TwitterError::MissingCredentials)
    /// if the variable is unset or empty.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_var(Self::TOKEN_VAR)
    }

    /// Create credentials from a custom environment variable.
    pub fn from_var(var: &str) -> crate::Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.is_empty() => Ok(Self {
                token: BearerToken::new(token),
            }),
            _ => Err(crate::TwitterError::MissingCredentials),
        }
    }
}

impl CredentialsProvider for EnvCredentials {
    fn bearer_token(&self) -> &BearerToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = BearerToken::new("super-secret-token");
        let output = format!("{:?}", token);
        assert!(!output.contains("super-secret-token"));
        assert!(output.contains("REDACTED"));
    }

    #[test]
    fn test_static_credentials() {
        let credentials = StaticCredentials::new("abc123");
        assert_eq!(credentials.bearer_token().expose(), "abc123");
    }
}

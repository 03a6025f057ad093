//! Authenticated principal for a gateway session.

use std::fmt;

use crate::error::{Error, Result};

/// Identity and upstream credential produced by the OAuth boundary.
///
/// A principal is built exactly once per session, after the external OAuth
/// collaborator has completed the handshake, and stays immutable for the
/// session's lifetime. The bearer token is usable against the downstream API
/// on the caller's behalf and is therefore redacted from `Debug` output.
#[derive(Clone)]
pub struct Principal {
    login: String,
    access_token: String,
}

impl Principal {
    /// Creates a principal from an account login and an upstream bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrincipal`] if either field is empty after
    /// trimming. Untyped identity material from the OAuth boundary must pass
    /// through this check before the gateway will act on it.
    pub fn new(login: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let login = login.into();
        if login.trim().is_empty() {
            return Err(Error::InvalidPrincipal {
                reason: "login cannot be empty".into(),
            });
        }

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::InvalidPrincipal {
                reason: "access token cannot be empty".into(),
            });
        }

        Ok(Self {
            login,
            access_token,
        })
    }

    /// Returns the opaque account identifier.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the upstream bearer credential.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("login", &self.login)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

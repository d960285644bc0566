//! Login request and authentication outcome.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Authentication request. Never persisted.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Login {
    pub email_address: Option<String>,
    /// Plaintext password
    pub password: Option<String>,
}

// Don't expose the plaintext in debug output
impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("email_address", &self.email_address)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Login {
    pub fn new(email_address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_address: Some(email_address.into()),
            password: Some(password.into()),
        }
    }

    /// Borrow both credentials, rejecting a login with either one missing.
    pub fn credentials(&self) -> DomainResult<(&str, &str)> {
        let email = self
            .email_address
            .as_deref()
            .ok_or_else(|| DomainError::validation("Email address is required"))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| DomainError::validation("Password is required"))?;
        Ok((email, password))
    }
}

/// Result of a login attempt.
///
/// Unknown email and wrong password produce the same rejected result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub matched: bool,
    pub id: String,
}

impl AuthResult {
    pub fn matched(id: impl Into<String>) -> Self {
        Self {
            matched: true,
            id: id.into(),
        }
    }

    pub fn rejected() -> Self {
        Self::default()
    }
}

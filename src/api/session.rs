//! Credentials and the per-attempt authenticated session.

use std::fmt;

use super::models::FolderNode;

/// Username/password pair for the token endpoint.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from user input.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

// Never print the password, not even in debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated context for one sync attempt.
///
/// Built by [`NeatClient::authenticate`](super::NeatClient::authenticate)
/// at the start of every attempt and passed by reference to every listing
/// call. It is never mutated; a new attempt builds a new one.
#[derive(Clone)]
pub struct SessionContext {
    token: String,
    account_id: String,
    top_level_folders: Vec<FolderNode>,
}

impl SessionContext {
    /// Assembles a session from the three authentication responses.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        account_id: impl Into<String>,
        top_level_folders: Vec<FolderNode>,
    ) -> Self {
        Self {
            token: token.into(),
            account_id: account_id.into(),
            top_level_folders,
        }
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// The account identifier.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Folders directly under the account root, in listing order.
    #[must_use]
    pub fn top_level_folders(&self) -> &[FolderNode] {
        &self.top_level_folders
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("top_level_folders", &self.top_level_folders.len())
            .finish()
    }
}

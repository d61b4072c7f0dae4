//! GitHub code search configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Default REST API base URL.
fn default_api_url() -> String {
    String::from("https://api.github.com")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    /// Personal access token or app installation token.
    #[serde(default)]
    pub token: String,

    /// Organization to search. Mutually exclusive with `user`.
    #[serde(default)]
    pub org: String,

    /// User account to search. Mutually exclusive with `org`.
    #[serde(default)]
    pub user: String,

    /// Restrict search to a branch and fetch file contents at that ref.
    #[serde(default)]
    pub branch: String,

    /// REST API base URL (override for GitHub Enterprise or tests).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Optional `extension:` qualifiers appended to every query.
    #[serde(default)]
    pub file_extensions: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            org: String::new(),
            user: String::new(),
            branch: String::new(),
            api_url: default_api_url(),
            file_extensions: Vec::new(),
        }
    }
}

/// The account a search is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Organization(String),
    User(String),
}

impl Scope {
    /// The search qualifier, e.g. `org:acme`.
    #[must_use]
    pub fn qualifier(&self) -> String {
        match self {
            Self::Organization(name) => format!("org:{name}"),
            Self::User(name) => format!("user:{name}"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualifier())
    }
}

impl GithubConfig {
    /// Resolve the scope selector.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when both `org` and `user` are set, or neither.
    pub fn scope(&self) -> Result<Scope, ConfigError> {
        let org = self.org.trim();
        let user = self.user.trim();
        match (org.is_empty(), user.is_empty()) {
            (false, true) => Ok(Scope::Organization(org.to_string())),
            (true, false) => Ok(Scope::User(user.to_string())),
            (false, false) => Err(ConfigError::invalid(
                "github.org/github.user",
                "set exactly one of org or user, not both",
            )),
            (true, true) => Err(ConfigError::missing("github.org or github.user")),
        }
    }

    /// The configured branch, if any.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        let branch = self.branch.trim();
        (!branch.is_empty()).then_some(branch)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::missing("github.token"));
        }
        self.scope()?;
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::missing("github.api_url"));
        }
        Ok(())
    }
}

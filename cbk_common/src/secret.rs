use std::fmt::{self, Debug, Display};

/// A marketplace API credential: an app secret, a signing key or an access token.
///
/// Formatting never shows the value. Surrounding whitespace is dropped on construction, since credentials pasted
/// into `.env` files often pick some up, and a blank credential counts as missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new<S: AsRef<str>>(value: S) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    /// Reads a credential from the environment variable `var`. Unset and blank variables both give `None`.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().map(Self::new).filter(|s| !s.is_empty())
    }

    /// The raw credential, for signing requests. Never log it.
    pub fn reveal(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<not set>)")
        } else {
            f.write_str("Secret(****)")
        }
    }
}

impl Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

//! Credential strategies for a server connection
//!
//! A connection carries exactly one [`Credentials`] value, chosen when the
//! connection is opened. The variant decides which identity properties the
//! channel attaches to every remote call.

use std::fmt;

use zeroize::Zeroizing;

/// Header value sent when a security token is absent.
pub const NULL_TOKEN_PLACEHOLDER: &str = "<null>";

/// Opaque HELIO security token.
///
/// The token is carried verbatim in the `Helio-Security-Token` request header.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken(Option<String>);

impl SecurityToken {
    /// Wrap any displayable token object.
    pub fn new(token: impl fmt::Display) -> Self {
        Self(Some(token.to_string()))
    }

    /// A token that was never supplied.
    pub fn absent() -> Self {
        Self(None)
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// String form placed in the request header.
    ///
    /// An absent token becomes [`NULL_TOKEN_PLACEHOLDER`]; the header is still sent.
    pub fn serialize(&self) -> String {
        match &self.0 {
            Some(token) => token.clone(),
            None => NULL_TOKEN_PLACEHOLDER.to_string(),
        }
    }
}

impl From<&str> for SecurityToken {
    fn from(token: &str) -> Self {
        Self(Some(token.to_string()))
    }
}

impl From<String> for SecurityToken {
    fn from(token: String) -> Self {
        Self(Some(token))
    }
}

impl From<Option<String>> for SecurityToken {
    fn from(token: Option<String>) -> Self {
        Self(token)
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("SecurityToken(<redacted>)"),
            None => f.write_str("SecurityToken(<null>)"),
        }
    }
}

/// Authentication strategy for a connection
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Anonymous access
    #[default]
    None,

    /// HTTP username and password
    UsernamePassword {
        username: String,
        password: Zeroizing<String>,
    },

    /// HELIO security token sent as a request header
    SecurityToken(SecurityToken),
}

impl Credentials {
    /// Username/password credentials
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::UsernamePassword {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Security-token credentials
    pub fn token(token: impl Into<SecurityToken>) -> Self {
        Self::SecurityToken(token.into())
    }

    /// Strategy name for logging (never includes secret material)
    pub fn strategy(&self) -> &'static str {
        match self {
            Credentials::None => "none",
            Credentials::UsernamePassword { .. } => "username_password",
            Credentials::SecurityToken(_) => "security_token",
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Credentials::None)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::SecurityToken(token) => {
                f.debug_tuple("SecurityToken").field(token).finish()
            }
        }
    }
}

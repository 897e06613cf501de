//! Identity properties attached to a bound channel
//!
//! The property set is decided once, from the connection's address and
//! credential strategy, and every call made through the channel carries it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use url::Url;
use zeroize::Zeroizing;

use crate::domain::Credentials;

/// Request header carrying a HELIO security token
pub const SECURITY_TOKEN_HEADER: &str = "Helio-Security-Token";

/// Property keys a channel understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    /// Overrides the channel's target URL
    EndpointAddress,
    Username,
    Password,
    /// Extra HTTP request headers (name -> values)
    HttpRequestHeaders,
}

/// Property values
#[derive(Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Address(Url),
    Text(String),
    Secret(Zeroizing<String>),
    Headers(BTreeMap<String, Vec<String>>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Address(url) => f.debug_tuple("Address").field(&url.as_str()).finish(),
            PropertyValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PropertyValue::Secret(_) => f.write_str("Secret(<redacted>)"),
            PropertyValue::Headers(headers) => {
                let names: Vec<&String> = headers.keys().collect();
                f.debug_tuple("Headers").field(&names).finish()
            }
        }
    }
}

/// Properties attached to a channel at bind time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelProperties {
    entries: BTreeMap<PropertyKey, PropertyValue>,
}

impl ChannelProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property set implied by an address choice and a credential strategy.
    ///
    /// | address  | credentials        | properties                                   |
    /// |----------|--------------------|----------------------------------------------|
    /// | default  | none               | (none)                                       |
    /// | explicit | none               | `EndpointAddress`                            |
    /// | explicit | security token     | `EndpointAddress`, `HttpRequestHeaders`      |
    /// | default  | security token     | `HttpRequestHeaders`                         |
    /// | default  | username/password  | `Username`, `Password`                       |
    /// | explicit | username/password  | `EndpointAddress`, `Username`, `Password`    |
    pub fn for_strategy(address: Option<&Url>, credentials: &Credentials) -> Self {
        let mut properties = Self::new();

        if let Some(url) = address {
            properties.put(PropertyKey::EndpointAddress, PropertyValue::Address(url.clone()));
        }

        match credentials {
            Credentials::None => {}
            Credentials::UsernamePassword { username, password } => {
                properties.put(PropertyKey::Username, PropertyValue::Text(username.clone()));
                properties.put(PropertyKey::Password, PropertyValue::Secret(password.clone()));
            }
            Credentials::SecurityToken(token) => {
                let mut headers = BTreeMap::new();
                headers.insert(SECURITY_TOKEN_HEADER.to_string(), vec![token.serialize()]);
                properties.put(PropertyKey::HttpRequestHeaders, PropertyValue::Headers(headers));
            }
        }

        properties
    }

    /// Set a property, replacing any previous value for the key.
    pub fn put(&mut self, key: PropertyKey, value: PropertyValue) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.entries.get(&key)
    }

    pub fn keys(&self) -> BTreeSet<PropertyKey> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn endpoint_address(&self) -> Option<&Url> {
        match self.get(PropertyKey::EndpointAddress) {
            Some(PropertyValue::Address(url)) => Some(url),
            _ => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self.get(PropertyKey::Username) {
            Some(PropertyValue::Text(username)) => Some(username),
            _ => None,
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self.get(PropertyKey::Password) {
            Some(PropertyValue::Secret(password)) => Some(password.as_str()),
            _ => None,
        }
    }

    pub fn request_headers(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self.get(PropertyKey::HttpRequestHeaders) {
            Some(PropertyValue::Headers(headers)) => Some(headers),
            _ => None,
        }
    }

    /// Values attached for one request header
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.request_headers()
            .and_then(|headers| headers.get(name))
            .map(Vec::as_slice)
    }
}

use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;

use crate::{CoreError, CoreResult};

/// A namespaced message key such as `shop.checkout.title`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    pub fn new(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::InvalidInput("key is empty"));
        }
        for segment in value.split('.') {
            if segment.is_empty() {
                return Err(CoreError::InvalidInput("key has empty segment"));
            }
            if !segment.chars().all(is_key_char) {
                return Err(CoreError::InvalidInput("key has invalid character"));
            }
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(namespace, _)| namespace)
    }
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Key {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Key::new(value)
    }
}

impl TryFrom<String> for Key {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Key::new(value)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

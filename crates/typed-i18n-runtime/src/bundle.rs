use std::collections::BTreeMap;
use std::sync::Arc;

use typed_i18n_core::{CoreError, Key, LanguageTag, Pattern, parse};

use crate::error::{RuntimeError, RuntimeResult};
use crate::source::BundleSource;

/// One bundle entry: the raw pattern text and its parsed form.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    key: Key,
    pattern: Pattern,
}

impl Message {
    pub fn compile(key: Key, raw: &str) -> RuntimeResult<Self> {
        let pattern = parse(raw).map_err(|err| match err {
            CoreError::InvalidPattern { offset, reason } => RuntimeError::InvalidPattern {
                key: key.to_string(),
                offset,
                reason,
            },
            other => RuntimeError::from(other),
        })?;
        Ok(Self { key, pattern })
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn raw(&self) -> &str {
        self.pattern.source()
    }
}

/// Key to pattern map for a single locale. Patterns are parsed when the
/// bundle is built, so syntax errors surface at registration time.
#[derive(Clone, Debug)]
pub struct ResourceBundle {
    locale: LanguageTag,
    origin: String,
    messages: BTreeMap<Key, Arc<Message>>,
}

impl ResourceBundle {
    pub fn new(locale: LanguageTag) -> Self {
        Self {
            locale,
            origin: String::from("<memory>"),
            messages: BTreeMap::new(),
        }
    }

    pub fn from_source(locale: LanguageTag, source: &BundleSource) -> RuntimeResult<Self> {
        let entries = source.load()?;
        Self::from_entries(locale, entries, source.origin())
    }

    pub fn from_entries(
        locale: LanguageTag,
        entries: BTreeMap<String, String>,
        origin: String,
    ) -> RuntimeResult<Self> {
        let mut messages = BTreeMap::new();
        for (raw_key, raw_pattern) in entries {
            let key = Key::new(raw_key.as_str()).map_err(|err| RuntimeError::InvalidBundle {
                origin: origin.clone(),
                line: 0,
                message: format!("{raw_key}: {err}"),
            })?;
            let message = Message::compile(key.clone(), &raw_pattern)?;
            messages.insert(key, Arc::new(message));
        }
        Ok(Self {
            locale,
            origin,
            messages,
        })
    }

    pub fn insert(&mut self, key: &str, raw: &str) -> RuntimeResult<Option<Arc<Message>>> {
        let key = Key::new(key)?;
        let message = Message::compile(key.clone(), raw)?;
        Ok(self.messages.insert(key, Arc::new(message)))
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Message>> {
        self.messages.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.messages.keys()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Arc<Message>> {
        self.messages.values()
    }

    pub fn locale(&self) -> &LanguageTag {
        &self.locale
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use typed_i18n_core::LanguageTag;

    use super::ResourceBundle;
    use crate::{BundleSource, RuntimeError};

    fn en() -> LanguageTag {
        LanguageTag::parse("en").expect("tag")
    }

    #[test]
    fn compiles_every_entry() {
        let source = BundleSource::entries([("greeting", "Hello, {name}!"), ("bye", "Bye")]);
        let bundle = ResourceBundle::from_source(en(), &source).expect("bundle");
        assert_eq!(bundle.len(), 2);
        let message = bundle.get("greeting").expect("message");
        assert_eq!(message.raw(), "Hello, {name}!");
        assert_eq!(message.key().as_str(), "greeting");
        assert!(!bundle.get("bye").expect("bye").pattern().segments().is_empty());
    }

    #[test]
    fn invalid_pattern_names_the_key() {
        let source = BundleSource::entries([("broken", "oops {name")]);
        let err = ResourceBundle::from_source(en(), &source).expect_err("invalid");
        match err {
            RuntimeError::InvalidPattern { key, reason, .. } => {
                assert_eq!(key, "broken");
                assert_eq!(reason, "unclosed placeholder");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_key_is_rejected() {
        let source = BundleSource::entries([("bad key", "x")]);
        let err = ResourceBundle::from_source(en(), &source).expect_err("invalid key");
        assert!(matches!(err, RuntimeError::InvalidBundle { .. }));
    }

    #[test]
    fn insert_replaces_existing() {
        let mut bundle = ResourceBundle::new(en());
        assert!(bundle.insert("a", "one").expect("insert").is_none());
        let previous = bundle.insert("a", "two").expect("insert").expect("previous");
        assert_eq!(previous.raw(), "one");
        assert_eq!(bundle.get("a").expect("a").raw(), "two");
        assert!(bundle.contains("a"));
    }
}

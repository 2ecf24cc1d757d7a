use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::{Args, LanguageTag, RichText, Tag};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved(RichText),
    NotRecognized,
    /// Not an error: the caller keeps the tag as literal text.
    Ignored,
}

pub struct PlaceholderContext<'a> {
    pub locale: &'a LanguageTag,
    pub args: &'a Args,
}

/// An external placeholder engine plugged into rendering. Called for tags
/// that are neither style directives nor supplied arguments, and for
/// `{name}` tokens with no matching argument.
pub trait PlaceholderResolver: Send + Sync {
    fn resolve(&self, tag: &Tag, context: &PlaceholderContext<'_>) -> Resolution;
}

#[derive(Clone, Default)]
pub enum PlaceholderBridge {
    #[default]
    Absent,
    Present(Arc<dyn PlaceholderResolver>),
}

impl PlaceholderBridge {
    pub fn present(resolver: impl PlaceholderResolver + 'static) -> Self {
        PlaceholderBridge::Present(Arc::new(resolver))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PlaceholderBridge::Present(_))
    }

    pub fn resolve(&self, tag: &Tag, context: &PlaceholderContext<'_>) -> Resolution {
        match self {
            PlaceholderBridge::Absent => Resolution::Ignored,
            PlaceholderBridge::Present(resolver) => resolver.resolve(tag, context),
        }
    }
}

impl fmt::Debug for PlaceholderBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderBridge::Absent => f.write_str("PlaceholderBridge::Absent"),
            PlaceholderBridge::Present(_) => f.write_str("PlaceholderBridge::Present(..)"),
        }
    }
}

/// Fixed name to fragment table. Closing tags of known names resolve to
/// nothing.
#[derive(Clone, Debug, Default)]
pub struct StaticPlaceholders {
    values: BTreeMap<String, RichText>,
}

impl StaticPlaceholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RichText>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl PlaceholderResolver for StaticPlaceholders {
    fn resolve(&self, tag: &Tag, _context: &PlaceholderContext<'_>) -> Resolution {
        match self.values.get(&tag.name) {
            Some(_) if tag.closing => Resolution::Resolved(RichText::new()),
            Some(value) => Resolution::Resolved(value.clone()),
            None => Resolution::NotRecognized,
        }
    }
}

/// Adapts a closure; `None` means not recognized.
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn(&Tag, &PlaceholderContext<'_>) -> Option<RichText> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self(resolve)
    }
}

impl<F> PlaceholderResolver for FnResolver<F>
where
    F: Fn(&Tag, &PlaceholderContext<'_>) -> Option<RichText> + Send + Sync,
{
    fn resolve(&self, tag: &Tag, context: &PlaceholderContext<'_>) -> Resolution {
        match (self.0)(tag, context) {
            Some(value) => Resolution::Resolved(value),
            None => Resolution::NotRecognized,
        }
    }
}

#![forbid(unsafe_code)]

mod bundle;
mod cache;
mod config;
mod error;
mod loader;
mod registry;
mod source;
mod translator;

pub use crate::bundle::{Message, ResourceBundle};
pub use crate::cache::RenderCache;
pub use crate::config::{RuntimeConfig, load_config, load_config_or_default};
pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::loader::{BundleFile, discover_bundles};
pub use crate::registry::{LocaleRegistry, ResolvedMessage};
pub use crate::source::{BundleFormat, BundleSource, parse_properties};
pub use crate::translator::Translator;

pub use typed_i18n_core::{
    ArgType, Args, Color, Key, LanguageTag, NamedColor, Pattern, PlaceholderBridge,
    PlaceholderContext, PlaceholderResolver, PlainTextBuilder, Resolution, RichText,
    RichTextBuilder, Selector, Span, StaticPlaceholders, Style, Tag, TextBuilder, Value,
    parse as parse_pattern,
};

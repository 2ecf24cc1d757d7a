#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod args;
mod bridge;
mod error;
mod language_tag;
mod pattern;
mod render;
mod rich_text;
mod types;

pub use args::{ArgType, Args, Value};
pub use bridge::{
    FnResolver, PlaceholderBridge, PlaceholderContext, PlaceholderResolver, Resolution,
    StaticPlaceholders,
};
pub use error::{CoreError, CoreResult};
pub use language_tag::LanguageTag;
pub use pattern::{
    ArgFormat, ChoiceBranch, ChoiceLimit, Pattern, Segment, Selector, Tag, is_placeholder_name,
    parse,
};
pub use render::{render, render_plain};
pub use rich_text::{
    Color, Directive, NamedColor, PlainTextBuilder, RichText, RichTextBuilder, Span, Style,
    TextBuilder,
};
pub use types::Key;

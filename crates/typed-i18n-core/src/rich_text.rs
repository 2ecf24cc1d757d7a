use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::Tag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

const NAMED_COLORS: [(&str, NamedColor); 16] = [
    ("black", NamedColor::Black),
    ("dark_blue", NamedColor::DarkBlue),
    ("dark_green", NamedColor::DarkGreen),
    ("dark_aqua", NamedColor::DarkAqua),
    ("dark_red", NamedColor::DarkRed),
    ("dark_purple", NamedColor::DarkPurple),
    ("gold", NamedColor::Gold),
    ("gray", NamedColor::Gray),
    ("dark_gray", NamedColor::DarkGray),
    ("blue", NamedColor::Blue),
    ("green", NamedColor::Green),
    ("aqua", NamedColor::Aqua),
    ("red", NamedColor::Red),
    ("light_purple", NamedColor::LightPurple),
    ("yellow", NamedColor::Yellow),
    ("white", NamedColor::White),
];

impl NamedColor {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = match name {
            "grey" => "gray",
            "dark_grey" => "dark_gray",
            other => other,
        };
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, color)| *color)
    }

    pub fn name(self) -> &'static str {
        NAMED_COLORS
            .iter()
            .find(|(_, color)| *color == self)
            .map(|(name, _)| *name)
            .unwrap_or("white")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Color {
    /// Accepts a color name (`dark_red`) or a hex literal (`#ff8800`).
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return None;
            }
            let channel = |range: core::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
            return Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }
        NamedColor::from_name(&value.to_ascii_lowercase()).map(Color::Named)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(named) => f.write_str(named.name()),
            Color::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub strikethrough: bool,
    pub obfuscated: bool,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// Styled text made of spans. Adjacent spans with the same style are merged,
/// so two values with the same visible content and styling compare equal no
/// matter how they were assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn plain(text: &str) -> Self {
        Self::styled(text, Style::default())
    }

    pub fn styled(text: &str, style: Style) -> Self {
        let mut rich = Self::new();
        rich.push(text, style);
        rich
    }

    pub fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.style == style {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(Span {
            text: String::from(text),
            style,
        });
    }

    pub fn append(&mut self, other: &RichText) {
        for span in &other.spans {
            self.push(&span.text, span.style);
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn to_plain(&self) -> String {
        let mut output = String::new();
        for span in &self.spans {
            output.push_str(&span.text);
        }
        output
    }

    /// Splits on `\n`, keeping styles. Always yields at least one line.
    pub fn lines(&self) -> Vec<RichText> {
        let mut lines = Vec::new();
        let mut current = RichText::new();
        for span in &self.spans {
            let mut parts = span.text.split('\n');
            if let Some(first) = parts.next() {
                current.push(first, span.style);
            }
            for part in parts {
                lines.push(core::mem::take(&mut current));
                current.push(part, span.style);
            }
        }
        lines.push(current);
        lines
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        RichText::plain(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    Applied,
    Unknown,
}

/// Output side of rendering: the renderer feeds literal text, pre-built
/// fragments and in-pattern tags, then asks for the finished value.
pub trait TextBuilder {
    type Output;

    fn literal(&mut self, text: &str);

    fn fragment(&mut self, fragment: &RichText);

    fn directive(&mut self, tag: &Tag) -> Directive;

    fn finish(self) -> Self::Output;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decoration {
    Bold,
    Italic,
    Underlined,
    Strikethrough,
    Obfuscated,
}

impl Decoration {
    fn apply(self, style: &mut Style) {
        match self {
            Decoration::Bold => style.bold = true,
            Decoration::Italic => style.italic = true,
            Decoration::Underlined => style.underlined = true,
            Decoration::Strikethrough => style.strikethrough = true,
            Decoration::Obfuscated => style.obfuscated = true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Effect {
    Decorate(Decoration),
    Paint(Color),
    Reset,
    Newline,
}

impl Effect {
    fn frame_name(self) -> Option<&'static str> {
        match self {
            Effect::Decorate(Decoration::Bold) => Some("bold"),
            Effect::Decorate(Decoration::Italic) => Some("italic"),
            Effect::Decorate(Decoration::Underlined) => Some("underlined"),
            Effect::Decorate(Decoration::Strikethrough) => Some("strikethrough"),
            Effect::Decorate(Decoration::Obfuscated) => Some("obfuscated"),
            Effect::Paint(_) => Some("color"),
            Effect::Reset | Effect::Newline => None,
        }
    }
}

fn classify(tag: &Tag) -> Option<Effect> {
    let name = tag.name.to_ascii_lowercase();
    let effect = match name.as_str() {
        "bold" | "b" => Effect::Decorate(Decoration::Bold),
        "italic" | "i" | "em" => Effect::Decorate(Decoration::Italic),
        "underlined" | "u" => Effect::Decorate(Decoration::Underlined),
        "strikethrough" | "st" => Effect::Decorate(Decoration::Strikethrough),
        "obfuscated" | "obf" => Effect::Decorate(Decoration::Obfuscated),
        "reset" => Effect::Reset,
        "newline" | "br" => Effect::Newline,
        "color" | "colour" | "c" => match tag.args.first() {
            Some(value) => Effect::Paint(Color::parse(value)?),
            // `</color>` closes without naming one
            None if tag.closing => Effect::Paint(Color::Named(NamedColor::White)),
            None => return None,
        },
        other => Effect::Paint(Color::parse(other)?),
    };
    Some(effect)
}

/// Builds [`RichText`], interpreting style tags with a stack so that a
/// closing tag restores the style in effect before its opening tag.
#[derive(Debug, Default)]
pub struct RichTextBuilder {
    output: RichText,
    frames: Vec<(&'static str, Style)>,
}

impl RichTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Style {
        self.frames
            .last()
            .map(|(_, style)| *style)
            .unwrap_or_default()
    }
}

impl TextBuilder for RichTextBuilder {
    type Output = RichText;

    fn literal(&mut self, text: &str) {
        let style = self.current();
        self.output.push(text, style);
    }

    fn fragment(&mut self, fragment: &RichText) {
        let base = self.current();
        for span in fragment.spans() {
            let mut style = span.style;
            if style.color.is_none() {
                style.color = base.color;
            }
            style.bold |= base.bold;
            style.italic |= base.italic;
            style.underlined |= base.underlined;
            style.strikethrough |= base.strikethrough;
            style.obfuscated |= base.obfuscated;
            self.output.push(&span.text, style);
        }
    }

    fn directive(&mut self, tag: &Tag) -> Directive {
        let Some(effect) = classify(tag) else {
            return Directive::Unknown;
        };
        if tag.closing {
            if let Some(name) = effect.frame_name() {
                if let Some(idx) = self.frames.iter().rposition(|(open, _)| *open == name) {
                    self.frames.truncate(idx);
                }
            }
            return Directive::Applied;
        }
        match effect {
            Effect::Reset => self.frames.clear(),
            Effect::Newline => {
                let style = self.current();
                self.output.push("\n", style);
            }
            Effect::Decorate(decoration) => {
                let mut style = self.current();
                decoration.apply(&mut style);
                self.frames.push((effect.frame_name().unwrap_or("style"), style));
            }
            Effect::Paint(color) => {
                let mut style = self.current();
                style.color = Some(color);
                self.frames.push(("color", style));
            }
        }
        Directive::Applied
    }

    fn finish(self) -> RichText {
        self.output
    }
}

/// Builds a plain `String`, dropping styling but honouring `<newline>`.
#[derive(Debug, Default)]
pub struct PlainTextBuilder {
    output: String,
}

impl PlainTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextBuilder for PlainTextBuilder {
    type Output = String;

    fn literal(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn fragment(&mut self, fragment: &RichText) {
        for span in fragment.spans() {
            self.output.push_str(&span.text);
        }
    }

    fn directive(&mut self, tag: &Tag) -> Directive {
        match classify(tag) {
            Some(Effect::Newline) if !tag.closing => {
                self.output.push('\n');
                Directive::Applied
            }
            Some(_) => Directive::Applied,
            None => Directive::Unknown,
        }
    }

    fn finish(self) -> String {
        self.output
    }
}

//! Pattern syntax.
//!
//! * `{0}` positional argument, `{name}` named argument. A selector made only
//!   of ASCII digits is always positional; anything else is always named.
//! * `{n,number}` numeric formatting, `{n,choice,0#none|1#one|1<{n} many}`
//!   choice selection where `#` means "at least" and `<` means "more than".
//! * `<tag>`, `<tag:arg>`, `</tag>` style directives or external tags.
//! * `\` escapes the next character. A `<` that does not open a tag is text.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::{CoreError, CoreResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Text(String),
    Arg {
        selector: Selector,
        format: ArgFormat,
    },
    Tag(Tag),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selector {
    Index(usize),
    Name(String),
}

impl Selector {
    pub fn token(&self) -> String {
        match self {
            Selector::Index(idx) => idx.to_string(),
            Selector::Name(name) => name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArgFormat {
    Default,
    Number,
    Choice(Vec<ChoiceBranch>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChoiceLimit {
    pub value: f64,
    pub inclusive: bool,
}

impl ChoiceLimit {
    pub fn admits(&self, number: f64) -> bool {
        if self.inclusive {
            number >= self.value
        } else {
            number > self.value
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceBranch {
    pub limit: ChoiceLimit,
    pub body: Vec<Segment>,
}

/// Picks the last branch whose limit admits `number`, or the first branch
/// when none does.
pub(crate) fn select_branch(branches: &[ChoiceBranch], number: f64) -> Option<&ChoiceBranch> {
    branches
        .iter()
        .rev()
        .find(|branch| branch.limit.admits(number))
        .or_else(|| branches.first())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub args: Vec<String>,
    pub closing: bool,
    pub source: String,
}

impl Tag {
    pub fn open(name: &str, args: Vec<String>) -> Self {
        let mut source = String::from("<");
        source.push_str(name);
        for arg in &args {
            source.push(':');
            source.push_str(arg);
        }
        source.push('>');
        Self {
            name: name.to_string(),
            args,
            closing: false,
            source,
        }
    }

    pub fn close(name: &str) -> Self {
        let mut source = String::from("</");
        source.push_str(name);
        source.push('>');
        Self {
            name: name.to_string(),
            args: Vec::new(),
            closing: true,
            source,
        }
    }
}

impl Pattern {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every argument selector referenced, including those nested in choice
    /// branches, sorted and deduplicated.
    pub fn selectors(&self) -> Vec<Selector> {
        let mut out = Vec::new();
        collect_selectors(&self.segments, &mut out);
        out.sort();
        out.dedup();
        out
    }

    /// Every opening tag name, sorted and deduplicated.
    pub fn tag_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_tags(&self.segments, &mut out);
        out.sort();
        out.dedup();
        out
    }

    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Text(_)))
    }
}

fn collect_selectors(segments: &[Segment], out: &mut Vec<Selector>) {
    for segment in segments {
        if let Segment::Arg { selector, format } = segment {
            out.push(selector.clone());
            if let ArgFormat::Choice(branches) = format {
                for branch in branches {
                    collect_selectors(&branch.body, out);
                }
            }
        }
    }
}

fn collect_tags(segments: &[Segment], out: &mut Vec<String>) {
    for segment in segments {
        match segment {
            Segment::Tag(tag) if !tag.closing => out.push(tag.name.clone()),
            Segment::Arg {
                format: ArgFormat::Choice(branches),
                ..
            } => {
                for branch in branches {
                    collect_tags(&branch.body, out);
                }
            }
            _ => {}
        }
    }
}

pub fn parse(source: &str) -> CoreResult<Pattern> {
    let mut parser = Parser { source, pos: 0 };
    let segments = parser.parse_body(false)?;
    Ok(Pattern {
        source: source.to_string(),
        segments,
    })
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &'static str) -> CoreError {
        CoreError::InvalidPattern {
            offset: self.pos,
            reason,
        }
    }

    /// Reads segments until the end of input or, inside a choice branch,
    /// until an unescaped `|` or `}` which is left unconsumed.
    fn parse_body(&mut self, in_branch: bool) -> CoreResult<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '\\' => {
                    self.bump();
                    let escaped = self.bump().ok_or_else(|| self.error("dangling escape"))?;
                    text.push(escaped);
                }
                '{' => {
                    flush(&mut text, &mut segments);
                    self.bump();
                    segments.push(self.parse_arg()?);
                }
                '}' | '|' if in_branch => break,
                '}' => return Err(self.error("unmatched closing brace")),
                '<' => match self.try_tag() {
                    Some(tag) => {
                        flush(&mut text, &mut segments);
                        segments.push(Segment::Tag(tag));
                    }
                    None => {
                        self.bump();
                        text.push('<');
                    }
                },
                _ => {
                    self.bump();
                    text.push(ch);
                }
            }
        }

        flush(&mut text, &mut segments);
        Ok(segments)
    }

    fn parse_arg(&mut self) -> CoreResult<Segment> {
        let start = self.pos;
        let selector_text = self.take_until(&[',', '}']);
        let selector = parse_selector(selector_text.trim()).map_err(|reason| {
            CoreError::InvalidPattern {
                offset: start,
                reason,
            }
        })?;

        match self.bump() {
            Some('}') => Ok(Segment::Arg {
                selector,
                format: ArgFormat::Default,
            }),
            Some(',') => {
                let kind = self.take_until(&[',', '}']).trim();
                match kind {
                    "number" => {
                        if self.bump() != Some('}') {
                            return Err(self.error("number format takes no style"));
                        }
                        Ok(Segment::Arg {
                            selector,
                            format: ArgFormat::Number,
                        })
                    }
                    "choice" => {
                        if self.bump() != Some(',') {
                            return Err(self.error("choice format needs branches"));
                        }
                        let branches = self.parse_choice()?;
                        Ok(Segment::Arg {
                            selector,
                            format: ArgFormat::Choice(branches),
                        })
                    }
                    "" => Err(self.error("empty format type")),
                    _ => Err(self.error("unknown format type")),
                }
            }
            _ => Err(self.error("unclosed placeholder")),
        }
    }

    fn parse_choice(&mut self) -> CoreResult<Vec<ChoiceBranch>> {
        let mut branches = Vec::new();
        loop {
            self.skip_whitespace();
            let limit_start = self.pos;
            let raw_limit = self.take_until(&['#', '<', '|', '}']);
            let inclusive = match self.bump() {
                Some('#') => true,
                Some('<') => false,
                _ => return Err(self.error("choice branch needs a limit")),
            };
            let value = raw_limit
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or(CoreError::InvalidPattern {
                    offset: limit_start,
                    reason: "invalid choice limit",
                })?;
            let body = self.parse_body(true)?;
            branches.push(ChoiceBranch {
                limit: ChoiceLimit { value, inclusive },
                body,
            });
            match self.bump() {
                Some('|') => continue,
                Some('}') => return Ok(branches),
                _ => return Err(self.error("unclosed choice")),
            }
        }
    }

    fn take_until(&mut self, stops: &[char]) -> &'a str {
        let source = self.source;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if stops.contains(&ch) {
                break;
            }
            self.bump();
        }
        &source[start..self.pos]
    }

    /// Attempts to read a tag at the current `<`. Leaves the position
    /// untouched and returns `None` when the text does not form a tag.
    fn try_tag(&mut self) -> Option<Tag> {
        let start = self.pos;
        let rest = &self.source[start + 1..];
        let end = rest.find('>')?;
        let inner = &rest[..end];
        let (closing, body) = match inner.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, inner),
        };
        if body.is_empty() || body.chars().any(|ch| ch.is_whitespace() || "<{}\\".contains(ch)) {
            return None;
        }
        let mut parts = body.split(':');
        let name = parts.next()?;
        if !is_tag_name(name) {
            return None;
        }
        let args: Vec<String> = parts.map(ToString::to_string).collect();
        if closing && !args.is_empty() {
            return None;
        }
        self.pos = start + 1 + end + 1;
        Some(Tag {
            name: name.to_string(),
            args,
            closing,
            source: self.source[start..self.pos].to_string(),
        })
    }
}

fn flush(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(core::mem::take(text)));
    }
}

fn parse_selector(text: &str) -> Result<Selector, &'static str> {
    if text.is_empty() {
        return Err("empty placeholder");
    }
    if text.chars().all(|ch| ch.is_ascii_digit()) {
        return text
            .parse::<usize>()
            .map(Selector::Index)
            .map_err(|_| "positional index out of range");
    }
    if is_placeholder_name(text) {
        Ok(Selector::Name(text.to_string()))
    } else {
        Err("invalid placeholder name")
    }
}

/// Named placeholders: a letter or `_`, then letters, digits, `_`, `-`, `.`.
pub fn is_placeholder_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

fn is_tag_name(text: &str) -> bool {
    match text.strip_prefix('#') {
        Some(hex) => !hex.is_empty() && hex.chars().all(|ch| ch.is_ascii_hexdigit()),
        None => is_placeholder_name(text),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{ArgFormat, Segment, Selector, parse, select_branch};
    use crate::CoreError;

    fn text(value: &str) -> Segment {
        Segment::Text(String::from(value))
    }

    fn named(name: &str) -> Segment {
        Segment::Arg {
            selector: Selector::Name(String::from(name)),
            format: ArgFormat::Default,
        }
    }

    #[test]
    fn parses_named_placeholder() {
        let pattern = parse("Hello, {name}!").expect("parse");
        assert_eq!(
            pattern.segments(),
            &[text("Hello, "), named("name"), text("!")]
        );
        assert_eq!(pattern.source(), "Hello, {name}!");
    }

    #[test]
    fn digits_are_always_positional() {
        let pattern = parse("{0} and { 12 }").expect("parse");
        assert_eq!(
            pattern.selectors(),
            vec![Selector::Index(0), Selector::Index(12)]
        );
        let pattern = parse("{a0}").expect("parse");
        assert_eq!(
            pattern.selectors(),
            vec![Selector::Name(String::from("a0"))]
        );
    }

    #[test]
    fn escapes_produce_literals() {
        let pattern = parse(r"\{name\} \<b>").expect("parse");
        assert_eq!(pattern.segments(), &[text("{name} <b>")]);
        assert!(pattern.is_literal());
    }

    #[test]
    fn parses_tags_with_arguments() {
        let pattern = parse("<color:#ff0000>hot</color> <player>").expect("parse");
        let segments = pattern.segments();
        let Segment::Tag(open) = &segments[0] else {
            panic!("expected tag");
        };
        assert_eq!(open.name, "color");
        assert_eq!(open.args, vec![String::from("#ff0000")]);
        assert!(!open.closing);
        let Segment::Tag(close) = &segments[2] else {
            panic!("expected closing tag");
        };
        assert!(close.closing);
        assert_eq!(close.source, "</color>");
        assert_eq!(
            pattern.tag_names(),
            vec![String::from("color"), String::from("player")]
        );
    }

    #[test]
    fn stray_angle_brackets_stay_text() {
        let pattern = parse("a < b and c > d, <not a tag>").expect("parse");
        assert!(pattern.is_literal());
        assert_eq!(
            pattern.segments(),
            &[text("a < b and c > d, <not a tag>")]
        );
    }

    #[test]
    fn parses_choice_branches() {
        let pattern =
            parse("{count,choice,0#no items|1#one item|1<{count,number} items}").expect("parse");
        let Segment::Arg {
            format: ArgFormat::Choice(branches),
            ..
        } = &pattern.segments()[0]
        else {
            panic!("expected choice");
        };
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].body, vec![text("no items")]);
        assert_eq!(
            select_branch(branches, 0.0).map(|b| b.body.clone()),
            Some(vec![text("no items")])
        );
        assert_eq!(
            select_branch(branches, 1.0).map(|b| b.body.clone()),
            Some(vec![text("one item")])
        );
        let many = select_branch(branches, 5.0).expect("branch");
        assert_eq!(many.body.len(), 2);
        // below every limit falls back to the first branch
        assert_eq!(
            select_branch(branches, -3.0).map(|b| b.body.clone()),
            Some(vec![text("no items")])
        );
        assert_eq!(
            pattern.selectors(),
            vec![Selector::Name(String::from("count"))]
        );
    }

    #[test]
    fn rejects_unmatched_closing_brace() {
        let err = parse("oops }").expect_err("should fail");
        assert_eq!(
            err,
            CoreError::InvalidPattern {
                offset: 5,
                reason: "unmatched closing brace"
            }
        );
    }

    #[test]
    fn rejects_unclosed_placeholder() {
        let err = parse("Hi {name").expect_err("should fail");
        assert!(matches!(
            err,
            CoreError::InvalidPattern {
                reason: "unclosed placeholder",
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_placeholders() {
        assert!(parse("{}").is_err());
        assert!(parse("{bad name}").is_err());
        assert!(parse("{0,date}").is_err());
        assert!(parse("{n,choice,x#a}").is_err());
        assert!(parse("{n,choice,1#a").is_err());
        assert!(parse("trailing \\").is_err());
    }

    #[test]
    fn rejects_non_finite_choice_limits() {
        for source in ["{n,choice,nan#a}", "{n,choice,0#a|inf<b}", "{n,choice,-infinity#a}"] {
            let err = parse(source).expect_err(source);
            assert!(matches!(
                err,
                CoreError::InvalidPattern {
                    reason: "invalid choice limit",
                    ..
                }
            ));
        }
    }
}

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::pattern::select_branch;
use crate::{
    ArgFormat, ArgType, Args, CoreError, CoreResult, Directive, LanguageTag, Pattern,
    PlaceholderBridge, PlaceholderContext, PlainTextBuilder, Resolution, Segment, Selector, Tag,
    TextBuilder, Value,
};

/// Renders `pattern` into `builder`.
///
/// Tags go to the builder first; tags it does not know are matched against
/// argument names, then handed to the bridge. `{...}` tokens without an
/// argument are offered to the bridge and fail with
/// [`CoreError::UnresolvedPlaceholder`] unless it resolves them. Nothing is
/// returned on failure, so callers never see half-rendered text.
pub fn render<B: TextBuilder>(
    pattern: &Pattern,
    locale: &LanguageTag,
    args: &Args,
    bridge: &PlaceholderBridge,
    builder: B,
) -> CoreResult<B::Output> {
    let context = PlaceholderContext { locale, args };
    let mut builder = builder;
    emit(pattern.segments(), &context, bridge, &mut builder)?;
    Ok(builder.finish())
}

pub fn render_plain(
    pattern: &Pattern,
    locale: &LanguageTag,
    args: &Args,
    bridge: &PlaceholderBridge,
) -> CoreResult<String> {
    render(pattern, locale, args, bridge, PlainTextBuilder::new())
}

fn emit<B: TextBuilder>(
    segments: &[Segment],
    context: &PlaceholderContext<'_>,
    bridge: &PlaceholderBridge,
    builder: &mut B,
) -> CoreResult<()> {
    for segment in segments {
        match segment {
            Segment::Text(text) => builder.literal(text),
            Segment::Arg { selector, format } => {
                emit_arg(selector, format, context, bridge, builder)?
            }
            Segment::Tag(tag) => emit_tag(tag, context, bridge, builder)?,
        }
    }
    Ok(())
}

fn lookup<'a>(args: &'a Args, selector: &Selector) -> Option<(&'a str, &'a Value)> {
    match selector {
        Selector::Index(index) => args.positional(*index),
        Selector::Name(name) => args
            .iter()
            .find(|(candidate, _)| *candidate == name.as_str()),
    }
}

fn emit_arg<B: TextBuilder>(
    selector: &Selector,
    format: &ArgFormat,
    context: &PlaceholderContext<'_>,
    bridge: &PlaceholderBridge,
    builder: &mut B,
) -> CoreResult<()> {
    let Some((name, value)) = lookup(context.args, selector) else {
        let token = selector.token();
        return match bridge.resolve(&Tag::open(&token, Vec::new()), context) {
            Resolution::Resolved(fragment) => {
                builder.fragment(&fragment);
                Ok(())
            }
            Resolution::NotRecognized | Resolution::Ignored => {
                Err(CoreError::UnresolvedPlaceholder(token))
            }
        };
    };

    match format {
        ArgFormat::Default => emit_value(value, builder),
        ArgFormat::Number => {
            numeric(name, value)?;
            builder.literal(&format_number(value));
        }
        ArgFormat::Choice(branches) => {
            let number = numeric(name, value)?;
            if let Some(branch) = select_branch(branches, number) {
                emit(&branch.body, context, bridge, builder)?;
            }
        }
    }
    Ok(())
}

fn emit_tag<B: TextBuilder>(
    tag: &Tag,
    context: &PlaceholderContext<'_>,
    bridge: &PlaceholderBridge,
    builder: &mut B,
) -> CoreResult<()> {
    if builder.directive(tag) == Directive::Applied {
        return Ok(());
    }
    if let Some(value) = context.args.get(&tag.name) {
        if !tag.closing {
            emit_value(value, builder);
        }
        return Ok(());
    }
    match bridge.resolve(tag, context) {
        Resolution::Resolved(fragment) => builder.fragment(&fragment),
        Resolution::Ignored => builder.literal(&tag.source),
        Resolution::NotRecognized => {
            return Err(CoreError::UnresolvedPlaceholder(tag.name.clone()));
        }
    }
    Ok(())
}

fn emit_value<B: TextBuilder>(value: &Value, builder: &mut B) {
    match value {
        Value::Rich(fragment) => builder.fragment(fragment),
        other => builder.literal(&other.to_string()),
    }
}

fn numeric(name: &str, value: &Value) -> CoreResult<f64> {
    value
        .as_number()
        .ok_or_else(|| CoreError::ArgumentTypeMismatch {
            name: name.to_string(),
            expected: ArgType::Number,
            found: value.arg_type(),
        })
}

/// Groups the integer digits in threes: `1234567.5` becomes `1,234,567.5`.
fn format_number(value: &Value) -> String {
    let raw = value.to_string();
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    if !integer.chars().all(|ch| ch.is_ascii_digit()) {
        return raw;
    }

    let mut out = String::with_capacity(raw.len() + integer.len() / 3);
    out.push_str(sign);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

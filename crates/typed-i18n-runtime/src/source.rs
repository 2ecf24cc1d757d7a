use std::collections::BTreeMap;
use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::CharIndices;

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BundleFormat {
    Properties,
    Json,
    Toml,
}

impl BundleFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "properties" => Some(BundleFormat::Properties),
            "json" => Some(BundleFormat::Json),
            "toml" => Some(BundleFormat::Toml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            BundleFormat::Properties => "properties",
            BundleFormat::Json => "json",
            BundleFormat::Toml => "toml",
        }
    }
}

/// Where a bundle's key/pattern pairs come from. File-backed sources are kept
/// by the registry so they can be re-read on reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleSource {
    Entries(BTreeMap<String, String>),
    Properties(String),
    Json(String),
    Toml(String),
    File(PathBuf),
    /// Later layers override keys of earlier ones.
    Layered(Vec<BundleSource>),
}

impl BundleSource {
    pub fn entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        BundleSource::Entries(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        BundleSource::File(path.into())
    }

    pub fn is_file_backed(&self) -> bool {
        match self {
            BundleSource::File(_) => true,
            BundleSource::Layered(layers) => layers.iter().any(BundleSource::is_file_backed),
            _ => false,
        }
    }

    pub fn origin(&self) -> String {
        match self {
            BundleSource::Entries(_) => "<entries>".to_string(),
            BundleSource::Properties(_) => "<properties>".to_string(),
            BundleSource::Json(_) => "<json>".to_string(),
            BundleSource::Toml(_) => "<toml>".to_string(),
            BundleSource::File(path) => path.display().to_string(),
            BundleSource::Layered(layers) => layers
                .iter()
                .map(BundleSource::origin)
                .collect::<Vec<_>>()
                .join(" + "),
        }
    }

    /// Reads the raw key/pattern pairs. Duplicate keys within one source are
    /// rejected.
    pub fn load(&self) -> RuntimeResult<BTreeMap<String, String>> {
        let origin = self.origin();
        match self {
            BundleSource::Entries(entries) => Ok(entries.clone()),
            BundleSource::Properties(text) => parse_properties(text, &origin),
            BundleSource::Json(text) => parse_json(text, &origin),
            BundleSource::Toml(text) => parse_toml(text, &origin),
            BundleSource::File(path) => {
                let format = BundleFormat::from_path(path)
                    .ok_or_else(|| RuntimeError::UnsupportedFormat(path.clone()))?;
                let text = fs::read_to_string(path)?;
                match format {
                    BundleFormat::Properties => parse_properties(&text, &origin),
                    BundleFormat::Json => parse_json(&text, &origin),
                    BundleFormat::Toml => parse_toml(&text, &origin),
                }
            }
            BundleSource::Layered(layers) => {
                let mut merged = BTreeMap::new();
                for layer in layers {
                    merged.extend(layer.load()?);
                }
                Ok(merged)
            }
        }
    }
}

/// Parses `.properties` text.
///
/// `#` and `!` start comments, `=`, `:` or whitespace separate key and value,
/// a trailing `\` continues the entry on the next line. `\n`, `\t`, `\r`,
/// `\f`, `\uXXXX`, `\\`, `\=`, `\:`, `\#`, `\!` and `\ ` are decoded; any
/// other escape in a value is kept verbatim so pattern escapes such as `\{`
/// reach the pattern parser.
pub fn parse_properties(input: &str, origin: &str) -> RuntimeResult<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let mut lines = input.lines().enumerate();

    while let Some((idx, raw_line)) = lines.next() {
        let line_no = (idx + 1) as u32;
        let trimmed = raw_line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical).map_err(|message| RuntimeError::InvalidBundle {
            origin: origin.to_string(),
            line: line_no,
            message: message.to_string(),
        })?;
        if key.is_empty() {
            return Err(RuntimeError::InvalidBundle {
                origin: origin.to_string(),
                line: line_no,
                message: "missing key".to_string(),
            });
        }
        if entries.contains_key(&key) {
            return Err(RuntimeError::DuplicateKey {
                key,
                origin: origin.to_string(),
            });
        }
        entries.insert(key, value);
    }

    Ok(entries)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|ch| *ch == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> Result<(String, String), &'static str> {
    let mut key = String::new();
    let mut chars = line.char_indices().peekable();
    let mut rest_start = line.len();
    let mut separated = false;

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => read_escape(&mut chars, &mut key, false)?,
            '=' | ':' => {
                rest_start = idx + 1;
                separated = true;
                break;
            }
            ch if ch.is_whitespace() => {
                rest_start = idx + ch.len_utf8();
                break;
            }
            ch => key.push(ch),
        }
    }

    let mut rest = line[rest_start..].trim_start();
    if !separated {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start();
        }
    }

    let mut value = String::with_capacity(rest.len());
    let mut chars = rest.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if ch == '\\' {
            read_escape(&mut chars, &mut value, true)?;
        } else {
            value.push(ch);
        }
    }
    Ok((key, value))
}

fn read_escape(
    chars: &mut Peekable<CharIndices<'_>>,
    out: &mut String,
    keep_unknown: bool,
) -> Result<(), &'static str> {
    let (_, escaped) = chars.next().ok_or("dangling escape")?;
    match escaped {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        'f' => out.push('\u{c}'),
        'u' => {
            let unit = read_code_unit(chars)?;
            let ch = if (0xD800..0xDC00).contains(&unit) {
                // Characters outside the BMP are written as a surrogate pair.
                if chars.next().map(|(_, ch)| ch) != Some('\\')
                    || chars.next().map(|(_, ch)| ch) != Some('u')
                {
                    return Err("unpaired surrogate in unicode escape");
                }
                let low = read_code_unit(chars)?;
                char::decode_utf16([unit, low])
                    .next()
                    .and_then(Result::ok)
                    .ok_or("unpaired surrogate in unicode escape")?
            } else {
                char::from_u32(u32::from(unit)).ok_or("unpaired surrogate in unicode escape")?
            };
            out.push(ch);
        }
        '\\' | '=' | ':' | '#' | '!' | ' ' => out.push(escaped),
        other if keep_unknown => {
            out.push('\\');
            out.push(other);
        }
        other => out.push(other),
    }
    Ok(())
}

fn read_code_unit(chars: &mut Peekable<CharIndices<'_>>) -> Result<u16, &'static str> {
    let mut code = 0u16;
    for _ in 0..4 {
        let (_, digit) = chars.next().ok_or("truncated unicode escape")?;
        let digit = digit.to_digit(16).ok_or("invalid unicode escape")?;
        code = (code << 4) | digit as u16;
    }
    Ok(code)
}

fn parse_json(text: &str, origin: &str) -> RuntimeResult<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Object(map) = value else {
        return Err(invalid_structure(origin, "", "expected a top-level object"));
    };
    let mut entries = BTreeMap::new();
    for (name, value) in &map {
        flatten_json(name, value, origin, &mut entries)?;
    }
    Ok(entries)
}

fn flatten_json(
    key: &str,
    value: &serde_json::Value,
    origin: &str,
    entries: &mut BTreeMap<String, String>,
) -> RuntimeResult<()> {
    match value {
        serde_json::Value::String(pattern) => insert_unique(entries, key, pattern, origin),
        serde_json::Value::Object(map) => {
            for (name, nested) in map {
                flatten_json(&format!("{key}.{name}"), nested, origin, entries)?;
            }
            Ok(())
        }
        _ => Err(invalid_structure(origin, key, "expected a string or an object")),
    }
}

fn parse_toml(text: &str, origin: &str) -> RuntimeResult<BTreeMap<String, String>> {
    let table: toml::Table = toml::from_str(text)?;
    let mut entries = BTreeMap::new();
    for (name, value) in &table {
        flatten_toml(name, value, origin, &mut entries)?;
    }
    Ok(entries)
}

fn flatten_toml(
    key: &str,
    value: &toml::Value,
    origin: &str,
    entries: &mut BTreeMap<String, String>,
) -> RuntimeResult<()> {
    match value {
        toml::Value::String(pattern) => insert_unique(entries, key, pattern, origin),
        toml::Value::Table(table) => {
            for (name, nested) in table {
                flatten_toml(&format!("{key}.{name}"), nested, origin, entries)?;
            }
            Ok(())
        }
        _ => Err(invalid_structure(origin, key, "expected a string or a table")),
    }
}

fn insert_unique(
    entries: &mut BTreeMap<String, String>,
    key: &str,
    pattern: &str,
    origin: &str,
) -> RuntimeResult<()> {
    if entries.contains_key(key) {
        return Err(RuntimeError::DuplicateKey {
            key: key.to_string(),
            origin: origin.to_string(),
        });
    }
    entries.insert(key.to_string(), pattern.to_string());
    Ok(())
}

fn invalid_structure(origin: &str, key: &str, message: &str) -> RuntimeError {
    let message = if key.is_empty() {
        message.to_string()
    } else {
        format!("{key}: {message}")
    };
    RuntimeError::InvalidBundle {
        origin: origin.to_string(),
        line: 0,
        message,
    }
}

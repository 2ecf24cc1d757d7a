use std::collections::BTreeMap;
use std::fmt::Write;

use tracing::warn;
use typed_i18n_core::LanguageTag;

use crate::model::InterfaceModel;

/// A `.properties` resource bundle produced from inline messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutput {
    /// `<bundle>.properties` or `<bundle>_<locale>.properties`.
    pub file_name: String,
    /// Normalized locale, `None` for the root bundle.
    pub locale: Option<String>,
    pub contents: String,
}

/// Groups the inline messages of every method by bundle and locale.
///
/// Bundles come out sorted by file name and entries sorted by key, so the
/// output only depends on the declarations.
pub fn emit_bundles(interfaces: &[InterfaceModel]) -> Vec<BundleOutput> {
    let mut grouped: BTreeMap<(&str, Option<LanguageTag>), BTreeMap<&str, &str>> =
        BTreeMap::new();
    for interface in interfaces {
        for method in &interface.methods {
            for (locale, pattern) in &method.messages {
                let tag = if locale.is_empty() {
                    None
                } else {
                    match LanguageTag::parse(locale) {
                        Ok(tag) => Some(tag),
                        Err(err) => {
                            warn!(locale = %locale, error = %err, "skipping message with invalid locale");
                            continue;
                        }
                    }
                };
                grouped
                    .entry((interface.bundle.as_str(), tag))
                    .or_default()
                    .insert(method.key.as_str(), pattern.as_str());
            }
        }
    }

    let mut outputs: Vec<BundleOutput> = grouped
        .into_iter()
        .map(|((bundle, tag), entries)| {
            let file_name = match &tag {
                None => format!("{bundle}.properties"),
                Some(tag) => format!("{bundle}_{}.properties", tag.file_suffix()),
            };
            let mut contents = String::from("# @generated by typed-i18n-codegen. Do not edit.\n");
            for (key, pattern) in entries {
                let _ = writeln!(contents, "{key}={}", escape_properties_value(pattern));
            }
            BundleOutput {
                file_name,
                locale: tag.map(|tag| tag.normalized().to_string()),
                contents,
            }
        })
        .collect();
    outputs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    outputs
}

/// Escapes a pattern so a `.properties` reader yields it back unchanged.
pub fn escape_properties_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (idx, ch) in value.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            ' ' if idx == 0 => out.push_str("\\ "),
            ch => out.push(ch),
        }
    }
    out
}

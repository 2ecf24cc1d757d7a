use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::{CoreError, CoreResult};

/// A BCP-47 style locale identifier. Both `-` and `_` separate subtags, so
/// `pt_BR` and `pt-br` parse to the same tag. Equality, ordering and hashing
/// use the normalized form.
#[derive(Clone, Debug)]
pub struct LanguageTag {
    original: String,
    normalized: String,
    subtags: Vec<String>,
}

impl LanguageTag {
    pub fn parse(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput("language tag is empty"));
        }

        let parts: Vec<&str> = trimmed.split(['-', '_']).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(CoreError::InvalidInput("language tag has empty subtag"));
        }

        let mut subtags = Vec::with_capacity(parts.len());
        let mut script_seen = false;
        let mut region_seen = false;
        let mut in_extension = false;

        for (idx, part) in parts.iter().enumerate() {
            if !part.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                return Err(CoreError::InvalidInput("language tag has invalid character"));
            }
            if idx == 0 {
                if !is_alpha(part) || !(2..=8).contains(&part.len()) {
                    return Err(CoreError::InvalidInput("invalid language subtag"));
                }
                subtags.push(part.to_ascii_lowercase());
                continue;
            }
            if part.len() == 1 {
                in_extension = true;
                subtags.push(part.to_ascii_lowercase());
                continue;
            }

            let normalized = if in_extension {
                part.to_ascii_lowercase()
            } else if !script_seen && !region_seen && part.len() == 4 && is_alpha(part) {
                script_seen = true;
                titlecase(part)
            } else if !region_seen && is_region(part) {
                region_seen = true;
                part.to_ascii_uppercase()
            } else {
                part.to_ascii_lowercase()
            };
            subtags.push(normalized);
        }

        Ok(Self {
            original: trimmed.to_string(),
            normalized: subtags.join("-"),
            subtags,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn language(&self) -> &str {
        self.subtags.first().map(String::as_str).unwrap_or_default()
    }

    pub fn subtags(&self) -> &[String] {
        &self.subtags
    }

    /// The tag with its last subtag removed: `zh-Hant-TW` gives `zh-Hant`,
    /// `en` gives `None`.
    pub fn truncated(&self) -> Option<LanguageTag> {
        if self.subtags.len() < 2 {
            return None;
        }
        let mut subtags = self.subtags.clone();
        subtags.pop();
        if subtags.last().is_some_and(|last| last.len() == 1) {
            subtags.pop();
        }
        let normalized = subtags.join("-");
        Some(Self {
            original: normalized.clone(),
            normalized,
            subtags,
        })
    }

    /// Underscore form used in bundle file names, `pt_BR`.
    pub fn file_suffix(&self) -> String {
        self.subtags.join("_")
    }
}

impl PartialEq for LanguageTag {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for LanguageTag {}

impl Hash for LanguageTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for LanguageTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl core::str::FromStr for LanguageTag {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LanguageTag::parse(value)
    }
}

fn is_alpha(value: &str) -> bool {
    value.chars().all(|ch| ch.is_ascii_alphabetic())
}

fn is_region(value: &str) -> bool {
    (value.len() == 2 && is_alpha(value))
        || (value.len() == 3 && value.chars().all(|ch| ch.is_ascii_digit()))
}

fn titlecase(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for (idx, ch) in value.chars().enumerate() {
        if idx == 0 {
            output.push(ch.to_ascii_uppercase());
        } else {
            output.push(ch.to_ascii_lowercase());
        }
    }
    output
}

use std::path::PathBuf;

use thiserror::Error;
use typed_i18n_core::{ArgType, CoreError, LanguageTag};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Core(CoreError),
    #[error("fallback {locale} -> {parent} would create a cycle")]
    CyclicFallback {
        locale: LanguageTag,
        parent: LanguageTag,
    },
    #[error("no default locale registered")]
    NoDefaultLocale,
    #[error("locale {0} is not registered")]
    UnknownLocale(LanguageTag),
    #[error("locale {0} is the default locale")]
    DefaultLocaleInUse(LanguageTag),
    #[error("missing translation for {key} (tried {})", join_locales(.tried))]
    MissingTranslation {
        key: String,
        tried: Vec<LanguageTag>,
    },
    #[error("unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),
    #[error("argument type mismatch for {name}: expected {expected}, found {found}")]
    ArgumentTypeMismatch {
        name: String,
        expected: ArgType,
        found: ArgType,
    },
    #[error("invalid pattern for {key} at byte {offset}: {reason}")]
    InvalidPattern {
        key: String,
        offset: usize,
        reason: &'static str,
    },
    #[error("{origin}:{line}: {message}")]
    InvalidBundle {
        origin: String,
        line: u32,
        message: String,
    },
    #[error("duplicate key {key} in {origin}")]
    DuplicateKey { key: String, origin: String },
    #[error("unsupported bundle format: {0}")]
    UnsupportedFormat(PathBuf),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<CoreError> for RuntimeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnresolvedPlaceholder(token) => RuntimeError::UnresolvedPlaceholder(token),
            CoreError::ArgumentTypeMismatch {
                name,
                expected,
                found,
            } => RuntimeError::ArgumentTypeMismatch {
                name,
                expected,
                found,
            },
            other => RuntimeError::Core(other),
        }
    }
}

fn join_locales(tried: &[LanguageTag]) -> String {
    tried
        .iter()
        .map(LanguageTag::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use typed_i18n_core::{ArgType, CoreError, LanguageTag};

    use super::RuntimeError;

    #[test]
    fn missing_translation_lists_tried_locales() {
        let err = RuntimeError::MissingTranslation {
            key: "farewell".to_string(),
            tried: vec![
                LanguageTag::parse("fr-FR").expect("tag"),
                LanguageTag::parse("en").expect("tag"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "missing translation for farewell (tried fr-FR, en)"
        );
    }

    #[test]
    fn core_errors_map_to_render_variants() {
        let err = RuntimeError::from(CoreError::UnresolvedPlaceholder("x".to_string()));
        assert!(matches!(err, RuntimeError::UnresolvedPlaceholder(token) if token == "x"));

        let err = RuntimeError::from(CoreError::ArgumentTypeMismatch {
            name: "n".to_string(),
            expected: ArgType::Int,
            found: ArgType::Bool,
        });
        assert!(matches!(err, RuntimeError::ArgumentTypeMismatch { .. }));

        let err = RuntimeError::from(CoreError::InvalidInput("key is empty"));
        assert_eq!(err.to_string(), "invalid input: key is empty");
    }
}

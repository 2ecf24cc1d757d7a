use std::fmt;

use thiserror::Error;

/// Where a declaration lives: source file, interface and optionally method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: Option<String>,
    pub interface: String,
    pub method: Option<String>,
}

impl Location {
    pub fn interface(file: Option<&str>, interface: &str) -> Self {
        Self {
            file: file.map(str::to_string),
            interface: interface.to_string(),
            method: None,
        }
    }

    pub fn method(&self, method: &str) -> Self {
        Self {
            method: Some(method.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}: ")?;
        }
        f.write_str(&self.interface)?;
        if let Some(method) = &self.method {
            write!(f, "::{method}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("{at}: missing message key")]
    MissingKey { at: Location },
    #[error("{at}: duplicate message key {key}, first declared at {first}")]
    DuplicateMessageKey {
        key: String,
        at: Location,
        first: Location,
    },
    #[error("{at}: parameter {param} at position {position} has unsupported type {ty}")]
    UnsupportedArgumentType {
        at: Location,
        param: String,
        position: usize,
        ty: String,
    },
    #[error("{at}: unsupported return type {ty}")]
    UnsupportedReturnType { at: Location, ty: String },
    #[error("{at}: {message}")]
    Malformed { at: Location, message: String },
    #[error("{at}: invalid message for locale {locale:?}: {reason}")]
    InvalidMessage {
        at: Location,
        locale: String,
        reason: String,
    },
}

impl DeclarationError {
    pub fn code(&self) -> &'static str {
        match self {
            DeclarationError::MissingKey { .. } => "TI001",
            DeclarationError::DuplicateMessageKey { .. } => "TI002",
            DeclarationError::UnsupportedArgumentType { .. } => "TI003",
            DeclarationError::UnsupportedReturnType { .. } => "TI004",
            DeclarationError::Malformed { .. } => "TI005",
            DeclarationError::InvalidMessage { .. } => "TI006",
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            DeclarationError::MissingKey { at }
            | DeclarationError::DuplicateMessageKey { at, .. }
            | DeclarationError::UnsupportedArgumentType { at, .. }
            | DeclarationError::UnsupportedReturnType { at, .. }
            | DeclarationError::Malformed { at, .. }
            | DeclarationError::InvalidMessage { at, .. } => at,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}", list_errors(.0))]
    Invalid(Vec<DeclarationError>),
}

impl GenerateError {
    /// Declaration errors, empty for I/O and parse failures.
    pub fn declaration_errors(&self) -> &[DeclarationError] {
        match self {
            GenerateError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn list_errors(errors: &[DeclarationError]) -> String {
    let mut out = format!("{} invalid declaration(s)", errors.len());
    for err in errors {
        out.push_str("\n  ");
        out.push_str(&err.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{DeclarationError, GenerateError, Location};

    #[test]
    fn location_names_file_interface_and_method() {
        let at = Location::interface(Some("shop.i18n.toml"), "ShopMessages").method("greeting");
        assert_eq!(at.to_string(), "shop.i18n.toml: ShopMessages::greeting");
        let bare = Location::interface(None, "ShopMessages");
        assert_eq!(bare.to_string(), "ShopMessages");
    }

    #[test]
    fn invalid_lists_every_error() {
        let at = Location::interface(None, "A").method("m");
        let err = GenerateError::Invalid(vec![
            DeclarationError::MissingKey { at: at.clone() },
            DeclarationError::UnsupportedReturnType {
                at,
                ty: "u8".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "2 invalid declaration(s)\n  A::m: missing message key\n  A::m: unsupported return type u8"
        );
        assert_eq!(err.declaration_errors().len(), 2);
        assert_eq!(err.declaration_errors()[0].code(), "TI001");
    }
}

use std::fmt;

use crate::error::{DeclarationError, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnostic {
    pub location: Option<Location>,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: None,
            severity,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

impl From<&DeclarationError> for Diagnostic {
    fn from(err: &DeclarationError) -> Self {
        Diagnostic::new(Severity::Error, err.code(), err.to_string()).at(err.location().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, Severity};
    use crate::{DeclarationError, Location};

    #[test]
    fn formats_warning_with_location() {
        let diagnostic = Diagnostic::warning("TI101", "placeholder {who} is not bound")
            .at(Location::interface(None, "Chat").method("hello"));
        assert_eq!(
            diagnostic.to_string(),
            "warning[TI101]: placeholder {who} is not bound (Chat::hello)"
        );
    }

    #[test]
    fn converts_declaration_errors() {
        let err = DeclarationError::MissingKey {
            at: Location::interface(None, "Chat").method("hello"),
        };
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.code, "TI001");
        assert_eq!(diagnostic.location, Some(err.location().clone()));
    }
}

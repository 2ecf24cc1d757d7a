use alloc::string::String;
use core::fmt;

use crate::ArgType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidInput(&'static str),
    InvalidPattern {
        offset: usize,
        reason: &'static str,
    },
    UnresolvedPlaceholder(String),
    ArgumentTypeMismatch {
        name: String,
        expected: ArgType,
        found: ArgType,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidInput(message) => write!(f, "invalid input: {message}"),
            CoreError::InvalidPattern { offset, reason } => {
                write!(f, "invalid pattern at byte {offset}: {reason}")
            }
            CoreError::UnresolvedPlaceholder(token) => {
                write!(f, "unresolved placeholder: {token}")
            }
            CoreError::ArgumentTypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "argument type mismatch for {name}: expected {expected}, found {found}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::ArgType;
    use alloc::string::{String, ToString};

    #[test]
    fn display_formats_invalid_input() {
        let err = CoreError::InvalidInput("arg");
        assert_eq!(err.to_string(), "invalid input: arg");
    }

    #[test]
    fn display_formats_pattern_offset() {
        let err = CoreError::InvalidPattern {
            offset: 7,
            reason: "unclosed placeholder",
        };
        assert_eq!(
            err.to_string(),
            "invalid pattern at byte 7: unclosed placeholder"
        );
    }

    #[test]
    fn display_formats_mismatch() {
        let err = CoreError::ArgumentTypeMismatch {
            name: String::from("count"),
            expected: ArgType::Int,
            found: ArgType::Str,
        };
        assert_eq!(
            err.to_string(),
            "argument type mismatch for count: expected int, found str"
        );
    }
}

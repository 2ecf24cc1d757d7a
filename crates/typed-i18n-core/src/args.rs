use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Write;

use crate::{CoreError, CoreResult, RichText};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgType {
    Str,
    Int,
    Float,
    /// Either `Int` or `Float`.
    Number,
    Bool,
    Char,
    Rich,
    Any,
}

impl ArgType {
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (ArgType::Any, _) => true,
            (ArgType::Number, Value::Int(_) | Value::Float(_)) => true,
            (expected, value) => expected == value.arg_type(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgType::Str => "str",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Number => "number",
            ArgType::Bool => "bool",
            ArgType::Char => "char",
            ArgType::Rich => "rich",
            ArgType::Any => "any",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Rich(RichText),
}

impl Value {
    pub fn arg_type(&self) -> ArgType {
        match self {
            Value::Str(_) => ArgType::Str,
            Value::Int(_) => ArgType::Int,
            Value::Float(_) => ArgType::Float,
            Value::Bool(_) => ArgType::Bool,
            Value::Char(_) => ArgType::Char,
            Value::Rich(_) => ArgType::Rich,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(value) => f.write_str(value),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Char(value) => write!(f, "{value}"),
            Value::Rich(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

macro_rules! int_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Int(i64::from(value))
            }
        })*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                match i64::try_from(value) {
                    Ok(value) => Value::Int(value),
                    Err(_) => Value::Float(value as f64),
                }
            }
        })*
    };
}

wide_from!(u64, usize, isize);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<RichText> for Value {
    fn from(value: RichText) -> Self {
        Value::Rich(value)
    }
}

impl From<&RichText> for Value {
    fn from(value: &RichText) -> Self {
        Value::Rich(value.clone())
    }
}

/// Named arguments in binding order. Position `n` of `{n}` is the n-th
/// binding, so a generated accessor's parameters are addressable both ways.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Replaces an existing binding in place, keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Appends a positional-only value, named by its index.
    pub fn push(&mut self, value: impl Into<Value>) {
        let name = self.entries.len().to_string();
        self.insert(name, value.into());
    }

    /// Inserts `value` after checking it against the declared type.
    pub fn bind(&mut self, name: &str, expected: ArgType, value: Value) -> CoreResult<()> {
        if !expected.matches(&value) {
            return Err(CoreError::ArgumentTypeMismatch {
                name: name.to_string(),
                expected,
                found: value.arg_type(),
            });
        }
        self.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn positional(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries
            .get(index)
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable textual fingerprint of names, types and values, suitable as a
    /// cache key component.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            let _ = write!(out, "{}:{}={:?};", name, value.arg_type(), value);
        }
        out
    }
}

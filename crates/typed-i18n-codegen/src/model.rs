use std::collections::BTreeMap;

use serde::Deserialize;
use typed_i18n_core::{ArgType, Key};

use crate::error::Location;

/// One `*.i18n.toml` declaration file.
///
/// ```toml
/// [[interface]]
/// name = "ShopMessages"
/// bundle = "shop"
///
/// [[interface.method]]
/// name = "greeting"
/// key = "shop.greeting"
/// args = [{ name = "playerName", type = "&str" }]
///
/// [interface.method.messages]
/// en = "Hello, {player_name}!"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationFile {
    #[serde(default, rename = "interface")]
    pub interfaces: Vec<InterfaceDecl>,
}

impl DeclarationFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub args: Vec<ArgDecl>,
    /// Locale to inline pattern, `""` for the root bundle.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Named-argument binding; defaults to the snake_case parameter name.
    #[serde(default)]
    pub bind: Option<String>,
}

/// An interface together with the file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedInterface {
    pub origin: Option<String>,
    pub interface: InterfaceDecl,
}

impl SourcedInterface {
    pub fn new(origin: Option<&str>, interface: InterfaceDecl) -> Self {
        Self {
            origin: origin.map(str::to_string),
            interface,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamType {
    /// Rust type as written in generated signatures.
    pub rust: String,
    pub kind: ArgType,
}

impl ParamType {
    pub fn from_declared(ty: &str) -> Option<Self> {
        let normalized: String = ty.split_whitespace().collect::<Vec<_>>().join(" ");
        let compact = normalized.replace("& ", "&");
        let (rust, kind) = match compact.as_str() {
            "&str" | "str" | "&'static str" => ("&str", ArgType::Str),
            "String" => ("String", ArgType::Str),
            "&String" => ("&String", ArgType::Str),
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => (compact.as_str(), ArgType::Int),
            // Values past i64::MAX arrive as floats.
            "u64" | "usize" | "isize" => (compact.as_str(), ArgType::Number),
            "f32" | "f64" => (compact.as_str(), ArgType::Float),
            "bool" => ("bool", ArgType::Bool),
            "char" => ("char", ArgType::Char),
            "RichText" => ("RichText", ArgType::Rich),
            "&RichText" => ("&RichText", ArgType::Rich),
            _ => return None,
        };
        Some(Self {
            rust: rust.to_string(),
            kind,
        })
    }

    /// `ArgType` variant name used in generated code.
    pub fn kind_path(&self) -> &'static str {
        match self.kind {
            ArgType::Str => "ArgType::Str",
            ArgType::Int => "ArgType::Int",
            ArgType::Float => "ArgType::Float",
            ArgType::Number => "ArgType::Number",
            ArgType::Bool => "ArgType::Bool",
            ArgType::Char => "ArgType::Char",
            ArgType::Rich => "ArgType::Rich",
            ArgType::Any => "ArgType::Any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Single,
    Lines,
    Plain,
}

impl ReturnKind {
    pub fn from_declared(ty: Option<&str>) -> Option<Self> {
        let Some(ty) = ty else {
            return Some(ReturnKind::Single);
        };
        let compact: String = ty.chars().filter(|ch| !ch.is_whitespace()).collect();
        match compact.as_str() {
            "RichText" => Some(ReturnKind::Single),
            "Vec<RichText>" | "Lines" => Some(ReturnKind::Lines),
            "String" => Some(ReturnKind::Plain),
            _ => None,
        }
    }

    pub fn rust_type(self) -> &'static str {
        match self {
            ReturnKind::Single => "RichText",
            ReturnKind::Lines => "Vec<RichText>",
            ReturnKind::Plain => "String",
        }
    }

    pub fn render_method(self) -> &'static str {
        match self {
            ReturnKind::Single => "render",
            ReturnKind::Lines => "render_lines",
            ReturnKind::Plain => "render_plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub ident: String,
    pub binding: String,
    pub ty: ParamType,
}

/// A validated accessor method. Exists only during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDeclaration {
    pub location: Location,
    pub key: Key,
    pub method: String,
    pub params: Vec<ParamBinding>,
    pub returns: ReturnKind,
    /// Normalized locale (`""` for root) to pattern.
    pub messages: BTreeMap<String, String>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceModel {
    pub name: String,
    pub bundle: String,
    pub doc: Option<String>,
    pub origin: Option<String>,
    /// Sorted by key.
    pub methods: Vec<MessageDeclaration>,
}

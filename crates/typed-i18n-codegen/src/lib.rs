#![forbid(unsafe_code)]

mod bundles;
mod diagnostic;
mod emit;
mod error;
mod model;
mod naming;
mod pipeline;
mod resolver;

pub use crate::bundles::{BundleOutput, emit_bundles, escape_properties_value};
pub use crate::diagnostic::{Diagnostic, Severity};
pub use crate::emit::{GENERATED_HEADER, emit_source};
pub use crate::error::{DeclarationError, GenerateError, Location};
pub use crate::model::{
    ArgDecl, DeclarationFile, InterfaceDecl, InterfaceModel, MessageDeclaration, MethodDecl,
    ParamBinding, ParamType, ReturnKind, SourcedInterface,
};
pub use crate::naming::to_snake_case;
pub use crate::pipeline::{GeneratedOutput, Generator, collect_declaration_files, generate};
pub use crate::resolver::{Resolution, resolve_interfaces};

use std::fmt::Write;

use crate::model::{InterfaceModel, MessageDeclaration};

pub const GENERATED_HEADER: &str = "// @generated by typed-i18n-codegen. Do not edit.";

/// Names the generated source imports from `typed_i18n_runtime`.
pub(crate) const RUNTIME_IMPORTS: [&str; 7] = [
    "ArgType",
    "Args",
    "LanguageTag",
    "RichText",
    "RuntimeResult",
    "Translator",
    "Value",
];

/// Every name the generated source brings into scope with `use`.
pub(crate) fn imported_names() -> impl Iterator<Item = &'static str> {
    core::iter::once("Arc").chain(RUNTIME_IMPORTS)
}

/// Renders the accessor source for `interfaces`.
///
/// Each interface becomes a trait plus an `<Name>Impl` struct that renders
/// through a shared `Translator`. Output is byte-identical for identical
/// models; interfaces are emitted by name and methods by key.
pub fn emit_source(interfaces: &[InterfaceModel]) -> String {
    let mut sorted: Vec<&InterfaceModel> = interfaces.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("\n\n");
    out.push_str("#[allow(unused_imports)]\nuse std::sync::Arc;\n");
    let _ = writeln!(
        out,
        "#[allow(unused_imports)]\nuse typed_i18n_runtime::{{{}}};",
        RUNTIME_IMPORTS.join(", ")
    );

    for interface in sorted {
        out.push('\n');
        emit_trait(&mut out, interface);
        out.push('\n');
        emit_impl(&mut out, interface);
    }
    out
}

fn emit_trait(out: &mut String, interface: &InterfaceModel) {
    emit_doc(out, "", interface.doc.as_deref());
    let _ = writeln!(out, "pub trait {} {{", interface.name);
    for method in &interface.methods {
        emit_doc(out, "    ", method.doc.as_deref());
        let _ = writeln!(out, "    /// Message `{}`.", method.key);
        let _ = writeln!(out, "    {};", signature(method));
    }
    out.push_str("}\n");
}

fn emit_impl(out: &mut String, interface: &InterfaceModel) {
    let name = &interface.name;
    let _ = writeln!(
        out,
        "/// Renders [`{name}`] messages from bundle `{}`.",
        interface.bundle
    );
    let _ = writeln!(out, "#[derive(Clone)]");
    let _ = writeln!(out, "pub struct {name}Impl {{");
    out.push_str("    translator: Arc<Translator>,\n}\n\n");

    let _ = writeln!(out, "impl {name}Impl {{");
    let _ = writeln!(out, "    pub const BUNDLE: &'static str = {:?};", interface.bundle);
    out.push_str("    pub const KEYS: &'static [&'static str] = &[");
    for (idx, method) in interface.methods.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{:?}", method.key.as_str());
    }
    out.push_str("];\n\n");
    out.push_str("    pub fn new(translator: Arc<Translator>) -> Self {\n");
    out.push_str("        Self { translator }\n    }\n\n");
    out.push_str("    pub fn translator(&self) -> &Translator {\n");
    out.push_str("        &self.translator\n    }\n}\n\n");

    let _ = writeln!(out, "impl {name} for {name}Impl {{");
    for (idx, method) in interface.methods.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        emit_method_body(out, method);
    }
    out.push_str("}\n");
}

fn emit_method_body(out: &mut String, method: &MessageDeclaration) {
    let _ = writeln!(out, "    {} {{", signature(method));
    if method.params.is_empty() {
        out.push_str("        let args = Args::new();\n");
    } else {
        let _ = writeln!(
            out,
            "        let mut args = Args::with_capacity({});",
            method.params.len()
        );
        for param in &method.params {
            let _ = writeln!(
                out,
                "        args.bind({:?}, {}, Value::from({}))?;",
                param.binding,
                param.ty.kind_path(),
                param.ident
            );
        }
    }
    let _ = writeln!(
        out,
        "        self.translator.{}({:?}, locale, &args)",
        method.returns.render_method(),
        method.key.as_str()
    );
    out.push_str("    }\n");
}

fn signature(method: &MessageDeclaration) -> String {
    let mut sig = format!("fn {}(&self, locale: &LanguageTag", method.method);
    for param in &method.params {
        let _ = write!(sig, ", {}: {}", param.ident, param.ty.rust);
    }
    let _ = write!(sig, ") -> RuntimeResult<{}>", method.returns.rust_type());
    sig
}

fn emit_doc(out: &mut String, indent: &str, doc: Option<&str>) {
    let Some(doc) = doc else {
        return;
    };
    for line in doc.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let _ = writeln!(out, "{indent}///");
        } else {
            let _ = writeln!(out, "{indent}/// {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GENERATED_HEADER, emit_source};
    use crate::model::{DeclarationFile, SourcedInterface};
    use crate::resolver::resolve_interfaces;

    fn models(text: &str) -> Vec<crate::InterfaceModel> {
        let interfaces: Vec<SourcedInterface> = DeclarationFile::parse(text)
            .expect("parse")
            .interfaces
            .into_iter()
            .map(|interface| SourcedInterface::new(None, interface))
            .collect();
        resolve_interfaces(&interfaces).expect("resolve").interfaces
    }

    #[test]
    fn emits_trait_and_impl() {
        let source = emit_source(&models(
            r#"
[[interface]]
name = "Chat"
doc = "Chat lines."
[[interface.method]]
name = "welcome"
key = "chat.welcome"
args = [{ name = "playerName", type = "&str" }]
"#,
        ));
        assert!(source.starts_with(GENERATED_HEADER));
        assert!(source.contains("/// Chat lines.\npub trait Chat {\n"));
        assert!(source.contains(
            "    fn welcome(&self, locale: &LanguageTag, player_name: &str) -> RuntimeResult<RichText>;"
        ));
        assert!(source.contains("pub const KEYS: &'static [&'static str] = &[\"chat.welcome\"];"));
        assert!(source.contains(
            "        args.bind(\"player_name\", ArgType::Str, Value::from(player_name))?;\n        self.translator.render(\"chat.welcome\", locale, &args)\n"
        ));
    }

    #[test]
    fn methods_follow_key_order() {
        let source = emit_source(&models(
            r#"
[[interface]]
name = "Menu"
[[interface.method]]
name = "zeta"
key = "menu.a"
returns = "String"
[[interface.method]]
name = "alpha"
key = "menu.b"
returns = "Vec<RichText>"
"#,
        ));
        let zeta = source.find("fn zeta").expect("zeta");
        let alpha = source.find("fn alpha").expect("alpha");
        assert!(zeta < alpha);
        assert!(source.contains("let args = Args::new();"));
        assert!(source.contains("self.translator.render_plain(\"menu.a\", locale, &args)"));
        assert!(source.contains("self.translator.render_lines(\"menu.b\", locale, &args)"));
    }

    #[test]
    fn interfaces_are_sorted_by_name() {
        let mut models = models(
            "[[interface]]\nname = \"Zed\"\n[[interface]]\nname = \"Abe\"\n",
        );
        let forward = emit_source(&models);
        models.reverse();
        assert_eq!(forward, emit_source(&models));
        assert!(forward.find("pub trait Abe").expect("abe") < forward.find("pub trait Zed").expect("zed"));
    }
}

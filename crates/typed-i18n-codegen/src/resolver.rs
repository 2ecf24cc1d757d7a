use std::collections::{BTreeMap, BTreeSet};

use typed_i18n_core::{Key, LanguageTag, Selector, is_placeholder_name, parse};

use crate::diagnostic::Diagnostic;
use crate::emit::imported_names;
use crate::error::{DeclarationError, GenerateError, Location};
use crate::model::{
    InterfaceDecl, InterfaceModel, MessageDeclaration, MethodDecl, ParamBinding, ParamType,
    ReturnKind, SourcedInterface,
};
use crate::naming::{is_bundle_name, is_rust_ident, is_type_name, to_snake_case};

const RESERVED_PARAMS: [&str; 3] = ["locale", "args", "self"];

/// Validated interfaces, sorted by name, plus non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub interfaces: Vec<InterfaceModel>,
    pub warnings: Vec<Diagnostic>,
}

/// Validates every declaration and resolves keys, argument bindings and
/// types.
///
/// The whole batch fails if any declaration is invalid: every error found is
/// returned together, sorted, and no model is produced. The result does not
/// depend on the order of `interfaces`.
pub fn resolve_interfaces(interfaces: &[SourcedInterface]) -> Result<Resolution, GenerateError> {
    let mut sorted: Vec<&SourcedInterface> = interfaces.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.interface.name, &a.origin).cmp(&(&b.interface.name, &b.origin))
    });

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut models = Vec::new();
    let mut interface_names: BTreeMap<&str, Location> = BTreeMap::new();

    for sourced in sorted {
        let at = Location::interface(sourced.origin.as_deref(), &sourced.interface.name);
        if let Some(first) = interface_names.get(sourced.interface.name.as_str()) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("interface is already declared at {first}"),
            });
            continue;
        }
        interface_names.insert(&sourced.interface.name, at.clone());
        if imported_names().any(|name| name == sourced.interface.name) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: "interface name collides with a name imported by generated code"
                    .to_string(),
            });
            continue;
        }
        if let Some(model) = resolve_interface(&sourced.interface, at, &mut errors, &mut warnings) {
            models.push(model);
        }
    }

    for name in interface_names.keys() {
        if let Some(generated) = interface_names.get(format!("{name}Impl").as_str()) {
            errors.push(DeclarationError::Malformed {
                at: generated.clone(),
                message: format!("interface name collides with the generated {name}Impl"),
            });
        }
    }
    check_unique_keys(&models, &mut errors);

    if !errors.is_empty() {
        errors.sort_by_key(|err| err.to_string());
        errors.dedup();
        return Err(GenerateError::Invalid(errors));
    }

    warnings.sort();
    Ok(Resolution {
        interfaces: models,
        warnings,
    })
}

fn resolve_interface(
    interface: &InterfaceDecl,
    at: Location,
    errors: &mut Vec<DeclarationError>,
    warnings: &mut Vec<Diagnostic>,
) -> Option<InterfaceModel> {
    let before = errors.len();
    if !is_type_name(&interface.name) {
        errors.push(DeclarationError::Malformed {
            at: at.clone(),
            message: "interface name must be an UpperCamelCase identifier".to_string(),
        });
    }
    let bundle = interface
        .bundle
        .clone()
        .unwrap_or_else(|| to_snake_case(&interface.name));
    if !is_bundle_name(&bundle) {
        errors.push(DeclarationError::Malformed {
            at: at.clone(),
            message: format!("invalid bundle name {bundle:?}"),
        });
    }

    let mut method_names = BTreeSet::new();
    let mut methods = Vec::new();
    for method in &interface.methods {
        let method_at = at.method(&method.name);
        if !method_names.insert(method.name.as_str()) {
            errors.push(DeclarationError::Malformed {
                at: method_at,
                message: "method is declared twice".to_string(),
            });
            continue;
        }
        if let Some(declaration) = resolve_method(method, method_at, errors, warnings) {
            methods.push(declaration);
        }
    }

    if errors.len() > before {
        return None;
    }
    methods.sort_by(|a, b| a.key.cmp(&b.key));
    Some(InterfaceModel {
        name: interface.name.clone(),
        bundle,
        doc: interface.doc.clone(),
        origin: at.file,
        methods,
    })
}

fn resolve_method(
    method: &MethodDecl,
    at: Location,
    errors: &mut Vec<DeclarationError>,
    warnings: &mut Vec<Diagnostic>,
) -> Option<MessageDeclaration> {
    let before = errors.len();

    if !is_rust_ident(&method.name) {
        errors.push(DeclarationError::Malformed {
            at: at.clone(),
            message: format!("method name {:?} is not a valid identifier", method.name),
        });
    }

    let key = match method.key.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(DeclarationError::MissingKey { at: at.clone() });
            None
        }
        Some(raw) => match Key::new(raw) {
            Ok(key) => Some(key),
            Err(err) => {
                errors.push(DeclarationError::Malformed {
                    at: at.clone(),
                    message: format!("message key {raw:?}: {err}"),
                });
                None
            }
        },
    };

    let returns = ReturnKind::from_declared(method.returns.as_deref());
    if returns.is_none() {
        errors.push(DeclarationError::UnsupportedReturnType {
            at: at.clone(),
            ty: method.returns.clone().unwrap_or_default(),
        });
    }

    let params = resolve_params(method, &at, errors);
    let messages = resolve_messages(method, &at, errors);

    if errors.len() > before {
        return None;
    }
    let (Some(key), Some(returns)) = (key, returns) else {
        return None;
    };

    let declaration = MessageDeclaration {
        location: at,
        key,
        method: method.name.clone(),
        params,
        returns,
        messages,
        doc: method.doc.clone(),
    };
    warn_unbound_placeholders(&declaration, warnings);
    Some(declaration)
}

fn resolve_params(
    method: &MethodDecl,
    at: &Location,
    errors: &mut Vec<DeclarationError>,
) -> Vec<ParamBinding> {
    let mut idents = BTreeSet::new();
    let mut bindings = BTreeSet::new();
    let mut params = Vec::with_capacity(method.args.len());

    for (position, arg) in method.args.iter().enumerate() {
        let ident = to_snake_case(&arg.name);
        if !is_rust_ident(&ident) || RESERVED_PARAMS.contains(&ident.as_str()) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("parameter name {:?} is not allowed", arg.name),
            });
            continue;
        }
        if !idents.insert(ident.clone()) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("parameter {ident} is declared twice"),
            });
            continue;
        }

        let binding = match &arg.bind {
            Some(bind) => bind.trim().to_string(),
            None => ident.clone(),
        };
        if !is_placeholder_name(&binding) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("argument binding {binding:?} is not a valid placeholder name"),
            });
            continue;
        }
        if !bindings.insert(binding.clone()) {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("argument binding {binding} is used twice"),
            });
            continue;
        }

        let Some(ty) = ParamType::from_declared(&arg.ty) else {
            errors.push(DeclarationError::UnsupportedArgumentType {
                at: at.clone(),
                param: arg.name.clone(),
                position,
                ty: arg.ty.clone(),
            });
            continue;
        };
        params.push(ParamBinding {
            ident,
            binding,
            ty,
        });
    }
    params
}

fn resolve_messages(
    method: &MethodDecl,
    at: &Location,
    errors: &mut Vec<DeclarationError>,
) -> BTreeMap<String, String> {
    let mut messages = BTreeMap::new();
    for (locale, pattern) in &method.messages {
        let normalized = if locale.trim().is_empty() {
            String::new()
        } else {
            match LanguageTag::parse(locale) {
                Ok(tag) => tag.normalized().to_string(),
                Err(err) => {
                    errors.push(DeclarationError::Malformed {
                        at: at.clone(),
                        message: format!("message locale {locale:?}: {err}"),
                    });
                    continue;
                }
            }
        };
        if let Err(err) = parse(pattern) {
            errors.push(DeclarationError::InvalidMessage {
                at: at.clone(),
                locale: locale.clone(),
                reason: err.to_string(),
            });
            continue;
        }
        if messages.insert(normalized.clone(), pattern.clone()).is_some() {
            errors.push(DeclarationError::Malformed {
                at: at.clone(),
                message: format!("locale {normalized:?} has more than one message"),
            });
        }
    }
    messages
}

fn warn_unbound_placeholders(declaration: &MessageDeclaration, warnings: &mut Vec<Diagnostic>) {
    for (locale, raw) in &declaration.messages {
        let Ok(pattern) = parse(raw) else {
            continue;
        };
        for selector in pattern.selectors() {
            let warning = match &selector {
                Selector::Name(name)
                    if !declaration.params.iter().any(|param| &param.binding == name) =>
                {
                    Diagnostic::warning(
                        "TI101",
                        format!(
                            "placeholder {{{name}}} in locale {locale:?} has no argument and must come from a placeholder bridge"
                        ),
                    )
                }
                Selector::Index(index) if *index >= declaration.params.len() => {
                    Diagnostic::warning(
                        "TI102",
                        format!(
                            "placeholder {{{index}}} in locale {locale:?} is past the last of {} argument(s)",
                            declaration.params.len()
                        ),
                    )
                }
                _ => continue,
            };
            warnings.push(warning.at(declaration.location.clone()));
        }
    }
}

fn check_unique_keys(models: &[InterfaceModel], errors: &mut Vec<DeclarationError>) {
    let mut owners: BTreeMap<&Key, Vec<&Location>> = BTreeMap::new();
    for model in models {
        for method in &model.methods {
            owners.entry(&method.key).or_default().push(&method.location);
        }
    }
    for (key, mut locations) in owners {
        if locations.len() < 2 {
            continue;
        }
        locations.sort();
        let first = locations[0];
        for at in &locations[1..] {
            errors.push(DeclarationError::DuplicateMessageKey {
                key: key.to_string(),
                at: (*at).clone(),
                first: first.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_interfaces;
    use crate::model::{DeclarationFile, SourcedInterface};
    use crate::{DeclarationError, GenerateError, ReturnKind};

    fn sourced(origin: &str, text: &str) -> Vec<SourcedInterface> {
        DeclarationFile::parse(text)
            .expect("parse")
            .interfaces
            .into_iter()
            .map(|interface| SourcedInterface::new(Some(origin), interface))
            .collect()
    }

    fn errors(result: Result<super::Resolution, GenerateError>) -> Vec<DeclarationError> {
        match result {
            Err(GenerateError::Invalid(errors)) => errors,
            other => panic!("expected declaration errors, got {other:?}"),
        }
    }

    #[test]
    fn resolves_bindings_and_types() {
        let interfaces = sourced(
            "chat.i18n.toml",
            r#"
[[interface]]
name = "Chat"

[[interface.method]]
name = "welcome"
key = "chat.welcome"
returns = "Vec<RichText>"
args = [{ name = "playerName", type = "&str" }, { name = "count", type = "i32", bind = "n" }]
messages = { en = "Hi {player_name}<newline>{n} unread" }
"#,
        );
        let resolution = resolve_interfaces(&interfaces).expect("resolve");
        assert!(resolution.warnings.is_empty());
        let model = &resolution.interfaces[0];
        assert_eq!(model.bundle, "chat");
        let method = &model.methods[0];
        assert_eq!(method.returns, ReturnKind::Lines);
        assert_eq!(method.params[0].ident, "player_name");
        assert_eq!(method.params[0].binding, "player_name");
        assert_eq!(method.params[1].binding, "n");
        assert_eq!(method.params[1].ty.rust, "i32");
    }

    #[test]
    fn missing_key_fails() {
        let interfaces = sourced(
            "a.i18n.toml",
            "[[interface]]\nname = \"A\"\n[[interface.method]]\nname = \"m\"\n",
        );
        let errors = errors(resolve_interfaces(&interfaces));
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], DeclarationError::MissingKey { at } if at.method.as_deref() == Some("m")));
    }

    #[test]
    fn duplicate_keys_across_files_fail() {
        let mut interfaces = sourced(
            "b.i18n.toml",
            "[[interface]]\nname = \"B\"\n[[interface.method]]\nname = \"x\"\nkey = \"same.key\"\n",
        );
        interfaces.extend(sourced(
            "a.i18n.toml",
            "[[interface]]\nname = \"A\"\n[[interface.method]]\nname = \"y\"\nkey = \"same.key\"\n",
        ));
        let errors = errors(resolve_interfaces(&interfaces));
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DeclarationError::DuplicateMessageKey { key, at, first } => {
                assert_eq!(key, "same.key");
                assert_eq!(first.interface, "A");
                assert_eq!(at.interface, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsupported_types_name_the_position() {
        let interfaces = sourced(
            "a.i18n.toml",
            r#"
[[interface]]
name = "A"
[[interface.method]]
name = "m"
key = "a.m"
returns = "Option<RichText>"
args = [{ name = "ok", type = "u8" }, { name = "items", type = "Vec<String>" }]
"#,
        );
        let errors = errors(resolve_interfaces(&interfaces));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|err| matches!(
            err,
            DeclarationError::UnsupportedArgumentType { position: 1, ty, .. } if ty == "Vec<String>"
        )));
        assert!(errors.iter().any(|err| matches!(
            err,
            DeclarationError::UnsupportedReturnType { ty, .. } if ty == "Option<RichText>"
        )));
    }

    #[test]
    fn whole_batch_fails_and_reports_every_error() {
        let mut interfaces = sourced(
            "good.i18n.toml",
            "[[interface]]\nname = \"Good\"\n[[interface.method]]\nname = \"fine\"\nkey = \"good.fine\"\n",
        );
        interfaces.extend(sourced(
            "bad.i18n.toml",
            r#"
[[interface]]
name = "Bad"
[[interface.method]]
name = "one"
[[interface.method]]
name = "two"
key = "bad.two"
args = [{ name = "locale", type = "&str" }]
[[interface.method]]
name = "three"
key = "bad.three"
messages = { en = "broken {" }
"#,
        ));
        let errors = errors(resolve_interfaces(&interfaces));
        assert_eq!(errors.len(), 3);
        let codes: Vec<&str> = errors.iter().map(DeclarationError::code).collect();
        assert!(codes.contains(&"TI001"));
        assert!(codes.contains(&"TI005"));
        assert!(codes.contains(&"TI006"));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        let interfaces = sourced(
            "a.i18n.toml",
            r#"
[[interface]]
name = "lowercase"
[[interface.method]]
name = "fn"
key = "a..b"
[[interface.method]]
name = "dup"
key = "a.c"
args = [{ name = "x", type = "&str", bind = "v" }, { name = "y", type = "&str", bind = "v" }]
[[interface.method]]
name = "dup"
key = "a.d"
"#,
        );
        let errors = errors(resolve_interfaces(&interfaces));
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert!(messages.iter().any(|m| m.contains("UpperCamelCase")));
        assert!(messages.iter().any(|m| m.contains("not a valid identifier")));
        assert!(messages.iter().any(|m| m.contains("key has empty segment")));
        assert!(messages.iter().any(|m| m.contains("binding v is used twice")));
        assert!(messages.iter().any(|m| m.contains("declared twice")));
    }

    #[test]
    fn impl_name_collision_is_rejected() {
        let interfaces = sourced(
            "menu.i18n.toml",
            r#"
[[interface]]
name = "MenuImpl"
[[interface.method]]
name = "open"
key = "menu.impl.open"

[[interface]]
name = "Menu"
[[interface.method]]
name = "open"
key = "menu.open"
"#,
        );
        let errors = errors(resolve_interfaces(&interfaces));
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DeclarationError::Malformed { at, message } => {
                assert_eq!(at.interface, "MenuImpl");
                assert!(message.contains("generated MenuImpl"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn imported_names_are_rejected() {
        let interfaces = sourced(
            "a.i18n.toml",
            r#"
[[interface]]
name = "Translator"
[[interface.method]]
name = "hello"
key = "a.hello"

[[interface]]
name = "Arc"
[[interface.method]]
name = "bye"
key = "a.bye"
"#,
        );
        let errors = errors(resolve_interfaces(&interfaces));
        let names: Vec<&str> = errors
            .iter()
            .map(|err| match err {
                DeclarationError::Malformed { at, message } => {
                    assert!(message.contains("imported by generated code"));
                    at.interface.as_str()
                }
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(names, ["Arc", "Translator"]);
    }

    #[test]
    fn unbound_placeholders_warn() {
        let interfaces = sourced(
            "a.i18n.toml",
            r#"
[[interface]]
name = "A"
[[interface.method]]
name = "m"
key = "a.m"
args = [{ name = "who", type = "&str" }]
messages = { en = "{who} on {server} #{1}" }
"#,
        );
        let resolution = resolve_interfaces(&interfaces).expect("resolve");
        let codes: Vec<&str> = resolution
            .warnings
            .iter()
            .map(|warning| warning.code.as_str())
            .collect();
        assert_eq!(codes, vec!["TI101", "TI102"]);
    }

    #[test]
    fn normalizes_message_locales() {
        let interfaces = sourced(
            "a.i18n.toml",
            r#"
[[interface]]
name = "A"
[[interface.method]]
name = "m"
key = "a.m"
messages = { "pt_br" = "Olá", "" = "Hello", "pt-BR" = "Oi" }
"#,
        );
        let errors = errors(resolve_interfaces(&interfaces));
        assert!(errors[0].to_string().contains("more than one message"));
    }
}

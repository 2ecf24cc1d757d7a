const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// `playerName` becomes `player_name`. Only a lowercase letter followed by
/// an uppercase one introduces an underscore, so `HTTPServer` becomes
/// `httpserver`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && previous.is_some_and(|prev| prev.is_ascii_lowercase()) {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
        previous = Some(ch);
    }
    out
}

pub(crate) fn is_rust_ident(name: &str) -> bool {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    };
    valid && name != "_" && !KEYWORDS.contains(&name)
}

pub(crate) fn is_type_name(name: &str) -> bool {
    is_rust_ident(name) && name.starts_with(|ch: char| ch.is_ascii_uppercase())
}

pub(crate) fn is_bundle_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::{is_bundle_name, is_rust_ident, is_type_name, to_snake_case};

    #[test]
    fn converts_camel_case() {
        assert_eq!(to_snake_case("playerName"), "player_name");
        assert_eq!(to_snake_case("itemCountTotal"), "item_count_total");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("ShopMessages"), "shop_messages");
        assert_eq!(to_snake_case("HTTPServer"), "httpserver");
    }

    #[test]
    fn validates_identifiers() {
        assert!(is_rust_ident("greeting"));
        assert!(is_rust_ident("_private2"));
        assert!(!is_rust_ident("2fast"));
        assert!(!is_rust_ident("fn"));
        assert!(!is_rust_ident("gen"));
        assert!(!is_rust_ident("_"));
        assert!(!is_rust_ident("with-dash"));
        assert!(is_type_name("ShopMessages"));
        assert!(!is_type_name("shopMessages"));
    }

    #[test]
    fn validates_bundle_names() {
        assert!(is_bundle_name("shop"));
        assert!(is_bundle_name("shop.texts"));
        assert!(!is_bundle_name("../shop"));
        assert!(!is_bundle_name(""));
        assert!(!is_bundle_name("a/b"));
    }
}

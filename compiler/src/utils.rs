use bric::Bric;

/// Renders `text` as a quoted JSON string for diagnostics.
pub fn quote(text: &str) -> String {
    Bric::Str(text.to_string()).encode()
}

/// Rust's reserved words; sanitized identifiers that collide get a trailing
/// underscore.
pub const RUST_KEYWORDS: [&str; 38] = [
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// Converts a string to PascalCase, splitting on `_`, `-`, and spaces.
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let rest = chars.as_str();
                    if rest.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) {
                        first.to_uppercase().to_string() + &rest.to_lowercase()
                    } else {
                        first.to_uppercase().to_string() + rest
                    }
                }
            }
        })
        .collect()
}

/// Converts a string to snake_case without splitting acronyms apart
/// ("sessionID" becomes "session_id").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c == '-' || c == ' ' {
            snake.push('_');
        } else if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if (!prev.is_uppercase() && prev != '_' && prev != '-' && prev != ' ')
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase())
                {
                    if !snake.ends_with('_') {
                        snake.push('_');
                    }
                }
            }
            for lower in c.to_lowercase() {
                snake.push(lower);
            }
        } else {
            snake.push(c);
        }
    }
    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("a\"b"), r#""a\"b""#);
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("some_name"), "SomeName");
        assert_eq!(to_pascal_case("kebab-name"), "KebabName");
        assert_eq!(to_pascal_case("SIGNAL"), "Signal");
        assert_eq!(to_pascal_case("alreadyCamel"), "AlreadyCamel");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("sessionID"), "session_id");
        assert_eq!(to_snake_case("SomeName"), "some_name");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("additionalProperties"), "additional_properties");
    }
}

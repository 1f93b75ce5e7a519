//! Parser for template definition strings
//!
//! A definition such as `{@root}/{shot}_v{version}.exr` splits into literal
//! text and placeholders. `{name}` references a token, `{@name}` a template in
//! the current group and `{@group.name}` a template in another group.

pub mod lexer;

use logos::Logos;

use lexer::{lex, DefinitionToken, EnvToken};

pub use lexer::Placeholder;

/// Sigil introducing a template reference
pub const TEMPLATE_SYMBOL: char = '@';

/// One piece of a definition string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Placeholder(Placeholder),
}

/// Split a definition string into literals and placeholders
///
/// Adjacent literal text (including unmatched braces) is merged.
pub fn split(definition: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (token, span) in lex(definition) {
        match token {
            DefinitionToken::Placeholder(placeholder) => pieces.push(Piece::Placeholder(placeholder)),
            DefinitionToken::Text(_) | DefinitionToken::BraceOpen | DefinitionToken::Unmatched => {
                let text = &definition[span];
                match pieces.last_mut() {
                    Some(Piece::Literal(literal)) => literal.push_str(text),
                    _ => pieces.push(Piece::Literal(text.to_string())),
                }
            }
        }
    }
    pieces
}

/// Expand `$NAME` and `${NAME}` from the environment; unset variables are left as written
pub fn expand_env(definition: &str) -> String {
    let mut lexer = EnvToken::lexer(definition);
    let mut out = String::with_capacity(definition.len());
    while let Some(token) = lexer.next() {
        match token {
            Ok(EnvToken::Var(name)) => match std::env::var(&name) {
                Ok(value) => out.push_str(&value),
                Err(_) => out.push_str(lexer.slice()),
            },
            _ => out.push_str(lexer.slice()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_definition() {
        assert_eq!(
            split("{@root}_{str}.ext"),
            vec![
                Piece::Placeholder(Placeholder {
                    symbol: Some('@'),
                    name: "root".to_string(),
                }),
                Piece::Literal("_".to_string()),
                Piece::Placeholder(Placeholder {
                    symbol: None,
                    name: "str".to_string(),
                }),
                Piece::Literal(".ext".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_merges_unmatched_braces() {
        assert_eq!(
            split("a{ b}{int}"),
            vec![
                Piece::Literal("a{ b}".to_string()),
                Piece::Placeholder(Placeholder {
                    symbol: None,
                    name: "int".to_string(),
                }),
            ]
        );
        assert_eq!(
            split("a{b c}{int}"),
            vec![
                Piece::Literal("a{b c}".to_string()),
                Piece::Placeholder(Placeholder {
                    symbol: None,
                    name: "int".to_string(),
                }),
            ]
        );
        assert_eq!(split(""), vec![]);
    }

    #[test]
    fn test_expand_env() {
        std::env::set_var("TEMPLATE_RESOLVER_TEST_ROOT", "/mnt/shows");
        assert_eq!(
            expand_env("$TEMPLATE_RESOLVER_TEST_ROOT/{show}"),
            "/mnt/shows/{show}"
        );
        assert_eq!(
            expand_env("${TEMPLATE_RESOLVER_TEST_ROOT}x"),
            "/mnt/showsx"
        );
        assert_eq!(
            expand_env("$TEMPLATE_RESOLVER_TEST_UNSET/a$"),
            "$TEMPLATE_RESOLVER_TEST_UNSET/a$"
        );
    }
}

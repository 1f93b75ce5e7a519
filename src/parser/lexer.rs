//! Lexers for template definition strings using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A `{name}` or `{<symbol>name}` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Leading sigil, eg `@` for template references
    pub symbol: Option<char>,
    pub name: String,
}

fn placeholder(lex: &mut logos::Lexer<DefinitionToken>) -> Placeholder {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    match inner.chars().next() {
        Some(c) if !(c.is_ascii_alphanumeric() || c == '_') => Placeholder {
            symbol: Some(c),
            name: inner[c.len_utf8()..].to_string(),
        },
        _ => Placeholder {
            symbol: None,
            name: inner.to_string(),
        },
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum DefinitionToken {
    #[regex(r"\{[^A-Za-z0-9_{} \t\r\n]?[A-Za-z0-9_.]+\}", placeholder)]
    Placeholder(Placeholder),

    #[regex(r"[^{]+", |lex| lex.slice().to_string())]
    Text(String),

    // Unmatched brace, kept as literal text
    #[token("{")]
    BraceOpen,

    /// Text the lexer rejected, eg a brace opening something that is not a
    /// placeholder; its span may cover more than the brace
    Unmatched,
}

/// Environment variable references, `$NAME` or `${NAME}`
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum EnvToken {
    #[regex(r"\$[A-Za-z0-9_]+", |lex| lex.slice()[1..].to_string())]
    #[regex(r"\$\{[A-Za-z0-9_]+\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Var(String),

    #[regex(r"[^$]+")]
    Text,

    #[token("$")]
    Dollar,
}

/// Lex a definition string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (DefinitionToken, Span)> + '_ {
    DefinitionToken::lexer(input)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(DefinitionToken::Unmatched), span))
}

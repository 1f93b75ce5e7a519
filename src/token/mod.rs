//! Tokens: named, typed placeholders
//!
//! A token owns an unanchored pattern matching exactly one textual value, a
//! render rule turning values back into text, an optional default and a
//! description used in diagnostics. Formatting is checked against parsing so
//! that `token.parse(&token.format(&v)?)? == v` always holds.

mod config;
pub mod kind;
pub mod render;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{FormatError, ParseError, ResolverError};
use crate::value::TokenValue;

pub use config::{regex_padding, validate_padding, Case, TokenConfig};
pub use kind::{CustomKind, IntKind, KindRegistry, StrKind, TokenKind};
pub use render::{Align, RenderRule, RenderType};

/// Shared handle to a token
pub type TokenRef = Arc<Token>;

/// Whether a name can be used as a capture group name
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A named, typed placeholder
#[derive(Debug, Clone)]
pub struct Token {
    name: String,
    kind: Arc<dyn TokenKind>,
    pattern: String,
    matcher: Regex,
    render: RenderRule,
    description: String,
    default: Option<TokenValue>,
}

impl Token {
    /// Create a token from an explicit pattern and render rule
    pub fn new(
        name: impl Into<String>,
        kind: Arc<dyn TokenKind>,
        pattern: impl Into<String>,
        render: RenderRule,
    ) -> Result<Self, ResolverError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ResolverError::InvalidName(name));
        }
        let pattern = pattern.into();
        let matcher = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| ResolverError::invalid_regex(&name, e))?;

        Ok(Self {
            name,
            kind,
            pattern,
            matcher,
            render,
            description: String::new(),
            default: None,
        })
    }

    /// Create a token by deriving pattern, render rule and description from configuration
    pub fn from_config(
        name: impl Into<String>,
        kind: Arc<dyn TokenKind>,
        config: &TokenConfig,
    ) -> Result<Self, ResolverError> {
        let name = name.into();
        let pattern = kind.regex_from_config(&name, config)?;
        let render = kind.render_rule_from_config(config)?;
        let description = kind.description_from_config(config);

        let token = Self::new(name, kind, pattern, render)?.with_description(description);
        Ok(match &config.default {
            Some(default) => token.with_default(default.clone()),
            None => token,
        })
    }

    /// Integer token with the default configuration (`[0-9]+`, rendered with `d`)
    pub fn int(name: impl Into<String>) -> Result<Self, ResolverError> {
        Self::from_config(name, Arc::new(IntKind), &TokenConfig::new("int"))
    }

    /// String token with the default configuration (`[a-zA-Z]+`, rendered with `s`)
    pub fn string(name: impl Into<String>) -> Result<Self, ResolverError> {
        Self::from_config(name, Arc::new(StrKind), &TokenConfig::new("str"))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: impl Into<TokenValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag of the token's kind
    pub fn kind(&self) -> &str {
        self.kind.tag()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> Option<&TokenValue> {
        self.default.as_ref()
    }

    pub fn render_rule(&self) -> &RenderRule {
        &self.render
    }

    /// Format spec text of the render rule, eg `0=3d`
    pub fn format_spec(&self) -> &str {
        self.render.spec()
    }

    /// Unanchored pattern, for composition into templates
    pub fn regex(&self) -> &str {
        &self.pattern
    }

    /// Render a value, checking that the result parses back to the same value
    pub fn format(&self, value: &TokenValue) -> Result<String, FormatError> {
        let string = self
            .render
            .render(value)
            .map_err(|reason| FormatError::InvalidValue {
                token: self.name.clone(),
                value: value.clone(),
                reason,
            })?;

        match self.parse(&string) {
            Ok(parsed) if &parsed == value => Ok(string),
            _ => Err(FormatError::RoundTrip {
                token: self.name.clone(),
                string,
            }),
        }
    }

    /// Parse a string that must match the token's pattern exactly
    pub fn parse(&self, string: &str) -> Result<TokenValue, ParseError> {
        if !self.matcher.is_match(string) {
            return Err(ParseError::TokenMismatch {
                token: self.name.clone(),
                string: string.to_string(),
            });
        }
        self.value_from_text(string)
    }

    /// Convert already-matched text into the token's value domain
    pub fn value_from_text(&self, text: &str) -> Result<TokenValue, ParseError> {
        self.kind.value_from_text(&self.name, text)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind.tag() == other.kind.tag()
            && self.pattern == other.pattern
            && self.render == other.render
            && self.description == other.description
            && self.default == other.default
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str, regex: &str) -> Token {
        Token::from_config(
            name,
            Arc::new(CustomKind),
            &TokenConfig::new("custom").with_regex(regex),
        )
        .unwrap()
    }

    #[test]
    fn test_default_int_token() {
        let token = Token::int("int").unwrap();
        assert_eq!(token.regex(), "[0-9]+");
        assert_eq!(token.format_spec(), "d");
        assert_eq!(token.description(), "Must be an integer");
        assert_eq!(token.kind(), "int");
    }

    #[test]
    fn test_padded_int_token() {
        let config = TokenConfig::new("int").with_padmin(3);
        let token = Token::from_config("int_pad", Arc::new(IntKind), &config).unwrap();
        assert_eq!(token.regex(), "[0-9]{3,}");
        assert_eq!(token.format_spec(), "0=3d");
        assert_eq!(token.format(&5.into()).unwrap(), "005");
        assert_eq!(token.format(&1234.into()).unwrap(), "1234");
        assert_eq!(token.parse("012").unwrap(), TokenValue::Int(12));
    }

    #[test]
    fn test_invalid_padding_range() {
        let config = TokenConfig::new("int").with_padmin(3).with_padmax(1);
        let err = Token::from_config("int", Arc::new(IntKind), &config).unwrap_err();
        assert_eq!(err.to_string(), "Padmax (1) cannot be lower than padmin (3)");
    }

    #[test]
    fn test_int_format_rejects_strings() {
        let token = Token::int("name").unwrap();
        assert_eq!(token.format(&123.into()).unwrap(), "123");
        assert!(matches!(
            token.format(&"123".into()),
            Err(FormatError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_string_format() {
        let token = Token::string("name").unwrap();
        assert_eq!(token.format(&"abc".into()).unwrap(), "abc");
        assert!(matches!(
            token.format(&"123".into()),
            Err(FormatError::RoundTrip { .. })
        ));
        assert!(matches!(
            token.format(&123.into()),
            Err(FormatError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_explicit_render_rule() {
        let token = Token::new(
            "name",
            Arc::new(StrKind),
            "[a-zA-Z]+",
            RenderRule::parse("x>6").unwrap(),
        )
        .unwrap();
        // The fill matches the pattern, so padded text parses to a different value
        assert!(matches!(
            token.format(&"abcd".into()),
            Err(FormatError::RoundTrip { ref string, .. }) if string == "xxabcd"
        ));
        assert_eq!(token.format(&"abcdefg".into()).unwrap(), "abcdefg");

        let token = Token::new(
            "name",
            Arc::new(IntKind),
            "[0-9]+",
            RenderRule::parse("03").unwrap(),
        )
        .unwrap();
        assert_eq!(token.format(&12.into()).unwrap(), "012");
        assert_eq!(token.format_spec(), "03");
    }

    #[test]
    fn test_padding_that_breaks_round_trip_is_rejected() {
        // Non-strict string padding emits fill characters the parser keeps
        let config = TokenConfig::new("str").with_padmin(4).with_padstrict(false);
        let token = Token::from_config("s", Arc::new(StrKind), &config).unwrap();
        assert_eq!(token.format_spec(), "X>4s");
        assert!(matches!(
            token.format(&"ab".into()),
            Err(FormatError::RoundTrip { .. })
        ));
        assert_eq!(token.format(&"abcd".into()).unwrap(), "abcd");
    }

    #[test]
    fn test_parse() {
        let token = Token::int("name").unwrap();
        assert_eq!(token.parse("123").unwrap(), TokenValue::Int(123));
        assert!(matches!(
            token.parse("12a"),
            Err(ParseError::TokenMismatch { .. })
        ));

        let token = Token::string("name").unwrap();
        assert_eq!(token.parse("abc").unwrap(), TokenValue::from("abc"));
        assert!(token.parse("ab2").is_err());
    }

    #[test]
    fn test_value_from_text_is_defensive() {
        let token = Token::int("name").unwrap();
        assert_eq!(
            token.value_from_text("abc"),
            Err(ParseError::InvalidInteger {
                token: "name".to_string(),
                string: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_choices_token() {
        let config = TokenConfig::new("str").with_choices(["main", "alt.v2"]);
        let token = Token::from_config("variant", Arc::new(StrKind), &config).unwrap();
        assert_eq!(token.regex(), r"(?:main|alt\.v2)");
        assert_eq!(token.parse("alt.v2").unwrap(), TokenValue::from("alt.v2"));
        assert!(token.parse("altxv2").is_err());
        assert!(token.parse("mainalt.v2").is_err());
        assert_eq!(
            token.description(),
            r#"Must be one of: ["main", "alt.v2"]"#
        );
    }

    #[test]
    fn test_custom_token() {
        let token = custom("lowerCase", "[a-z][a-zA-Z]+");
        assert_eq!(token.format(&"abcDef".into()).unwrap(), "abcDef");
        assert!(token.format(&"AbcDef".into()).is_err());
    }

    #[test]
    fn test_invalid_names_and_patterns() {
        assert!(matches!(
            Token::int("has-dash"),
            Err(ResolverError::InvalidName(_))
        ));
        assert!(matches!(
            Token::new("name", Arc::new(CustomKind), "[a-", RenderRule::default()),
            Err(ResolverError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("lowerCase"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}

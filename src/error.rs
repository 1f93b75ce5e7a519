//! Error types for construction, formatting and parsing

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::{Segment, Template};
use crate::value::{Fields, TokenValue};

/// Errors raised while constructing tokens and templates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("Token '{name}' already exists")]
    TokenExists { name: String },

    #[error("Template '{group}.{name}' already exists")]
    TemplateExists { group: String, name: String },

    #[error("Unknown token type: {0}")]
    UnknownTokenType(String),

    #[error("Unknown token symbol: {0}")]
    UnknownSymbol(String),

    #[error("Requested token name does not exist: {0}")]
    MissingToken(String),

    #[error("Requested template name does not exist: {name}")]
    MissingTemplate { group: String, name: String },

    /// A template references itself, directly or through other templates
    #[error("circular template reference detected: {chain}")]
    CircularReference { chain: String },

    #[error("{field} cannot be less than 0: {value}")]
    NegativePadding { field: &'static str, value: i64 },

    #[error("Padmax ({padmax}) cannot be lower than padmin ({padmin})")]
    InvalidPadding { padmin: i64, padmax: i64 },

    #[error("Cannot use construction keywords with explicit regex")]
    ConflictingOptions,

    #[error("Unknown case: {0}")]
    UnknownCase(String),

    #[error("Token type '{kind}' does not support case constraints")]
    CaseNotSupported { kind: String },

    #[error("Token '{name}' of type '{kind}' requires an explicit regex")]
    MissingRegex { name: String, kind: String },

    #[error("Invalid name '{0}': must start with a letter or underscore and contain only alphanumerics")]
    InvalidName(String),

    #[error("Invalid regex for '{name}': {message}")]
    InvalidRegex { name: String, message: String },

    #[error("Invalid format spec '{spec}': {reason}")]
    InvalidFormatSpec { spec: String, reason: String },
}

impl ResolverError {
    /// Create a missing template error
    pub fn missing_template(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingTemplate {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Create an invalid regex error from any regex engine error
    pub fn invalid_regex(name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidRegex {
            name: name.into(),
            message: err.to_string(),
        }
    }

    /// Create a circular reference error from the chain of template keys
    pub fn circular(chain: &[String]) -> Self {
        Self::CircularReference {
            chain: chain.join(" -> "),
        }
    }
}

/// Errors raised while formatting values into strings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The render rule cannot render the value
    #[error("Value {value:?} does not match token '{token}': {reason}")]
    InvalidValue {
        token: String,
        value: TokenValue,
        reason: String,
    },

    /// The rendered text does not parse back to the same value
    #[error("Value as string '{string}' does not match token '{token}'")]
    RoundTrip { token: String, string: String },

    #[error("Missing required token: {0}")]
    MissingToken(String),
}

impl FormatError {
    /// Name of the missing token, if this is a missing token error
    pub fn missing_token(&self) -> Option<&str> {
        match self {
            Self::MissingToken(name) => Some(name),
            _ => None,
        }
    }
}

/// Errors raised while parsing strings into values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("String '{string}' does not match token '{token}'")]
    TokenMismatch { token: String, string: String },

    #[error("String '{string}' does not match int token '{token}'")]
    InvalidInteger { token: String, string: String },

    #[error("String '{string}' doesn't match template '{template}'")]
    TemplateMismatch { template: String, string: String },

    /// The regex engine gave up (e.g. backtracking limit)
    #[error("Matching template '{template}' failed: {message}")]
    Engine { template: String, message: String },

    #[error(transparent)]
    Debug(#[from] DebugParseError),
}

/// Detailed parse failure that locates where a string stops matching
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DebugParseError {
    /// A segment fails to match, or no segment matches at all
    #[error("{message}")]
    Segment {
        message: String,
        char_index: usize,
        segment_index: usize,
        fields: Fields,
    },

    /// Two occurrences of the same token parsed to different values
    #[error("Mismatched values for token {{{token}}}: {previous} != {value}")]
    MismatchToken {
        token: String,
        previous: TokenValue,
        value: TokenValue,
        char_index: usize,
        segment_index: usize,
        fields: Fields,
    },

    /// The whole template matches but the string has trailing text
    #[error("Template matches string with remainder")]
    ExcessString {
        char_index: usize,
        segment_index: usize,
        fields: Fields,
    },
}

impl DebugParseError {
    /// Character offset into the input where matching stops
    pub fn char_index(&self) -> usize {
        match self {
            Self::Segment { char_index, .. }
            | Self::MismatchToken { char_index, .. }
            | Self::ExcessString { char_index, .. } => *char_index,
        }
    }

    /// Index of the failing segment in the flattened segment list
    pub fn segment_index(&self) -> usize {
        match self {
            Self::Segment { segment_index, .. }
            | Self::MismatchToken { segment_index, .. }
            | Self::ExcessString { segment_index, .. } => *segment_index,
        }
    }

    /// Fields parsed from the segments that matched before the failure
    pub fn fields(&self) -> &Fields {
        match self {
            Self::Segment { fields, .. }
            | Self::MismatchToken { fields, .. }
            | Self::ExcessString { fields, .. } => fields,
        }
    }

    /// One-line summary naming the failing segment
    fn headline(&self, template: &Template) -> String {
        let segments = template.segments(false);
        match segments.get(self.segment_index()) {
            Some(Segment::Literal(text)) => format!("String '{}' does not match", text),
            Some(Segment::Token(token)) => format!(
                "Token '{}' does not match: {}",
                token.name(),
                token.description()
            ),
            Some(Segment::Template(child)) => {
                format!("Template '{}' does not match", child.name())
            }
            None => self.to_string(),
        }
    }

    /// Render a caret diagnostic pointing at the failure
    ///
    /// ```text
    /// Token 'shot' does not match: Must be a 3-digit integer
    /// Pattern: seq{sequence}_shot{shot}
    ///          seqSequence_shot12
    ///                          ^
    /// ```
    pub fn explain(&self, template: &Template, input: &str) -> String {
        const PREFIX: &str = "Pattern: ";
        let indent = " ".repeat(PREFIX.len());
        let column = self.char_index();
        [
            self.headline(template),
            format!("{}{}", PREFIX, template.pattern(false)),
            format!("{}{}", indent, input),
            format!("{}{}^", indent, " ".repeat(column)),
        ]
        .join("\n")
    }

    /// Format the error with source context using ariadne
    pub fn report(&self, template: &Template, input: &str, source_name: &str) -> String {
        let length = input.chars().count();
        let column = self.char_index().min(length);
        let span = if column < length {
            column..column + 1
        } else {
            column..column
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, source_name, column)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(
                Label::new((source_name, span))
                    .with_message(self.headline(template))
                    .with_color(Color::Red),
            )
            .with_note(format!("Pattern: {}", template.pattern(false)))
            .finish()
            .write((source_name, Source::from(input)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.explain(template, input),
        }
    }
}

/// Errors raised while searching the filesystem with a path template
#[derive(Debug, Error)]
pub enum PathSearchError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_messages() {
        let err = ResolverError::InvalidPadding {
            padmin: 3,
            padmax: 1,
        };
        assert_eq!(err.to_string(), "Padmax (1) cannot be lower than padmin (3)");

        let err = ResolverError::NegativePadding {
            field: "Padmin",
            value: -1,
        };
        assert_eq!(err.to_string(), "Padmin cannot be less than 0: -1");
    }

    #[test]
    fn test_circular_display() {
        let err = ResolverError::circular(&[
            "template.a".to_string(),
            "template.b".to_string(),
            "template.a".to_string(),
        ]);
        assert!(err
            .to_string()
            .contains("template.a -> template.b -> template.a"));
    }

    #[test]
    fn test_missing_token_accessor() {
        let err = FormatError::MissingToken("shot".to_string());
        assert_eq!(err.missing_token(), Some("shot"));
        assert_eq!(err.to_string(), "Missing required token: shot");
        assert_eq!(
            FormatError::RoundTrip {
                token: "a".to_string(),
                string: "b".to_string()
            }
            .missing_token(),
            None
        );
    }

    #[test]
    fn test_mismatch_message() {
        let err = DebugParseError::MismatchToken {
            token: "n".to_string(),
            previous: TokenValue::Int(1),
            value: TokenValue::Int(2),
            char_index: 2,
            segment_index: 2,
            fields: Fields::new(),
        };
        assert_eq!(err.to_string(), "Mismatched values for token {n}: 1 != 2");
        assert_eq!(err.char_index(), 2);
        assert_eq!(err.segment_index(), 2);
    }
}

//! Templates: ordered sequences of literal text, tokens and nested templates
//!
//! A template compiles its (possibly nested) segments into a single regular
//! expression. The first occurrence of a token becomes a named capture group
//! and every later occurrence a backreference to it, so a string whose
//! repeated tokens disagree never matches.
//!
//! # Example
//!
//! ```rust
//! use template_resolver::{Fields, Segment, Template, Token};
//!
//! let shot = Token::int("shot").unwrap();
//! let template = Template::new(
//!     "shot",
//!     vec![Segment::from("sh"), Segment::from(shot)],
//! )
//! .unwrap();
//!
//! let mut fields = Fields::new();
//! fields.insert("shot".to_string(), 10.into());
//! assert_eq!(template.format(&fields).unwrap(), "sh10");
//! assert_eq!(template.parse("sh10").unwrap(), fields);
//! ```

mod debug;
mod path;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fancy_regex::Regex;
use serde::Deserialize;

use crate::error::{FormatError, ParseError, ResolverError};
use crate::token::{Token, TokenRef};
use crate::value::Fields;

pub use path::{normalize_path, PathMatches, PathTemplate, PATH_WILDCARD};

/// Shared handle to a template
pub type TemplateRef = Arc<Template>;

/// How a template treats the strings it formats and parses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TemplateKind {
    /// Plain strings
    #[default]
    #[serde(rename = "template")]
    Standard,
    /// Filesystem paths: separators are normalized before parsing and after formatting
    #[serde(rename = "path")]
    Path,
}

/// One element of a template
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Token(TokenRef),
    Template(TemplateRef),
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::Literal(text.to_string())
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::Literal(text)
    }
}

impl From<Token> for Segment {
    fn from(token: Token) -> Self {
        Segment::Token(Arc::new(token))
    }
}

impl From<TokenRef> for Segment {
    fn from(token: TokenRef) -> Self {
        Segment::Token(token)
    }
}

impl From<Template> for Segment {
    fn from(template: Template) -> Self {
        Segment::Template(Arc::new(template))
    }
}

impl From<TemplateRef> for Segment {
    fn from(template: TemplateRef) -> Self {
        Segment::Template(template)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Token(token) => write!(f, "{{{}}}", token.name()),
            Segment::Template(template) => f.write_str(&template.pattern(false)),
        }
    }
}

/// Options controlling how missing and overridden fields are formatted
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// Raw text used for a token instead of formatting its value (eg glob wildcards)
    pub unformatted: BTreeMap<String, String>,
    /// Fall back to token defaults for missing fields
    pub use_defaults: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            unformatted: BTreeMap::new(),
            use_defaults: true,
        }
    }
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `text` verbatim for the token named `name`
    pub fn with_unformatted(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.unformatted.insert(name.into(), text.into());
        self
    }

    pub fn with_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }
}

/// A named, compiled sequence of segments
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    kind: TemplateKind,
    segments: Vec<Segment>,
    /// `^...$`, for full-string parsing
    full: Regex,
    /// `^...`, for prefix extraction
    prefix: Regex,
}

impl Template {
    /// Create a standard template
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Result<Self, ResolverError> {
        Self::with_kind(name, TemplateKind::Standard, segments)
    }

    /// Create a path template
    pub fn path(name: impl Into<String>, segments: Vec<Segment>) -> Result<Self, ResolverError> {
        Self::with_kind(name, TemplateKind::Path, segments)
    }

    pub fn with_kind(
        name: impl Into<String>,
        kind: TemplateKind,
        segments: Vec<Segment>,
    ) -> Result<Self, ResolverError> {
        let name = name.into();
        let body = regex_for(&segments);
        log::trace!("compiling template '{}': {}", name, body);

        let full = Regex::new(&format!("^{}$", body))
            .map_err(|e| ResolverError::invalid_regex(&name, e))?;
        let prefix =
            Regex::new(&format!("^{}", body)).map_err(|e| ResolverError::invalid_regex(&name, e))?;

        Ok(Self {
            name,
            kind,
            segments,
            full,
            prefix,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Regex matching the whole template, without anchors
    pub fn regex(&self) -> String {
        regex_for(&self.segments)
    }

    /// Placeholder form of the template, eg `seq{sequence}_shot{shot}`
    ///
    /// With `include_format_specs`, tokens also show their format spec: `{shot:0=3d}`.
    pub fn pattern(&self, include_format_specs: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) if include_format_specs => {
                    out.push_str(&format!("{{{}:{}}}", token.name(), token.format_spec()))
                }
                Segment::Token(token) => out.push_str(&format!("{{{}}}", token.name())),
                Segment::Template(child) => out.push_str(&child.pattern(include_format_specs)),
            }
        }
        out
    }

    /// Segments of the template; child templates are expanded unless `local_only`
    pub fn segments(&self, local_only: bool) -> Vec<Segment> {
        let mut out = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Template(child) if !local_only => out.extend(child.segments(false)),
                _ => out.push(segment.clone()),
            }
        }
        out
    }

    /// Token segments in traversal order, duplicates included
    pub fn tokens(&self, local_only: bool) -> Vec<TokenRef> {
        self.segments(local_only)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Token(token) => Some(token),
                _ => None,
            })
            .collect()
    }

    /// Child templates, depth first; all descendants unless `local_only`
    pub fn templates(&self, local_only: bool) -> Vec<TemplateRef> {
        let mut out = Vec::new();
        for segment in &self.segments {
            if let Segment::Template(child) = segment {
                out.push(Arc::clone(child));
                if !local_only {
                    out.extend(child.templates(false));
                }
            }
        }
        out
    }

    /// Literal text segments
    pub fn fixed_strings(&self, local_only: bool) -> Vec<String> {
        self.segments(local_only)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Literal(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Format the template with token defaults enabled and no overrides
    pub fn format(&self, fields: &Fields) -> Result<String, FormatError> {
        self.format_with(fields, &FormatOptions::default())
    }

    /// Format the template, filling each token from `options.unformatted`,
    /// then `fields`, then the token default
    pub fn format_with(&self, fields: &Fields, options: &FormatOptions) -> Result<String, FormatError> {
        let formatted = self.render_segments(fields, options)?;
        Ok(match self.kind {
            TemplateKind::Standard => formatted,
            TemplateKind::Path => normalize_path(&formatted),
        })
    }

    fn render_segments(&self, fields: &Fields, options: &FormatOptions) -> Result<String, FormatError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Template(child) => out.push_str(&child.render_segments(fields, options)?),
                Segment::Token(token) => out.push_str(&format_token(token, fields, options)?),
            }
        }
        Ok(out)
    }

    /// Parse a string that must match the whole template
    pub fn parse(&self, string: &str) -> Result<Fields, ParseError> {
        let input = self.normalize_input(string);
        let (fields, _) = self.match_regex(&self.full, &input, string)?;
        Ok(fields)
    }

    /// Parse the template from the start of a string, returning the fields and
    /// the byte offset where the match ends
    pub fn extract(&self, string: &str) -> Result<(Fields, usize), ParseError> {
        let input = self.normalize_input(string);
        self.match_regex(&self.prefix, &input, string)
    }

    /// Path templates accept either separator
    fn normalize_input<'a>(&self, string: &'a str) -> Cow<'a, str> {
        match self.kind {
            TemplateKind::Path if string.contains('\\') => Cow::Owned(string.replace('\\', "/")),
            _ => Cow::Borrowed(string),
        }
    }

    fn match_regex(
        &self,
        regex: &Regex,
        input: &str,
        original: &str,
    ) -> Result<(Fields, usize), ParseError> {
        let captures = regex
            .captures(input)
            .map_err(|e| ParseError::Engine {
                template: self.name.clone(),
                message: e.to_string(),
            })?
            .ok_or_else(|| ParseError::TemplateMismatch {
                template: self.to_string(),
                string: original.to_string(),
            })?;

        // Repeated tokens are backreferences, so each name has a single capture
        let mut fields = Fields::new();
        for token in self.tokens(false) {
            if fields.contains_key(token.name()) {
                continue;
            }
            if let Some(matched) = captures.name(token.name()) {
                let value = token.value_from_text(matched.as_str())?;
                fields.insert(token.name().to_string(), value);
            }
        }

        let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
        Ok((fields, end))
    }
}

/// Resolve and render a single token's text
fn format_token(token: &Token, fields: &Fields, options: &FormatOptions) -> Result<String, FormatError> {
    if let Some(text) = options.unformatted.get(token.name()) {
        return Ok(text.clone());
    }
    match (fields.get(token.name()), token.default_value()) {
        (Some(value), _) => token.format(value),
        (None, Some(default)) if options.use_defaults => token.format(default),
        (None, _) => Err(FormatError::MissingToken(token.name().to_string())),
    }
}

/// Unanchored regex for a segment list
fn regex_for(segments: &[Segment]) -> String {
    let mut seen = Vec::new();
    let mut out = String::new();
    push_regex(segments, &mut seen, &mut out);
    out
}

/// Append the regex of each segment; `seen` holds the token names already
/// captured in this compilation pass, across nested templates
fn push_regex(segments: &[Segment], seen: &mut Vec<String>, out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(&fancy_regex::escape(text)),
            Segment::Template(child) => push_regex(&child.segments, seen, out),
            Segment::Token(token) if seen.iter().any(|name| name == token.name()) => {
                out.push_str(&format!("(?P={})", token.name()))
            }
            Segment::Token(token) => {
                out.push_str(&format!("(?P<{}>{})", token.name(), token.regex()));
                seen.push(token.name().to_string());
            }
        }
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.segments == other.segments
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.pattern(false))
    }
}

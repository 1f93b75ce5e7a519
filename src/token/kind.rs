//! Token kinds: the capability interface behind the `type` of a token
//!
//! Each kind knows how to derive a token's pattern, render rule and
//! description from a [`TokenConfig`], and how to convert matched text back
//! into a [`TokenValue`]. Kinds are looked up by type tag in a [`KindRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ParseError, ResolverError};
use crate::value::TokenValue;

use super::config::{regex_padding, TokenConfig};
use super::render::{RenderRule, RenderType};

pub const INT_REGEX: &str = "[0-9]";
pub const STR_REGEX: &str = "[a-zA-Z]";

pub const DEFAULT_PADCHAR_INT: char = '0';
pub const DEFAULT_PADALIGN_INT: char = '=';
pub const DEFAULT_PADCHAR_STR: char = 'X';
pub const DEFAULT_PADALIGN_STR: char = '>';

/// Capability interface implemented by every token type
pub trait TokenKind: fmt::Debug + Send + Sync {
    /// Type tag used in configuration (`type = "int"`)
    fn tag(&self) -> &str;

    /// Unanchored pattern matching one value of the token
    fn regex_from_config(&self, name: &str, config: &TokenConfig) -> Result<String, ResolverError>;

    /// Rule used to render values of the token
    fn render_rule_from_config(&self, config: &TokenConfig) -> Result<RenderRule, ResolverError>;

    /// Human readable explanation of the expected value
    fn description_from_config(&self, config: &TokenConfig) -> String;

    /// Convert matched text into a value
    fn value_from_text(&self, token: &str, text: &str) -> Result<TokenValue, ParseError>;
}

/// Pattern from an explicit regex, a set of choices, or a padded character class
fn base_regex(config: &TokenConfig, class: &str) -> Result<String, ResolverError> {
    if let Some(regex) = &config.regex {
        if config.has_construction_keywords() {
            return Err(ResolverError::ConflictingOptions);
        }
        return Ok(regex.clone());
    }

    let (padmin, padmax) = config.padding()?;
    match &config.choices {
        Some(choices) if !choices.is_empty() => Ok(choices_regex(choices)),
        _ => Ok(format!("{}{}", class, regex_padding(padmin, padmax))),
    }
}

/// Escaped alternation of the literal choices
fn choices_regex(choices: &[TokenValue]) -> String {
    let alternatives: Vec<String> = choices
        .iter()
        .map(|choice| regex::escape(&choice.to_string()))
        .collect();
    format!("(?:{})", alternatives.join("|"))
}

/// Explicit format spec, or one synthesized from the padding options
fn padded_render_rule(
    config: &TokenConfig,
    padchar: char,
    padalign: char,
    strict_by_default: bool,
    render_type: RenderType,
) -> Result<RenderRule, ResolverError> {
    if let Some(spec) = &config.format_spec {
        return RenderRule::parse(spec);
    }

    let strict = config.padstrict.unwrap_or(strict_by_default);
    let (padmin, _) = config.padding()?;
    match padmin {
        Some(width) if !strict => RenderRule::padded(
            config.padchar.unwrap_or(padchar),
            config.padalign.unwrap_or(padalign),
            width,
            Some(render_type),
        ),
        _ => Ok(RenderRule::typed(Some(render_type))),
    }
}

/// Explicit description, or one listing the allowed choices
fn choices_description(config: &TokenConfig) -> Option<String> {
    if let Some(description) = &config.description {
        return Some(description.clone());
    }
    match &config.choices {
        Some(choices) if !choices.is_empty() => {
            let listed: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
            Some(format!("Must be one of: {:?}", listed))
        }
        _ => None,
    }
}

/// Padding phrasing shared by the built-in kinds, eg "a minimum 3-digit"
fn width_phrase(config: &TokenConfig, unit: &str) -> Option<String> {
    match (config.padmin, config.padmax) {
        (Some(lo), Some(hi)) if lo == hi => Some(format!("a {}-{}", lo, unit)),
        (Some(lo), _) => Some(format!("a minimum {}-{}", lo, unit)),
        (None, Some(hi)) => Some(format!("a maximum {}-{}", hi, unit)),
        (None, None) => None,
    }
}

/// Integer tokens: digit classes, numeric rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct IntKind;

impl TokenKind for IntKind {
    fn tag(&self) -> &str {
        "int"
    }

    fn regex_from_config(&self, _name: &str, config: &TokenConfig) -> Result<String, ResolverError> {
        if config.case.is_some() {
            return Err(ResolverError::CaseNotSupported {
                kind: self.tag().to_string(),
            });
        }
        base_regex(config, INT_REGEX)
    }

    fn render_rule_from_config(&self, config: &TokenConfig) -> Result<RenderRule, ResolverError> {
        padded_render_rule(
            config,
            DEFAULT_PADCHAR_INT,
            DEFAULT_PADALIGN_INT,
            false,
            RenderType::Int,
        )
    }

    fn description_from_config(&self, config: &TokenConfig) -> String {
        if let Some(description) = choices_description(config) {
            return description;
        }
        match width_phrase(config, "digit") {
            Some(width) => format!("Must be {} integer", width),
            None => "Must be an integer".to_string(),
        }
    }

    fn value_from_text(&self, token: &str, text: &str) -> Result<TokenValue, ParseError> {
        text.parse::<i64>()
            .map(TokenValue::Int)
            .map_err(|_| ParseError::InvalidInteger {
                token: token.to_string(),
                string: text.to_string(),
            })
    }
}

/// String tokens: letter classes, optionally constrained by case or choices
#[derive(Debug, Clone, Copy, Default)]
pub struct StrKind;

impl TokenKind for StrKind {
    fn tag(&self) -> &str {
        "str"
    }

    fn regex_from_config(&self, _name: &str, config: &TokenConfig) -> Result<String, ResolverError> {
        let Some(case) = config.case else {
            return base_regex(config, STR_REGEX);
        };
        if config.regex.is_some() {
            return Err(ResolverError::ConflictingOptions);
        }

        let (mut padmin, mut padmax) = config.padding()?;
        // The fixed leading character of camel cases counts towards the width
        if case.is_camel() {
            padmin = padmin.and_then(|n| n.checked_sub(1));
            padmax = padmax.and_then(|n| n.checked_sub(1));
        }
        Ok(format!("{}{}", case.regex(), regex_padding(padmin, padmax)))
    }

    fn render_rule_from_config(&self, config: &TokenConfig) -> Result<RenderRule, ResolverError> {
        padded_render_rule(
            config,
            DEFAULT_PADCHAR_STR,
            DEFAULT_PADALIGN_STR,
            true,
            RenderType::Str,
        )
    }

    fn description_from_config(&self, config: &TokenConfig) -> String {
        if let Some(description) = choices_description(config) {
            return description;
        }
        let case = config
            .case
            .map(|c| format!("{} case ", c))
            .unwrap_or_default();
        match width_phrase(config, "character") {
            Some(width) => format!("Must be {} {}string", width, case),
            None => format!("Must be a {}string", case),
        }
    }

    fn value_from_text(&self, _token: &str, text: &str) -> Result<TokenValue, ParseError> {
        Ok(TokenValue::Str(text.to_string()))
    }
}

/// Tokens defined purely by an explicit regex; values are the matched text
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomKind;

impl TokenKind for CustomKind {
    fn tag(&self) -> &str {
        "custom"
    }

    fn regex_from_config(&self, name: &str, config: &TokenConfig) -> Result<String, ResolverError> {
        match &config.regex {
            Some(_) if config.has_construction_keywords() => Err(ResolverError::ConflictingOptions),
            Some(regex) => Ok(regex.clone()),
            None => Err(ResolverError::MissingRegex {
                name: name.to_string(),
                kind: self.tag().to_string(),
            }),
        }
    }

    fn render_rule_from_config(&self, config: &TokenConfig) -> Result<RenderRule, ResolverError> {
        match &config.format_spec {
            Some(spec) => RenderRule::parse(spec),
            None => Ok(RenderRule::typed(None)),
        }
    }

    fn description_from_config(&self, config: &TokenConfig) -> String {
        config.description.clone().unwrap_or_default()
    }

    fn value_from_text(&self, _token: &str, text: &str) -> Result<TokenValue, ParseError> {
        Ok(TokenValue::Str(text.to_string()))
    }
}

/// Token kinds available to a resolver, keyed by type tag
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<dyn TokenKind>>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let mut registry = Self {
            kinds: HashMap::new(),
        };
        registry.register(Arc::new(IntKind));
        registry.register(Arc::new(StrKind));
        registry.register(Arc::new(CustomKind));
        registry
    }
}

impl KindRegistry {
    /// Create a registry with the built-in `int`, `str` and `custom` kinds
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any existing kind with the same tag
    pub fn register(&mut self, kind: Arc<dyn TokenKind>) {
        self.kinds.insert(kind.tag().to_string(), kind);
    }

    /// Look up a kind by type tag
    pub fn get(&self, tag: &str) -> Result<Arc<dyn TokenKind>, ResolverError> {
        self.kinds
            .get(tag)
            .cloned()
            .ok_or_else(|| ResolverError::UnknownTokenType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }
}

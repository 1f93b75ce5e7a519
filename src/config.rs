//! Definition files: tokens and templates described in TOML
//!
//! ```toml
//! [tokens]
//! str = "str"
//! shot = { type = "int", padmin = 3 }
//!
//! [templates.template]
//! root = "{str}_{shot}"
//!
//! [templates.path]
//! work = "/shows/{@template.root}/work"
//! ```
//!
//! Every `templates` entry is a group: a table whose keys are template names,
//! even when a template is called `string` or `type`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::ResolverError;
use crate::template::TemplateKind;
use crate::token::TokenConfig;

/// Errors that can occur when loading definitions
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read definitions file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse definitions TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

/// A token definition: a bare type name or a full configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenDefinition {
    Kind(String),
    Detailed(TokenConfig),
}

impl TokenDefinition {
    pub fn to_config(&self) -> TokenConfig {
        match self {
            TokenDefinition::Kind(kind) => TokenConfig::new(kind.as_str()),
            TokenDefinition::Detailed(config) => config.clone(),
        }
    }
}

impl From<TokenConfig> for TokenDefinition {
    fn from(config: TokenConfig) -> Self {
        TokenDefinition::Detailed(config)
    }
}

impl From<&str> for TokenDefinition {
    fn from(kind: &str) -> Self {
        TokenDefinition::Kind(kind.to_string())
    }
}

/// Table form of a template definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedTemplate {
    pub string: String,
    /// Overrides the kind implied by the template's group
    #[serde(rename = "type", default)]
    pub kind: Option<TemplateKind>,
}

/// A template definition: a bare definition string or a table with options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateDefinition {
    Pattern(String),
    Detailed(DetailedTemplate),
}

impl TemplateDefinition {
    /// Definition string, eg `{@root}_{str}`
    pub fn string(&self) -> &str {
        match self {
            TemplateDefinition::Pattern(string) => string,
            TemplateDefinition::Detailed(detailed) => &detailed.string,
        }
    }

    /// Explicitly requested template kind
    pub fn kind(&self) -> Option<TemplateKind> {
        match self {
            TemplateDefinition::Pattern(_) => None,
            TemplateDefinition::Detailed(detailed) => detailed.kind,
        }
    }
}

impl From<&str> for TemplateDefinition {
    fn from(string: &str) -> Self {
        TemplateDefinition::Pattern(string.to_string())
    }
}

impl From<String> for TemplateDefinition {
    fn from(string: String) -> Self {
        TemplateDefinition::Pattern(string)
    }
}

/// Template definitions by group, then name
pub type TemplateTable = BTreeMap<String, BTreeMap<String, TemplateDefinition>>;

/// Token and template definitions to build a resolver from
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenDefinition>,
    #[serde(default)]
    pub templates: TemplateTable,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load definitions from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_token(mut self, name: impl Into<String>, definition: impl Into<TokenDefinition>) -> Self {
        self.tokens.insert(name.into(), definition.into());
        self
    }

    pub fn with_template(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        definition: impl Into<TemplateDefinition>,
    ) -> Self {
        self.templates
            .entry(group.into())
            .or_default()
            .insert(name.into(), definition.into());
        self
    }
}

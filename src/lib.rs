//! Template Resolver - format and parse strings through named templates
//!
//! Templates such as `seq{sequence}_shot{shot}` are compiled from typed tokens
//! into regular expressions that both format fields into strings and parse
//! strings back into fields. A [`Resolver`] keeps the named tokens and grouped
//! templates, building templates that reference each other on demand.
//!
//! # Example
//!
//! ```rust
//! use template_resolver::{from_toml, Fields, DEFAULT_GROUP};
//!
//! let resolver = from_toml(
//!     r#"
//!     [tokens]
//!     str = "str"
//!     int = "int"
//!
//!     [templates.template]
//!     root = "{str}_{int}"
//!     parent = "{@root}_{str}"
//!     "#,
//! )
//! .unwrap();
//!
//! let parent = resolver.template(DEFAULT_GROUP, "parent").unwrap();
//! let mut fields = Fields::new();
//! fields.insert("str".to_string(), "abc".into());
//! fields.insert("int".to_string(), 50.into());
//! assert_eq!(parent.format(&fields).unwrap(), "abc_50_abc");
//! assert_eq!(parent.parse("abc_50_abc").unwrap(), fields);
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod template;
pub mod token;
pub mod value;

use std::path::Path;

pub use config::{ConfigError, ResolverConfig, TemplateDefinition, TemplateTable, TokenDefinition};
pub use error::{DebugParseError, FormatError, ParseError, PathSearchError, ResolverError};
pub use resolver::{Resolver, DEFAULT_GROUP, PATH_GROUP};
pub use template::{FormatOptions, PathTemplate, Segment, Template, TemplateKind, TemplateRef};
pub use token::{Case, Token, TokenConfig, TokenKind, TokenRef};
pub use value::{Fields, TokenValue};

/// Build a resolver from a TOML definitions string
pub fn from_toml(content: &str) -> Result<Resolver, ConfigError> {
    let config = ResolverConfig::from_str(content)?;
    Ok(Resolver::from_config(&config)?)
}

/// Build a resolver from a TOML definitions file
pub fn from_file(path: &Path) -> Result<Resolver, ConfigError> {
    let config = ResolverConfig::from_file(path)?;
    Ok(Resolver::from_config(&config)?)
}

//! Resolver: the registry of named tokens and grouped templates
//!
//! Templates are built from definition strings. A definition may reference
//! templates that do not exist yet; these are built on demand from a table of
//! pending definitions, with cycles rejected before recursing.

mod context;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ResolverConfig, TemplateDefinition, TemplateTable};
use crate::error::ResolverError;
use crate::parser::{expand_env, split, Piece, TEMPLATE_SYMBOL};
use crate::template::{Segment, Template, TemplateKind, TemplateRef};
use crate::token::{KindRegistry, Token, TokenConfig, TokenKind, TokenRef};

pub use context::ResolutionContext;

/// Group used when none is given
pub const DEFAULT_GROUP: &str = "template";

/// Group whose templates are path templates
pub const PATH_GROUP: &str = "path";

impl TemplateKind {
    /// Kind implied by the group a template is defined in
    pub fn for_group(group: &str) -> Self {
        if group == PATH_GROUP {
            TemplateKind::Path
        } else {
            TemplateKind::Standard
        }
    }
}

/// Registry of tokens and templates
///
/// Tokens and templates are write-once: registering an existing name fails.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    tokens: BTreeMap<String, TokenRef>,
    templates: BTreeMap<String, BTreeMap<String, TemplateRef>>,
    kinds: KindRegistry,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional token kind
    pub fn with_kind(mut self, kind: Arc<dyn TokenKind>) -> Self {
        self.kinds.register(kind);
        self
    }

    /// Build a resolver from definitions: all tokens first, then templates
    /// group by group
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolverError> {
        let mut resolver = Self::new();
        resolver.load(config)?;
        Ok(resolver)
    }

    /// Add the definitions of `config` to this resolver
    pub fn load(&mut self, config: &ResolverConfig) -> Result<(), ResolverError> {
        for (name, definition) in &config.tokens {
            self.create_token(name, &definition.to_config())?;
        }
        for (group, definitions) in &config.templates {
            for (name, definition) in definitions {
                // Already built while resolving an earlier reference
                if self.has_template(group, name) {
                    continue;
                }
                self.create_template(name, group, definition, Some(&config.templates))?;
            }
        }
        Ok(())
    }

    /// Construct and register a token
    pub fn create_token(&mut self, name: &str, config: &TokenConfig) -> Result<TokenRef, ResolverError> {
        if self.has_token(name) {
            return Err(ResolverError::TokenExists {
                name: name.to_string(),
            });
        }
        let kind = self.kinds.get(&config.kind)?;
        let token = Token::from_config(name, kind, config)?;
        self.insert_token(token)
    }

    /// Register an already constructed token
    pub fn insert_token(&mut self, token: Token) -> Result<TokenRef, ResolverError> {
        if self.has_token(token.name()) {
            return Err(ResolverError::TokenExists {
                name: token.name().to_string(),
            });
        }
        log::debug!(
            "registered token '{}' ({}): {}",
            token.name(),
            token.kind(),
            token.regex()
        );
        let token = Arc::new(token);
        self.tokens.insert(token.name().to_string(), Arc::clone(&token));
        Ok(token)
    }

    /// Construct and register a template from its definition string
    ///
    /// `{@name}` references that are not registered yet are built from
    /// `references` (group, then name), recursively.
    pub fn create_template(
        &mut self,
        name: &str,
        group: &str,
        definition: &TemplateDefinition,
        references: Option<&TemplateTable>,
    ) -> Result<TemplateRef, ResolverError> {
        let mut ctx = ResolutionContext::new();
        self.build_template(name, group, definition, references, &mut ctx)
    }

    fn build_template(
        &mut self,
        name: &str,
        group: &str,
        definition: &TemplateDefinition,
        references: Option<&TemplateTable>,
        ctx: &mut ResolutionContext,
    ) -> Result<TemplateRef, ResolverError> {
        if self.has_template(group, name) {
            return Err(ResolverError::TemplateExists {
                group: group.to_string(),
                name: name.to_string(),
            });
        }
        let key = format!("{}.{}", group, name);
        ctx.start_resolving(&key)?;
        log::trace!("building template {} (depth {})", key, ctx.depth());

        let mut segments = Vec::new();
        for piece in split(&expand_env(definition.string())) {
            let segment = match piece {
                Piece::Literal(text) => Segment::Literal(text),
                Piece::Placeholder(placeholder) => match placeholder.symbol {
                    None => Segment::Token(self.token(&placeholder.name)?),
                    Some(TEMPLATE_SYMBOL) => {
                        let (ref_group, ref_name) = placeholder
                            .name
                            .split_once('.')
                            .unwrap_or((group, placeholder.name.as_str()));
                        Segment::Template(self.reference(ref_group, ref_name, references, ctx)?)
                    }
                    Some(symbol) => return Err(ResolverError::UnknownSymbol(symbol.to_string())),
                },
            };
            segments.push(segment);
        }

        let kind = definition
            .kind()
            .unwrap_or_else(|| TemplateKind::for_group(group));
        let template = Template::with_kind(name, kind, segments)?;
        ctx.done_resolving(&key);
        self.insert_template(group, template)
    }

    /// Look up a referenced template, building it from `references` if needed
    fn reference(
        &mut self,
        group: &str,
        name: &str,
        references: Option<&TemplateTable>,
        ctx: &mut ResolutionContext,
    ) -> Result<TemplateRef, ResolverError> {
        if let Ok(template) = self.template(group, name) {
            return Ok(template);
        }
        let definition = references
            .and_then(|table| table.get(group))
            .and_then(|definitions| definitions.get(name))
            .ok_or_else(|| ResolverError::missing_template(group, name))?;
        self.build_template(name, group, definition, references, ctx)
    }

    /// Register an already constructed template
    pub fn insert_template(&mut self, group: &str, template: Template) -> Result<TemplateRef, ResolverError> {
        if self.has_template(group, template.name()) {
            return Err(ResolverError::TemplateExists {
                group: group.to_string(),
                name: template.name().to_string(),
            });
        }
        log::debug!("registered template {}.{}", group, template);
        let template = Arc::new(template);
        self.templates
            .entry(group.to_string())
            .or_default()
            .insert(template.name().to_string(), Arc::clone(&template));
        Ok(template)
    }

    pub fn token(&self, name: &str) -> Result<TokenRef, ResolverError> {
        self.tokens
            .get(name)
            .cloned()
            .ok_or_else(|| ResolverError::MissingToken(name.to_string()))
    }

    pub fn template(&self, group: &str, name: &str) -> Result<TemplateRef, ResolverError> {
        self.templates
            .get(group)
            .and_then(|templates| templates.get(name))
            .cloned()
            .ok_or_else(|| ResolverError::missing_template(group, name))
    }

    /// Look up a template in the path group
    pub fn path_template(&self, name: &str) -> Result<TemplateRef, ResolverError> {
        self.template(PATH_GROUP, name)
    }

    pub fn has_token(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn has_template(&self, group: &str, name: &str) -> bool {
        self.templates
            .get(group)
            .is_some_and(|templates| templates.contains_key(name))
    }

    /// Registered tokens, by name
    pub fn tokens(&self) -> impl Iterator<Item = &TokenRef> {
        self.tokens.values()
    }

    /// Group names with at least one template
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Templates of a group, by name
    pub fn templates(&self, group: &str) -> impl Iterator<Item = &TemplateRef> {
        self.templates.get(group).into_iter().flat_map(|t| t.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::IntKind;
    use crate::value::Fields;
    use pretty_assertions::assert_eq;

    fn resolver_with_tokens() -> Resolver {
        let mut resolver = Resolver::new();
        resolver.create_token("str", &TokenConfig::new("str")).unwrap();
        resolver.create_token("int", &TokenConfig::new("int")).unwrap();
        resolver
    }

    #[test]
    fn test_create_token() {
        let mut resolver = Resolver::new();
        let token = resolver
            .create_token("int_padded", &TokenConfig::new("int").with_padmin(3))
            .unwrap();
        assert_eq!(token.regex(), "[0-9]{3,}");
        assert_eq!(token.format_spec(), "0=3d");
        assert_eq!(resolver.token("int_padded").unwrap(), token);

        let token = resolver
            .create_token("str", &TokenConfig::new("str").with_padmax(3))
            .unwrap();
        assert_eq!(token.regex(), "[a-zA-Z]{0,3}");
        assert_eq!(token.format_spec(), "s");
    }

    #[test]
    fn test_create_token_errors() {
        let mut resolver = resolver_with_tokens();
        let err = resolver.create_token("int", &TokenConfig::new("int")).unwrap_err();
        assert_eq!(err.to_string(), "Token 'int' already exists");

        let err = resolver.create_token("other", &TokenConfig::new("abc")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown token type: abc");
    }

    #[test]
    fn test_create_template() {
        let mut resolver = resolver_with_tokens();
        let template = resolver
            .create_template("name", DEFAULT_GROUP, &"/abc/{str}/{int}".into(), None)
            .unwrap();
        let expected = Template::new(
            "name",
            vec![
                "/abc/".into(),
                resolver.token("str").unwrap().into(),
                "/".into(),
                resolver.token("int").unwrap().into(),
            ],
        )
        .unwrap();
        assert_eq!(*template, expected);
        assert!(resolver.has_template(DEFAULT_GROUP, "name"));
    }

    #[test]
    fn test_create_template_with_existing_reference() {
        let mut resolver = resolver_with_tokens();
        let root = resolver
            .create_template("root", DEFAULT_GROUP, &"/root/{int}".into(), None)
            .unwrap();
        let template = resolver
            .create_template("name", DEFAULT_GROUP, &"{@root}/{str}".into(), None)
            .unwrap();
        assert_eq!(template.templates(true), vec![root]);
        assert_eq!(template.pattern(false), "/root/{int}/{str}");
    }

    #[test]
    fn test_create_template_from_references() {
        let mut resolver = resolver_with_tokens();
        let mut references = TemplateTable::new();
        references
            .entry(DEFAULT_GROUP.to_string())
            .or_default()
            .insert("prefix".to_string(), "{int}_".into());

        let template = resolver
            .create_template(
                "name",
                PATH_GROUP,
                &"{@template.prefix}{str}".into(),
                Some(&references),
            )
            .unwrap();
        assert_eq!(template.kind(), TemplateKind::Path);
        let prefix = resolver.template(DEFAULT_GROUP, "prefix").unwrap();
        assert_eq!(prefix.kind(), TemplateKind::Standard);
        assert_eq!(template.templates(true), vec![prefix]);
        assert!(resolver.path_template("name").is_ok());
    }

    #[test]
    fn test_create_template_errors() {
        let mut resolver = Resolver::new();
        let err = resolver
            .create_template("name", DEFAULT_GROUP, &"/root/{str}".into(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Requested token name does not exist: str");

        let err = resolver
            .create_template("name", DEFAULT_GROUP, &"/root/{@template}".into(), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requested template name does not exist: template"
        );

        let err = resolver
            .create_template("name", DEFAULT_GROUP, &"/root/{!str}".into(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown token symbol: !");

        resolver
            .create_template("name", DEFAULT_GROUP, &"string".into(), None)
            .unwrap();
        let err = resolver
            .create_template("name", DEFAULT_GROUP, &"/root/{str}".into(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Template 'template.name' already exists");
    }

    #[test]
    fn test_cycles_are_rejected() {
        let config = ResolverConfig::new()
            .with_template(DEFAULT_GROUP, "a", "{@b}")
            .with_template(DEFAULT_GROUP, "b", "x{@a}");
        let err = Resolver::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            ResolverError::CircularReference {
                chain: "template.a -> template.b -> template.a".to_string()
            }
        );

        let config = ResolverConfig::new().with_template(DEFAULT_GROUP, "self", "{@self}");
        assert!(matches!(
            Resolver::from_config(&config),
            Err(ResolverError::CircularReference { .. })
        ));
    }

    #[test]
    fn test_from_config_skips_templates_built_by_reference() {
        let config = ResolverConfig::new()
            .with_token("str", "str")
            .with_token("int", "int")
            .with_token("int_pad", TokenConfig::new("int").with_padmin(3))
            .with_token("lowerCase", TokenConfig::new("custom").with_regex("[a-z][a-zA-Z]+"))
            .with_template(DEFAULT_GROUP, "a_parent", "{@root}_{str}")
            .with_template(DEFAULT_GROUP, "root", "{str}_{int}")
            .with_template(DEFAULT_GROUP, "example", "{lowerCase}_{int}")
            .with_template(DEFAULT_GROUP, "name", "{@root}_{int_pad}");
        let resolver = Resolver::from_config(&config).unwrap();

        let names: Vec<&str> = resolver
            .templates(DEFAULT_GROUP)
            .map(|t| t.name())
            .collect();
        assert_eq!(names, vec!["a_parent", "example", "name", "root"]);
        assert_eq!(resolver.tokens().count(), 4);

        let name = resolver.template(DEFAULT_GROUP, "name").unwrap();
        assert_eq!(name.pattern(true), "{str:s}_{int:d}_{int_pad:0=3d}");

        let mut fields = Fields::new();
        fields.insert("str".to_string(), "abc".into());
        fields.insert("int".to_string(), 50.into());
        let parent = resolver.template(DEFAULT_GROUP, "a_parent").unwrap();
        assert_eq!(parent.format(&fields).unwrap(), "abc_50_abc");
        assert_eq!(parent.parse("abc_50_abc").unwrap(), fields);
    }

    #[test]
    fn test_environment_expansion() {
        std::env::set_var("TEMPLATE_RESOLVER_RESOLVER_ROOT", "/mnt");
        let mut resolver = resolver_with_tokens();
        let template = resolver
            .create_template(
                "root",
                PATH_GROUP,
                &"$TEMPLATE_RESOLVER_RESOLVER_ROOT/{str}".into(),
                None,
            )
            .unwrap();
        assert_eq!(template.pattern(false), "/mnt/{str}");
    }

    #[test]
    fn test_custom_kind_registration() {
        #[derive(Debug)]
        struct FrameKind;

        impl TokenKind for FrameKind {
            fn tag(&self) -> &str {
                "frame"
            }

            fn regex_from_config(&self, name: &str, config: &TokenConfig) -> Result<String, ResolverError> {
                IntKind.regex_from_config(name, config)
            }

            fn render_rule_from_config(
                &self,
                config: &TokenConfig,
            ) -> Result<crate::token::RenderRule, ResolverError> {
                IntKind.render_rule_from_config(config)
            }

            fn description_from_config(&self, _config: &TokenConfig) -> String {
                "Frame number".to_string()
            }

            fn value_from_text(
                &self,
                token: &str,
                text: &str,
            ) -> Result<crate::value::TokenValue, crate::error::ParseError> {
                IntKind.value_from_text(token, text)
            }
        }

        let mut resolver = Resolver::new().with_kind(Arc::new(FrameKind));
        let token = resolver
            .create_token("frame", &TokenConfig::new("frame").with_padmin(4))
            .unwrap();
        assert_eq!(token.kind(), "frame");
        assert_eq!(token.description(), "Frame number");
        assert_eq!(token.format(&12.into()).unwrap(), "0012");
    }
}

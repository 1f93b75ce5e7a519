//! Path templates
//!
//! A path template is a [`Template`] of kind [`TemplateKind::Path`]. Parsing
//! accepts either separator; formatting normalizes the result lexically and
//! uses the native separator. [`PathTemplate`] adds the path-only operations:
//! relative extraction, the root template and glob search.

use std::ops::Deref;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use super::{FormatOptions, Segment, Template, TemplateKind, TemplateRef};
use crate::error::{ParseError, PathSearchError};
use crate::value::Fields;

/// Text substituted for wildcard fields when searching
pub const PATH_WILDCARD: &str = "*";

/// Borrowed view of a path template
#[derive(Debug, Clone, Copy)]
pub struct PathTemplate<'a> {
    template: &'a Template,
}

impl Template {
    /// View this template as a path template; `None` for standard templates
    pub fn as_path(&self) -> Option<PathTemplate<'_>> {
        match self.kind {
            TemplateKind::Path => Some(PathTemplate { template: self }),
            TemplateKind::Standard => None,
        }
    }
}

impl<'a> PathTemplate<'a> {
    pub fn template(&self) -> &'a Template {
        self.template
    }

    /// Extract the template from the start of a path, returning the fields and
    /// the normalized remainder without leading separators
    pub fn extract_relative(&self, path: &str) -> Result<(Fields, String), ParseError> {
        let agnostic = path.replace('\\', "/");
        let (fields, end) = self.template.extract(&agnostic)?;
        let remainder = agnostic.get(end..).unwrap_or("").trim_start_matches('/');
        Ok((fields, normalize_path(remainder)))
    }

    /// Leading child template, if the path starts with one
    pub fn root_template(&self) -> Option<TemplateRef> {
        match self.template.segments.first() {
            Some(Segment::Template(child)) => Some(Arc::clone(child)),
            _ => None,
        }
    }

    /// Search the filesystem for paths matching the template
    ///
    /// Fields named in `wildcards` are replaced with `*`; every other token
    /// must have a value in `fields` or a default. The search is lazy and
    /// yields only the paths that parse back through the template.
    pub fn paths(&self, fields: &Fields, wildcards: &[&str]) -> Result<PathMatches<'a>, PathSearchError> {
        let options = wildcards
            .iter()
            .fold(FormatOptions::new(), |options, name| {
                options.with_unformatted(*name, PATH_WILDCARD)
            });
        let pattern = self.template.format_with(fields, &options)?;
        log::debug!("searching '{}' with {}", self.template.name(), pattern);

        Ok(PathMatches {
            template: self.template,
            entries: glob::glob(&pattern)?,
        })
    }
}

impl Deref for PathTemplate<'_> {
    type Target = Template;

    fn deref(&self) -> &Template {
        self.template
    }
}

/// Lazy iterator over the paths found by [`PathTemplate::paths`]
#[derive(Debug)]
pub struct PathMatches<'a> {
    template: &'a Template,
    entries: glob::Paths,
}

impl Iterator for PathMatches<'_> {
    type Item = (PathBuf, Fields);

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    log::debug!("skipping unreadable path: {}", err);
                    continue;
                }
            };
            let Some(text) = path.to_str() else {
                log::debug!("skipping non UTF-8 path: {}", path.display());
                continue;
            };
            match self.template.parse(text) {
                Ok(fields) => return Some((path, fields)),
                Err(err) => log::debug!("skipping {}: {}", path.display(), err),
            }
        }
        None
    }
}

/// Lexically normalize a path: collapse repeated separators and `.`
/// components, resolve `..` where possible and use the native separator
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with(['/', '\\']);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join(&MAIN_SEPARATOR.to_string());
    match (absolute, joined.is_empty()) {
        (true, _) => format!("{}{}", MAIN_SEPARATOR, joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

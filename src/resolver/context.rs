//! Bookkeeping for recursive template construction

use crate::error::ResolverError;

/// Templates under construction, outermost first
///
/// Keys are qualified `group.name` strings.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    resolving: Vec<String>,
}

impl ResolutionContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a template is currently being resolved
    pub fn is_resolving(&self, key: &str) -> bool {
        self.resolving.iter().any(|k| k == key)
    }

    /// Mark a template as being resolved, failing if it already is
    pub fn start_resolving(&mut self, key: &str) -> Result<(), ResolverError> {
        if self.is_resolving(key) {
            let mut chain = self.resolving.clone();
            chain.push(key.to_string());
            return Err(ResolverError::circular(&chain));
        }
        self.resolving.push(key.to_string());
        Ok(())
    }

    /// Mark a template as done resolving
    pub fn done_resolving(&mut self, key: &str) {
        if let Some(pos) = self.resolving.iter().rposition(|k| k == key) {
            self.resolving.remove(pos);
        }
    }

    /// Number of templates currently under construction
    pub fn depth(&self) -> usize {
        self.resolving.len()
    }
}

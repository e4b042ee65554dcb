//! Search request description

use std::collections::BTreeSet;

/// Parameters of one search invocation
///
/// Built once by the consumer and never modified while the search runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Seed URL; must include a scheme
    pub base_url: String,

    /// Raw regex typed by the user, if any
    pub explicit_pattern: Option<String>,

    /// Follow same-origin links found on the seed page
    pub recursive: bool,

    /// Names of registry patterns to apply
    pub built_in_patterns: BTreeSet<String>,
}

impl CrawlRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.explicit_pattern = Some(pattern.into());
        self
    }

    pub fn with_builtin(mut self, name: impl Into<String>) -> Self {
        self.built_in_patterns.insert(name.into());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// The explicit pattern, treating blank text as absent
    pub fn explicit_pattern(&self) -> Option<&str> {
        self.explicit_pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

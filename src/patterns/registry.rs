//! Named pattern table
//!
//! The registry is built once at startup from the shipped built-ins plus any
//! configured extras and is read-only afterwards. Per-search user patterns are
//! compiled separately and never added to the table.

use crate::config::PatternEntry;
use crate::PatternError;
use regex::Regex;
use std::collections::BTreeSet;

/// Names of the patterns shipped with the crate, in registration order
pub const BUILTIN_NAMES: [&str; 5] = ["email", "ip", "phone", "date", "time"];

const BUILTIN_SOURCES: [(&str, &str); 5] = [
    ("email", r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+"),
    (
        "ip",
        r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d{1,2})\.){3}(?:25[0-5]|2[0-4]\d|1?\d{1,2})\b",
    ),
    ("phone", r"(?:(?:\+33|0)[1-9](?:[\s.-]?\d{2}){4})"),
    (
        "date",
        r"\b(?:\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{4}[-/]\d{1,2}[-/]\d{1,2})\b",
    ),
    ("time", r"\b\d{1,2}:\d{2}(?:\s?[APap][Mm])?\b"),
];

/// A compiled pattern together with the literal text it was compiled from
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source`, reporting syntax errors as [`PatternError::Invalid`]
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(source).map_err(|e| PatternError::Invalid {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern text exactly as supplied
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns every non-overlapping match in `haystack`, left to right
    pub fn find_all<'a>(&'a self, haystack: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.regex.find_iter(haystack).map(|m| m.as_str())
    }
}

/// Ordered, immutable table of named patterns
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<(String, Pattern)>,
}

impl PatternRegistry {
    /// Builds a registry holding only the shipped built-ins
    pub fn builtin() -> Result<Self, PatternError> {
        Self::with_extra(&[])
    }

    /// Builds a registry from the built-ins followed by `extra` entries
    ///
    /// Extra entries keep their configured order. A name that is already
    /// registered (built-in or earlier extra) is rejected with
    /// [`PatternError::Duplicate`].
    pub fn with_extra(extra: &[PatternEntry]) -> Result<Self, PatternError> {
        let mut entries = Vec::with_capacity(BUILTIN_SOURCES.len() + extra.len());

        for (name, source) in BUILTIN_SOURCES {
            entries.push((name.to_string(), Pattern::compile(source)?));
        }

        for entry in extra {
            let name = entry.name.trim();
            if entries.iter().any(|(existing, _)| existing == name) {
                return Err(PatternError::Duplicate(name.to_string()));
            }
            entries.push((name.to_string(), Pattern::compile(&entry.regex)?));
        }

        Ok(Self { entries })
    }

    /// Looks up a pattern by name
    pub fn resolve(&self, name: &str) -> Result<&Pattern, PatternError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
            .ok_or_else(|| PatternError::NotFound(name.to_string()))
    }

    /// All registered names in registration order
    pub fn list_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterates `(name, pattern)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Resolves a set of names into patterns, ordered by registration
    ///
    /// Fails on the first name that is not registered.
    pub fn resolve_all(&self, names: &BTreeSet<String>) -> Result<Vec<Pattern>, PatternError> {
        if let Some(unknown) = names.iter().find(|n| self.resolve(n).is_err()) {
            return Err(PatternError::NotFound(unknown.clone()));
        }

        Ok(self
            .entries
            .iter()
            .filter(|(n, _)| names.contains(n))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

/// Compiles the optional pattern typed by the user
///
/// `None`, empty, and whitespace-only input all mean "no explicit pattern".
pub fn compile_user_pattern(raw: Option<&str>) -> Result<Option<Pattern>, PatternError> {
    match raw {
        Some(text) if !text.trim().is_empty() => Pattern::compile(text).map(Some),
        _ => Ok(None),
    }
}

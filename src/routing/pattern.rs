//! Alias path patterns.
//!
//! An alias is either a literal path, matched by string equality, or a regular
//! expression anchored at both ends whose capture groups become request
//! parameters. Both aliases and request paths are compared without surrounding
//! slashes.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use super::table::Captures;

/// First path segments owned by the host itself. Aliases may not shadow them.
pub const RESERVED_PREFIXES: &[&str] = &["_internal", "admin", "pages"];

/// Paths under each reserved prefix that a regex alias must not match: the
/// prefix itself, the host's own routes and arbitrary single segments.
const RESERVED_SAMPLE_TAILS: &[&str] = &[
    "",
    "/1",
    "/x",
    "/1/canonical",
    "/health",
    "/routes",
    "/routes/rebuild",
    "/purge",
];

const REGEX_SIZE_LIMIT: usize = 1 << 20;

const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("alias path must not be empty")]
    Empty,
    #[error("alias path exceeds {max} characters")]
    TooLong { max: usize },
    #[error("alias path must not contain whitespace or control characters")]
    InvalidCharacter,
    #[error("alias path shadows reserved prefix '{0}'")]
    Reserved(String),
    #[error("alias path matches the site root")]
    MatchesRoot,
    #[error("invalid alias pattern: {0}")]
    Syntax(String),
}

/// Strip surrounding whitespace and slashes from a path.
pub fn normalize_path(path: &str) -> &str {
    path.trim().trim_matches('/')
}

#[derive(Debug, Clone)]
pub enum AliasPattern {
    Literal(String),
    Regex(Regex),
}

impl AliasPattern {
    /// Validate and compile an alias path.
    pub fn compile(alias_path: &str, max_len: usize) -> Result<Self, PatternError> {
        let alias = normalize_path(alias_path);
        if alias.is_empty() {
            return Err(PatternError::Empty);
        }
        if alias.chars().count() > max_len {
            return Err(PatternError::TooLong { max: max_len });
        }
        if alias.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(PatternError::InvalidCharacter);
        }

        let first_segment = alias.split('/').next().unwrap_or_default();
        if let Some(reserved) = RESERVED_PREFIXES.iter().find(|p| **p == first_segment) {
            return Err(PatternError::Reserved((*reserved).to_string()));
        }

        if !alias.contains(REGEX_META) {
            return Ok(AliasPattern::Literal(alias.to_string()));
        }

        let regex = RegexBuilder::new(&format!("^(?:{alias})$"))
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| PatternError::Syntax(e.to_string()))?;
        if regex.is_match("") {
            return Err(PatternError::MatchesRoot);
        }
        if let Some(reserved) = RESERVED_PREFIXES.iter().find(|prefix| {
            RESERVED_SAMPLE_TAILS
                .iter()
                .any(|tail| regex.is_match(&format!("{prefix}{tail}")))
        }) {
            return Err(PatternError::Reserved((*reserved).to_string()));
        }
        Ok(AliasPattern::Regex(regex))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, AliasPattern::Literal(_))
    }

    /// Match a normalized request path, returning its captures on success.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        match self {
            AliasPattern::Literal(literal) => (literal == path).then(Captures::default),
            AliasPattern::Regex(regex) => {
                let caps = regex.captures(path)?;
                let mut captures = Captures::default();
                let names: Vec<Option<&str>> = regex.capture_names().collect();
                for (index, name) in names.iter().enumerate().skip(1) {
                    let Some(m) = caps.get(index) else {
                        continue;
                    };
                    captures.push(index.to_string(), m.as_str());
                    if let Some(name) = name {
                        captures.push(*name, m.as_str());
                    }
                }
                Some(captures)
            }
        }
    }
}

//! Ignore-file compilation.
//!
//! Turns `.gitignore`-style text into regex matchers over paths relative to a
//! scan root. This is a best-effort filter, not full gitignore:
//!
//! - `!` negation is recorded as unsupported and never matches
//! - `*` matches any run of characters, including `/`; there is no `**`
//! - `?` matches any single character
//! - a leading or trailing `/` anchors to the root; otherwise the pattern may
//!   start at any path segment
//! - every rule also matches everything below the path it names, so `build/`
//!   covers `build` and `build/...` but not `src/build`
//! - an unanchored name only matches whole segments: `node_modules` hits
//!   `web/node_modules` but not `web/my_node_modules`
//!
//! Note the common `node_modules/` line: with the trailing slash it only
//! excludes the root's own `node_modules`. A nested `web/node_modules` is
//! still scanned unless the file also lists `node_modules` without the slash
//! (git itself would ignore both).
//!
//! Matching is case-insensitive.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use serde::Serialize;
use tracing::{trace, warn};

/// One active rule compiled from an ignore file.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: String,
    pub line: usize,
    pub anchored: bool,
    pub directory: bool,
    matcher: Arc<Regex>,
}

impl IgnoreRule {
    pub fn is_match(&self, relative_path: &str) -> bool {
        self.matcher.is_match(relative_path)
    }

    pub fn regex(&self) -> &Regex {
        &self.matcher
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnsupportedReason {
    Negation,
    Invalid(String),
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedReason::Negation => write!(f, "negation is not supported"),
            UnsupportedReason::Invalid(msg) => write!(f, "invalid pattern: {}", msg),
        }
    }
}

/// A raw line that was left out of the active rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedPattern {
    pub pattern: String,
    pub line: usize,
    pub reason: UnsupportedReason,
}

/// Compiled rules for one scan root.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
    unsupported: Vec<UnsupportedPattern>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn unsupported(&self) -> &[UnsupportedPattern] {
        &self.unsupported
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First active rule matching `relative_path`, in file order.
    pub fn matching_rule(&self, relative_path: &str) -> Option<&IgnoreRule> {
        self.rules.iter().find(|rule| rule.is_match(relative_path))
    }

    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.matching_rule(relative_path).is_some()
    }
}

/// Compiles ignore-file text. Identical pattern text is translated at most
/// once per compiler, so one compiler should live as long as a scan session.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: DashMap<String, Result<Arc<Regex>, String>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns translated so far.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Compile a whole ignore file. Never fails: anything that cannot be
    /// translated lands in [`RuleSet::unsupported`].
    pub fn compile(&self, content: &str) -> RuleSet {
        let mut rule_set = RuleSet::default();

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let pattern = raw.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }

            if pattern.starts_with('!') {
                warn!("Ignore pattern '{}' (line {}) uses negation, skipping", pattern, line);
                rule_set.unsupported.push(UnsupportedPattern {
                    pattern: pattern.to_string(),
                    line,
                    reason: UnsupportedReason::Negation,
                });
                continue;
            }

            match self.compile_pattern(pattern) {
                Ok(matcher) => rule_set.rules.push(IgnoreRule {
                    pattern: pattern.to_string(),
                    line,
                    anchored: pattern.starts_with('/'),
                    directory: pattern.ends_with('/'),
                    matcher,
                }),
                Err(msg) => {
                    warn!("Invalid ignore pattern '{}' (line {}): {}", pattern, line, msg);
                    rule_set.unsupported.push(UnsupportedPattern {
                        pattern: pattern.to_string(),
                        line,
                        reason: UnsupportedReason::Invalid(msg),
                    });
                }
            }
        }

        rule_set
    }

    fn compile_pattern(&self, pattern: &str) -> Result<Arc<Regex>, String> {
        if let Some(cached) = self.cache.get(pattern) {
            trace!("Reusing compiled pattern '{}'", pattern);
            return cached.value().clone();
        }

        let compiled = glob_to_regex(pattern)
            .and_then(|source| Regex::new(&source).map_err(|e| e.to_string()))
            .map(Arc::new);

        self.cache
            .entry(pattern.to_string())
            .or_insert(compiled)
            .value()
            .clone()
    }
}

/// Translate one ignore pattern into regex source.
///
/// The result matches the named path itself or anything below it.
pub fn glob_to_regex(pattern: &str) -> Result<String, String> {
    let anchored = pattern.starts_with('/') || pattern.ends_with('/');
    let body = pattern.trim_start_matches('/').trim_end_matches('/');
    if body.is_empty() {
        return Err("pattern names no path".to_string());
    }

    let mut translated = String::with_capacity(body.len() * 2);
    let mut buf = [0u8; 4];
    for ch in body.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            _ => translated.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }

    let prefix = if anchored { "^" } else { "^(?:.*/)?" };
    Ok(format!("(?i){}{}(?:/.*)?$", prefix, translated))
}

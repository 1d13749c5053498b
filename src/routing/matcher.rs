//! Route pattern compilation and match state.
//!
//! # Responsibilities
//! - Parse URI patterns with `{name}` / `{name:regex}` placeholders
//! - Compile them into anchored regular expressions with named groups
//! - Memoize compiled expressions in a process-wide cache
//! - Carry the per-request match state ([`RouteMatch`])
//!
//! # Design Decisions
//! - Route patterns anchor the whole remaining path; router prefixes anchor only the start
//! - A route ending with a placeholder also accepts one trailing `/`
//! - Default placeholder expression is `[^/]+` (one path segment)
//! - Literal text is escaped, so `.` or `+` in a URI never act as regex operators

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::error::RouterError;
use crate::routing::route::{method_not_allowed_route, not_found_route, Route};

/// Expression used for placeholders without an explicit one.
pub const DEFAULT_PARAM_PATTERN: &str = "[^/]+";

/// How much of the path a compiled pattern must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// The whole remaining path (routes).
    Full,
    /// A leading part of the path (router prefixes).
    Prefix,
}

static REGEX_CACHE: Lazy<DashMap<(PatternKind, String), Arc<Regex>>> = Lazy::new(DashMap::new);

/// Drop every memoized expression.
pub fn clear_regex_cache() {
    REGEX_CACHE.clear();
}

/// Piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, pattern: String },
}

/// A compiled URI pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    regex: Arc<Regex>,
}

impl RoutePattern {
    /// Compile `raw`, reusing the cached expression when one exists.
    pub fn compile(raw: &str, kind: PatternKind) -> Result<Self, RouterError> {
        let segments = parse_segments(raw)?;
        let key = (kind, raw.to_string());

        let regex = match REGEX_CACHE.get(&key) {
            Some(cached) => Arc::clone(cached.value()),
            None => {
                let regex = Arc::new(build_regex(raw, &segments, kind)?);
                REGEX_CACHE.insert(key, Arc::clone(&regex));
                regex
            }
        };

        Ok(Self {
            raw: raw.to_string(),
            segments,
            regex,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match `path`, returning the matched length and the captured parameters.
    pub fn captures(&self, path: &str) -> Option<(usize, Vec<(String, String)>)> {
        let caps = self.regex.captures(path)?;
        let matched = caps.get(0)?.end();
        let params = self
            .param_names()
            .filter_map(|name| {
                caps.name(name)
                    .map(|value| (name.to_string(), value.as_str().to_string()))
            })
            .collect();
        Some((matched, params))
    }
}

/// Split a pattern into literal text and placeholders.
///
/// Braces nest, so placeholder expressions may use repetition counts such as `{code:[0-9]{3}}`.
pub fn parse_segments(raw: &str) -> Result<Vec<Segment>, RouterError> {
    let malformed = |reason: &str| RouterError::MalformedPattern {
        pattern: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut placeholder = String::new();
    let mut depth = 0usize;

    for c in raw.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                } else {
                    placeholder.push(c);
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(malformed("unbalanced '}'"));
                }
                depth -= 1;
                if depth == 0 {
                    let body = std::mem::take(&mut placeholder);
                    segments.push(parse_placeholder(&body).map_err(|reason| malformed(&reason))?);
                } else {
                    placeholder.push(c);
                }
            }
            _ if depth > 0 => placeholder.push(c),
            _ => literal.push(c),
        }
    }

    if depth != 0 {
        return Err(malformed("unclosed '{'"));
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn parse_placeholder(body: &str) -> Result<Segment, String> {
    let (name, pattern) = match body.split_once(':') {
        Some((name, pattern)) => (name.trim(), pattern),
        None => (body.trim(), ""),
    };

    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid parameter name `{}`", name));
    }

    let pattern = if pattern.is_empty() {
        DEFAULT_PARAM_PATTERN
    } else {
        pattern
    };
    Ok(Segment::Param {
        name: name.to_string(),
        pattern: pattern.to_string(),
    })
}

fn build_regex(raw: &str, segments: &[Segment], kind: PatternKind) -> Result<Regex, RouterError> {
    let mut expression = String::with_capacity(raw.len() + 16);
    expression.push('^');
    for segment in segments {
        match segment {
            Segment::Literal(text) => expression.push_str(&regex::escape(text)),
            Segment::Param { name, pattern } => {
                expression.push_str("(?P<");
                expression.push_str(name);
                expression.push('>');
                expression.push_str(pattern);
                expression.push(')');
            }
        }
    }
    if kind == PatternKind::Full {
        // A trailing slash is optional after a final placeholder only.
        if matches!(segments.last(), Some(Segment::Param { .. })) {
            expression.push_str("/?");
        }
        expression.push('$');
    }

    tracing::trace!(pattern = %raw, regex = %expression, "Compiled route pattern");

    Regex::new(&expression).map_err(|e| RouterError::MalformedPattern {
        pattern: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Per-request routing state.
///
/// `route` starts as the not-found sentinel; a path match with the wrong method leaves the
/// method-not-allowed sentinel in it.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub current_path: String,
    pub parameters: HashMap<String, String>,
}

impl RouteMatch {
    /// Start matching `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            route: not_found_route(),
            current_path: path.into(),
            parameters: HashMap::new(),
        }
    }

    /// A match already resolved to `route`, for direct dispatch.
    pub fn for_route(route: Arc<Route>) -> Self {
        Self {
            route,
            current_path: String::new(),
            parameters: HashMap::new(),
        }
    }

    /// Remove the leading `prefix` from the path left to match.
    pub fn trim_current_path(&mut self, prefix: &str) {
        let len = prefix.len().min(self.current_path.len());
        self.current_path.drain(..len);
    }

    pub(crate) fn merge_params(&mut self, params: Vec<(String, String)>) {
        self.parameters.extend(params);
    }

    pub fn is_not_found(&self) -> bool {
        Arc::ptr_eq(&self.route, &not_found_route())
    }

    pub fn is_method_not_allowed(&self) -> bool {
        Arc::ptr_eq(&self.route, &method_not_allowed_route())
    }
}

//! Placeholder substitution in string values.
//!
//! Strings may embed `{dotted.path}` tokens that refer to other values of
//! the same configuration, e.g. a footer using `{class.name}`, plus the
//! computed `{year}` token. Tokens that do not resolve are left verbatim so
//! typos show up in the rendered output. Substitution is a single pass:
//! replacement text is never scanned again.

use chrono::Datelike;
use regex_lite::{Captures, Regex};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Reserved token name for the current calendar year.
pub const YEAR_TOKEN: &str = "year";

/// `{` + one or more dot-separated segments + `}`.
///
/// Segments exclude braces, so in `{{a}}` the inner `{a}` is still a token.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}.\s]+(?:\.[^{}.\s]+)*)\}").expect("placeholder pattern is valid")
});

/// Resolves placeholder tokens against a context tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderResolver {
    year: i32,
}

impl PlaceholderResolver {
    /// Create a resolver that substitutes `{year}` with `year`.
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    /// Create a resolver for the current local calendar year.
    pub fn current() -> Self {
        Self::new(chrono::Local::now().year())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Resolve every string in `target`, looking paths up in `context`.
    ///
    /// Sequences keep their order and mappings keep their keys; non-string
    /// scalars are returned unchanged.
    pub fn resolve(&self, target: &Value, context: &Value) -> Value {
        match target {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, context))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.resolve(value, context)))
                    .collect(),
            ),
            Value::String(text) => Value::String(self.resolve_str(text, context).into_owned()),
            Value::Null | Value::Bool(_) | Value::Number(_) => target.clone(),
        }
    }

    /// Substitute the tokens of a single string.
    pub fn resolve_str<'t>(&self, text: &'t str, context: &Value) -> Cow<'t, str> {
        PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[1];
            if token == YEAR_TOKEN {
                return self.year.to_string();
            }
            lookup(context, token)
                .and_then(terminal_text)
                .unwrap_or_else(|| caps[0].to_string())
        })
    }
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::current()
    }
}

/// Resolve `target` against `context` using the current year.
pub fn resolve_placeholders(target: &Value, context: &Value) -> Value {
    PlaceholderResolver::current().resolve(target, context)
}

/// Follow a dotted path through mappings (by key) and sequences (by index).
pub fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    })
}

/// String form of a terminal value; mappings and sequences have none.
fn terminal_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

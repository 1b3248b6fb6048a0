//! Column specs and the fragment expansion language.
//!
//! A [`Column`] spec describes a selection set in a compact form: a name is emitted as-is, a map
//! nests a spec under a field name, and a list puts several specs on consecutive lines.
//! [`format_columns`] turns a spec into selection set text.
//!
//! [`parse_columns`] additionally expands fragment directives, one per line:
//!
//! ```text
//! +                 the `default` fragment
//! +user             the `user` fragment, wrapped in `user { ... }`
//! +user:author      the `user` fragment, wrapped in `author { ... }`
//! +=user            the `user` fragment, unwrapped
//! +base             the `base` fragment (never wrapped)
//! +User.default     the `default` fragment of the `User` resource class, unwrapped
//! ```
//!
//! Expansion is total: a fragment that can't be resolved is logged (and, for absolute references,
//! replaced by a comment), and the rest of the text is still expanded.

use crate::{registry::Registry, schema::QueryDepth};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};

/// Depth bound used when a fragment is rendered on demand.
pub const FRAGMENT_MAX_DEPTH: usize = 1;

/// A column spec.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Column {
    /// Text emitted verbatim at the current indentation.
    Name(String),
    /// Specs nested under field names.
    Map(IndexMap<String, Column>),
    /// Specs emitted on consecutive lines.
    List(Vec<Column>),
}

impl Column {
    /// The spec `{ name: column }`.
    pub fn nested(name: impl Into<String>, column: impl Into<Column>) -> Self {
        Self::Map([(name.into(), column.into())].into_iter().collect())
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<Column>> for Column {
    fn from(columns: Vec<Column>) -> Self {
        Self::List(columns)
    }
}

/// A named, reusable piece of a selection set.
#[derive(Clone)]
pub enum Fragment<'a> {
    Text(String),
    /// A fragment rendered on demand, at a depth chosen by the caller.
    Render(Arc<dyn Fn(QueryDepth) -> String + Send + Sync + 'a>),
}

impl<'a> Fragment<'a> {
    pub fn render(f: impl Fn(QueryDepth) -> String + Send + Sync + 'a) -> Self {
        Self::Render(Arc::new(f))
    }

    pub fn to_query_string(&self, depth: QueryDepth) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Render(render) => render(depth),
        }
    }
}

impl<'a> fmt::Debug for Fragment<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Render(_) => f.debug_tuple("Render").finish_non_exhaustive(),
        }
    }
}

impl<'a> From<String> for Fragment<'a> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&str> for Fragment<'a> {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

/// A fragment table, keyed by fragment name.
pub type Fragments<'a> = HashMap<String, Fragment<'a>>;

/// Render a column spec as selection set text, indenting two spaces per level.
///
/// Empty nested specs are dropped along with the field they are nested under.
pub fn format_columns(column: &Column, depth: usize) -> String {
    let padding = "  ".repeat(depth);
    match column {
        Column::Name(name) => format!("{padding}{name}"),
        Column::Map(fields) => fields
            .iter()
            .filter_map(|(name, nested)| {
                let nested = format_columns(nested, depth + 1);
                if nested.is_empty() {
                    None
                } else {
                    Some(format!("{padding}{name} {{\n{nested}\n{padding}}}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Column::List(columns) => columns
            .iter()
            .map(|column| format_columns(column, depth + 1))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\+(=)?\s*([A-Za-z0-9_.]*)(:([A-Za-z0-9_]*))?").expect("must be valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Directive<'l> {
    unwrapped: bool,
    name: &'l str,
    alias: Option<&'l str>,
}

impl<'l> Directive<'l> {
    fn parse(line: &'l str) -> Option<Self> {
        let captures = DIRECTIVE.captures(line)?;
        Some(Self {
            unwrapped: captures.get(1).is_some(),
            name: captures.get(2).map_or("", |m| m.as_str()),
            alias: captures
                .get(4)
                .map(|m| m.as_str())
                .filter(|alias| !alias.is_empty()),
        })
    }
}

/// Render a column spec, expanding fragment directives.
///
/// Local fragment names are resolved in `fragments`. Absolute references (`Class.fragment`) are
/// resolved through `registry`; without one they are never found.
pub fn parse_columns(
    columns: &Column,
    fragments: &Fragments,
    registry: Option<&Registry>,
) -> String {
    let text = format_columns(columns, 0);
    let mut output = vec![];
    for line in text.split(|c| c == '\r' || c == '\n') {
        let Some(directive) = Directive::parse(line) else {
            output.push(line.to_string());
            continue;
        };

        if directive.name.contains('.') {
            output.push(match registry {
                Some(registry) => expand_absolute_fragment(directive.name, registry),
                None => absolute_fragment_not_found(directive.name),
            });
            continue;
        }

        match fragments.get(directive.name) {
            Some(fragment) => {
                let expanded = fragment.to_query_string(QueryDepth::max(FRAGMENT_MAX_DEPTH));
                if directive.name == "base" || directive.unwrapped {
                    output.push(expanded);
                } else {
                    let block = directive.alias.unwrap_or(directive.name);
                    output.push(format!("{block} {{\n{expanded}\n}}"));
                }
            }
            None if directive.name.is_empty() => match fragments.get("default") {
                Some(fragment) => {
                    output.push(fragment.to_query_string(QueryDepth::max(FRAGMENT_MAX_DEPTH)))
                }
                None => tracing::warn!("no default fragment to expand"),
            },
            None => tracing::warn!("fragment: {} not found.", directive.name),
        }
    }
    output.join("\n")
}

/// Expand a reference `Class.fragment` to a fragment of a registered resource class.
///
/// If the class or the fragment does not exist, the result is a comment saying so.
pub fn expand_absolute_fragment(reference: &str, registry: &Registry) -> String {
    let mut parts = reference.split('.');
    let class_name = parts.next().unwrap_or_default();
    let fragment_name = parts.next().unwrap_or_default();
    registry
        .get(class_name)
        .and_then(|class| {
            class
                .fragments(registry.schema())
                .get(fragment_name)
                .map(|fragment| fragment.to_query_string(QueryDepth::max(FRAGMENT_MAX_DEPTH)))
        })
        .unwrap_or_else(|| absolute_fragment_not_found(reference))
}

fn absolute_fragment_not_found(reference: &str) -> String {
    tracing::warn!("absolute fragment {reference} not found");
    format!("# expand absolute fragment {reference} not found")
}

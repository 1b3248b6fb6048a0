//! Sending GraphQL operations to a server.
//!
//! Everything in this crate that talks to a server goes through the [`Transport`] trait. The
//! [`HttpTransport`] implementation posts operations to a GraphQL endpoint over HTTP; tests use
//! the in-memory [`mock::MockTransport`].

use anyhow::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use derive_more::Display;
use strum::EnumString;

mod client;
pub mod mock;

pub use client::{HttpTransport, Options};

/// A GraphQL transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a query.
    async fn query(
        &self,
        document: &str,
        variables: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Result<Response, Error>;

    /// Run a mutation.
    async fn mutate(&self, document: &str, variables: &Map<String, Value>)
        -> Result<Response, Error>;
}

/// How a query may be answered from a client-side cache.
///
/// Transports without a cache always go to the network, whatever the policy.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Deserialize,
    Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    CacheFirst,
    CacheAndNetwork,
    #[default]
    NetworkOnly,
    CacheOnly,
    NoCache,
}

/// Per-query transport options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub fetch_policy: FetchPolicy,
}

impl From<FetchPolicy> for QueryOptions {
    fn from(fetch_policy: FetchPolicy) -> Self {
        Self { fetch_policy }
    }
}

/// The response to a GraphQL operation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Response {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl Response {
    /// A successful response.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: vec![],
        }
    }

    /// A response reporting errors.
    pub fn errors(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        Self {
            data: None,
            errors: errors.into_iter().collect(),
        }
    }

    /// The response data.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphqlErrors`] if the server reported any errors, even if it also returned
    /// partial data.
    pub fn into_result(self) -> Result<Value, Error> {
        if !self.errors.is_empty() {
            return Err(GraphqlErrors(self.errors).into());
        }
        match self.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(Error::msg("GraphQL response has no data")),
        }
    }
}

/// A location within a GraphQL document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// An error reported by a GraphQL server.
#[derive(Clone, Debug, Display, PartialEq, Deserialize, Serialize)]
#[display(fmt = "{}{}", message, "location_suffix(locations)")]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
            extensions: None,
        }
    }
}

fn location_suffix(locations: &[Location]) -> String {
    match locations.first() {
        Some(Location { line, column }) => format!(" (at {line}:{column})"),
        None => String::new(),
    }
}

/// Errors reported by a GraphQL server, as an error value.
#[derive(Clone, Debug, Display, PartialEq)]
#[display(fmt = "GraphQL error: {}", "join_errors(_0)")]
pub struct GraphqlErrors(pub Vec<GraphqlError>);

fn join_errors(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl std::error::Error for GraphqlErrors {}

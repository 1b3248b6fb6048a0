//! A GraphQL-over-HTTP transport.

use super::{QueryOptions, Response, Transport};
use anyhow::Error;
use async_trait::async_trait;
use clap::Args;
use serde_json::{json, Map, Value};
use surf::Url;

/// Options for connecting to a GraphQL server.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// URL of the GraphQL endpoint.
    #[clap(
        long,
        env = "GQL_RESOURCE_ENDPOINT",
        default_value = "http://localhost:3000/graphql"
    )]
    pub endpoint: Url,
}

impl Options {
    /// Connect to the server.
    pub fn connect(&self) -> HttpTransport {
        HttpTransport::new(self.endpoint.clone())
    }
}

/// A transport which posts operations to a GraphQL endpoint.
///
/// There is no client-side cache, so every operation goes to the network regardless of its fetch
/// policy.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: surf::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: surf::Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, document: &str, variables: &Map<String, Value>) -> Result<Response, Error> {
        tracing::debug!("GraphQL document:\n{document}");
        let body = json!({
            "query": document,
            "variables": variables,
        });
        self.client
            .post(&self.endpoint)
            .body_json(&body)
            .map_err(Error::msg)?
            .recv_json()
            .await
            .map_err(Error::msg)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(
        &self,
        document: &str,
        variables: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Result<Response, Error> {
        tracing::info!(
            endpoint = %self.endpoint,
            fetch_policy = %options.fetch_policy,
            ?variables,
            "GraphQL query"
        );
        self.post(document, variables).await
    }

    async fn mutate(
        &self,
        document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Response, Error> {
        tracing::info!(endpoint = %self.endpoint, ?variables, "GraphQL mutation");
        self.post(document, variables).await
    }
}

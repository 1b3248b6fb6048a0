//! An in-memory transport for tests.
#![cfg(any(test, feature = "testing"))]

use super::{GraphqlError, QueryOptions, Response, Transport};
use anyhow::Error;
use async_std::channel::Receiver;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

/// An operation received by a [`MockTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub document: String,
    pub variables: Map<String, Value>,
    /// Query options, or [`None`] for a mutation.
    pub options: Option<QueryOptions>,
}

/// A transport which records every operation and replays canned responses in order.
///
/// An operation arriving when no responses are left fails.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Response, String>>>,
    requests: Mutex<Vec<Request>>,
    gate: Option<Receiver<()>>,
}

impl MockTransport {
    /// Queue a successful response with `data`.
    pub fn respond(self, data: Value) -> Self {
        self.respond_with(Response::data(data))
    }

    /// Queue a response reporting a GraphQL error.
    pub fn respond_error(self, message: &str) -> Self {
        self.respond_with(Response::errors([GraphqlError::new(message)]))
    }

    /// Queue an arbitrary response.
    pub fn respond_with(self, response: Response) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Hold every operation until a message (or disconnection) is received on `gate`.
    ///
    /// Operations are recorded before they are held.
    pub fn gated(mut self, gate: Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// The operations received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, response: Result<Response, String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    async fn handle(&self, request: Request) -> Result<Response, Error> {
        tracing::debug!(?request, "mock GraphQL request");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if let Some(gate) = &self.gate {
            // A closed gate lets everything through.
            gate.recv().await.ok();
        }
        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match response {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::msg(message)),
            None => Err(Error::msg("no response queued")),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn query(
        &self,
        document: &str,
        variables: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Result<Response, Error> {
        self.handle(Request {
            document: document.into(),
            variables: variables.clone(),
            options: Some(*options),
        })
        .await
    }

    async fn mutate(
        &self,
        document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Response, Error> {
        self.handle(Request {
            document: document.into(),
            variables: variables.clone(),
            options: None,
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[async_std::test]
    async fn test_replay() {
        let transport = MockTransport::default()
            .respond(json!({ "a": 1 }))
            .fail("offline")
            .respond_error("bad");
        let vars = json!({ "x": 1 }).as_object().unwrap().clone();

        let res = transport
            .query("query { a }", &vars, &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(res.into_result().unwrap(), json!({ "a": 1 }));
        assert_eq!(
            transport
                .mutate("mutation { b }", &Map::new())
                .await
                .unwrap_err()
                .to_string(),
            "offline"
        );
        transport
            .query("query { c }", &Map::new(), &QueryOptions::default())
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        transport
            .query("query { d }", &Map::new(), &QueryOptions::default())
            .await
            .unwrap_err();

        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].document, "query { a }");
        assert_eq!(requests[0].variables, vars);
        assert_eq!(requests[0].options, Some(QueryOptions::default()));
        assert_eq!(requests[1].options, None);
    }

    #[async_std::test]
    async fn test_gate() {
        let (open, gate) = async_std::channel::unbounded();
        let transport = MockTransport::default()
            .respond(json!({ "a": 1 }))
            .gated(gate);
        open.send(()).await.unwrap();
        transport
            .query("query { a }", &Map::new(), &QueryOptions::default())
            .await
            .unwrap();
    }
}

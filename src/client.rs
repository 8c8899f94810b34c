//! The Graph API client seam.
//!
//! [`MetricsAdapter`](crate::MetricsAdapter) never talks to the network itself. It
//! builds [`GraphRequest`]s and hands them to whatever implements [`GraphClient`],
//! then reads the returned [`GraphResponse`]s.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Query parameters of a single Graph request.
pub type Params = BTreeMap<String, String>;

/// Timestamp layout used by the Graph API for `created_time` and friends.
pub const GRAPH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub method: String,
    pub endpoint: String,
    pub params: Params,
}

impl GraphRequest {
    pub fn get(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            method: "GET".to_string(),
            endpoint: endpoint.into(),
            params,
        }
    }
}

/// A decoded response. `body` is `None` when the transport had nothing to decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphResponse {
    body: Option<Value>,
}

impl GraphResponse {
    pub fn new(body: Value) -> Self {
        Self { body: Some(body) }
    }

    pub fn empty() -> Self {
        Self { body: None }
    }

    /// The body as a JSON object, or `None` when it is missing, null, empty or not an object.
    pub fn decoded_body(&self) -> Option<&Map<String, Value>> {
        match &self.body {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }

    /// Reads the body as a paginated edge: a `data` array of nodes plus optional `paging.next`.
    pub fn graph_edge(&self) -> Option<GraphEdge> {
        GraphEdge::from_body(self.decoded_body()?)
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    nodes: Vec<GraphNode>,
    next_page: Option<String>,
}

impl GraphEdge {
    pub fn new(nodes: Vec<GraphNode>, next_page: Option<String>) -> Self {
        Self { nodes, next_page }
    }

    pub fn from_body(body: &Map<String, Value>) -> Option<Self> {
        let nodes = body
            .get("data")?
            .as_array()?
            .iter()
            .filter_map(|item| item.as_object().cloned().map(GraphNode::new))
            .collect();

        let next_page = body
            .get("paging")
            .and_then(|paging| paging.get("next"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self::new(nodes, next_page))
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Absolute URL of the following page, if the API announced one.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }
}

impl<'a> IntoIterator for &'a GraphEdge {
    type Item = &'a GraphNode;
    type IntoIter = std::slice::Iter<'a, GraphNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    fields: Map<String, Value>,
}

impl GraphNode {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Parses a Graph timestamp field such as `created_time`.
    pub fn time_field(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        let raw = self.str_field(name)?;
        DateTime::parse_from_str(raw, GRAPH_TIME_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }
}

/// The capabilities the adapter needs from a Graph API client.
///
/// Authentication, transport, pagination cursors and batching all live behind
/// this trait. Swap implementations by choosing a different type parameter for
/// [`MetricsAdapter`](crate::MetricsAdapter).
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn send_request(&self, method: &str, endpoint: &str, params: Params) -> Result<GraphResponse>;

    /// Sends several requests at once. Responses come back tagged with the caller's keys.
    async fn send_batch_request(
        &self,
        requests: BTreeMap<String, GraphRequest>,
    ) -> Result<Vec<(String, GraphResponse)>>;

    /// Fetches an edge directly from a path that already carries its query string.
    async fn get(&self, path_with_query: &str) -> Result<GraphResponse>;

    /// Advances a paginated edge. `Ok(None)` means there are no more pages.
    async fn next(&self, edge: &GraphEdge) -> Result<Option<GraphEdge>>;

    fn set_default_access_token(&mut self, token: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decoded_body_rejects_empty_and_non_objects() {
        assert!(GraphResponse::empty().decoded_body().is_none());
        assert!(GraphResponse::new(json!({})).decoded_body().is_none());
        assert!(GraphResponse::new(json!([1, 2])).decoded_body().is_none());
        assert!(GraphResponse::new(Value::Null).decoded_body().is_none());
        assert!(GraphResponse::new(json!({"id": "1"})).decoded_body().is_some());
    }

    #[test]
    fn test_graph_edge_reads_nodes_and_paging() {
        let response = GraphResponse::new(json!({
            "data": [
                {"id": "1_2", "created_time": "2017-04-20T17:50:27+0000"},
                "not a node",
            ],
            "paging": {"next": "https://graph.facebook.com/v2.9/1/posts?after=abc"}
        }));

        let edge = response.graph_edge().unwrap();
        assert_eq!(edge.nodes().len(), 1);
        assert_eq!(edge.next_page(), Some("https://graph.facebook.com/v2.9/1/posts?after=abc"));

        let node = &edge.nodes()[0];
        assert_eq!(node.str_field("id"), Some("1_2"));
        let created = node.time_field("created_time").unwrap();
        assert_eq!(created.format(GRAPH_TIME_FORMAT).to_string(), "2017-04-20T17:50:27+0000");
    }

    #[test]
    fn test_graph_edge_missing_data() {
        let response = GraphResponse::new(json!({"error": {"message": "nope"}}));
        assert!(response.graph_edge().is_none());
    }

    #[test]
    fn test_time_field_accepts_rfc3339() {
        let node = GraphNode::new(
            json!({"created_time": "2017-04-19T18:23:52+00:00"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert!(node.time_field("created_time").is_some());
        assert!(node.time_field("missing").is_none());
    }
}

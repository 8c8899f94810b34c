//! Page and post analytics on top of a [`GraphClient`].
//!
//! Every retrieval function issues one request (or one batch request, or one
//! paginated walk) and flattens the nested Graph JSON into a plain map. Errors
//! from the client and unexpected response shapes never reach the caller: they
//! collapse into an empty map or a missing key.

use crate::client::{GRAPH_TIME_FORMAT, GraphClient, GraphRequest, GraphResponse, Params};
use crate::clock::{Clock, SystemClock, unix_now, unix_yesterday};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metric name -> end time -> value.
pub type PageInsights = BTreeMap<String, BTreeMap<String, Value>>;
/// Metric name -> lifetime value.
pub type PostInsights = BTreeMap<String, Value>;
/// Metric name (comments, reactions, likes, shares) -> count.
pub type PostCounts = BTreeMap<String, u64>;
/// Post id -> ISO-8601 creation time.
pub type PostIndex = BTreeMap<String, String>;

pub const DEFAULT_POSTS_LIMIT: u32 = 100;

const INSIGHTS_PERIODS: [&str; 2] = ["day", "lifetime"];

pub struct MetricsAdapter<C> {
    client: C,
    clock: Box<dyn Clock>,
}

impl<C: GraphClient> MetricsAdapter<C> {
    pub fn new(client: C) -> Self {
        Self::with_clock(client, SystemClock)
    }

    pub fn with_clock(client: C, clock: impl Clock + 'static) -> Self {
        Self {
            client,
            clock: Box::new(clock),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    /// Sets the client's default access token. Returns `false` for a missing or
    /// empty token (the client is not touched) and when the client rejects it.
    pub fn set_access_token(&mut self, token: Option<&str>) -> bool {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return false;
        };

        match self.client.set_default_access_token(token) {
            Ok(()) => true,
            Err(e) => {
                warn!("access token rejected: {e:#}");
                false
            }
        }
    }

    /// Daily and lifetime insights for a page.
    ///
    /// `until` defaults to now. The caller's range replaces it only when both
    /// `since` and `until` are given; a lone bound is ignored.
    pub async fn get_page_insights_metrics_data(
        &self,
        page_id: &str,
        metric_names: &[&str],
        since: Option<i64>,
        until: Option<i64>,
    ) -> PageInsights {
        let mut params = Params::new();
        params.insert("metric".to_string(), metric_names.join(","));
        params.insert("until".to_string(), unix_now(self.clock.as_ref()).to_string());
        if let (Some(since), Some(until)) = (since, until) {
            params.insert("since".to_string(), since.to_string());
            params.insert("until".to_string(), until.to_string());
        }

        let endpoint = format!("/{page_id}/insights");
        self.send_get(&endpoint, params)
            .await
            .as_ref()
            .and_then(GraphResponse::decoded_body)
            .map(extract_page_insights)
            .unwrap_or_default()
    }

    /// Summary counts (comments, reactions, likes, shares) of one page post.
    pub async fn get_page_post_graph_metrics_data(
        &self,
        page_id: &str,
        post_id: &str,
        metric_names: &[&str],
    ) -> PostCounts {
        let endpoint = format!("/{page_id}_{post_id}");
        self.send_get(&endpoint, summary_fields_params(metric_names))
            .await
            .map(|response| extract_post_counts(&response, metric_names))
            .unwrap_or_default()
    }

    /// Summary counts for many posts in one batch, keyed by post id.
    pub async fn get_page_batch_posts_graph_metrics_data(
        &self,
        post_ids: &[&str],
        metric_names: &[&str],
    ) -> BTreeMap<String, PostCounts> {
        let params = summary_fields_params(metric_names);
        let requests = post_ids
            .iter()
            .map(|id| (id.to_string(), GraphRequest::get(format!("/{id}"), params.clone())))
            .collect();

        self.send_batch(requests)
            .await
            .into_iter()
            .map(|(key, response)| (key, extract_post_counts(&response, metric_names)))
            .collect()
    }

    /// Lifetime insights of one page post.
    pub async fn get_page_post_insights_metric_data(
        &self,
        page_id: &str,
        post_id: &str,
        metric_names: &[&str],
    ) -> PostInsights {
        let endpoint = format!("/{page_id}_{post_id}/insights");
        self.send_get(&endpoint, self.lifetime_insights_params(metric_names))
            .await
            .map(|response| extract_post_insights(&response))
            .unwrap_or_default()
    }

    /// Lifetime insights for many posts in one batch, keyed by post id.
    pub async fn get_page_batch_posts_insights_metric_data(
        &self,
        post_ids: &[&str],
        metric_names: &[&str],
    ) -> BTreeMap<String, PostInsights> {
        let params = self.lifetime_insights_params(metric_names);
        let requests = post_ids
            .iter()
            .map(|id| (id.to_string(), GraphRequest::get(format!("/{id}/insights"), params.clone())))
            .collect();

        self.send_batch(requests)
            .await
            .into_iter()
            .map(|(key, response)| (key, extract_post_insights(&response)))
            .collect()
    }

    /// Every post published on the page between `since` (default: yesterday)
    /// and `until` (default: now), following pagination to the end.
    pub async fn get_page_posts(
        &self,
        page_id: &str,
        since: Option<i64>,
        until: Option<i64>,
        limit: u32,
    ) -> PostIndex {
        let since = since.unwrap_or_else(|| unix_yesterday(self.clock.as_ref()));
        let until = until.unwrap_or_else(|| unix_now(self.clock.as_ref()));
        let path = format!("/{page_id}/posts?since={since}&until={until}&limit={limit}");

        let mut posts = PostIndex::new();
        let mut edge = match self.client.get(&path).await {
            Ok(response) => response.graph_edge(),
            Err(e) => {
                warn!("GET {path} failed: {e:#}");
                None
            }
        };

        while let Some(current) = edge {
            for post in &current {
                match (post.str_field("id"), post.time_field("created_time")) {
                    (Some(id), Some(created)) => {
                        posts.insert(id.to_string(), created.format(GRAPH_TIME_FORMAT).to_string());
                    }
                    _ => debug!("skipping post without id or created_time on page {page_id}"),
                }
            }

            edge = match self.client.next(&current).await {
                Ok(next) => next,
                Err(e) => {
                    warn!("pagination of {path} stopped: {e:#}");
                    None
                }
            };
        }

        posts
    }

    fn lifetime_insights_params(&self, metric_names: &[&str]) -> Params {
        let mut params = Params::new();
        params.insert("metric".to_string(), metric_names.join(","));
        params.insert("period".to_string(), "lifetime".to_string());
        params.insert("until".to_string(), unix_now(self.clock.as_ref()).to_string());
        params
    }

    async fn send_get(&self, endpoint: &str, params: Params) -> Option<GraphResponse> {
        match self.client.send_request("GET", endpoint, params).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("GET {endpoint} failed: {e:#}");
                None
            }
        }
    }

    async fn send_batch(&self, requests: BTreeMap<String, GraphRequest>) -> Vec<(String, GraphResponse)> {
        if requests.is_empty() {
            return Vec::new();
        }

        match self.client.send_batch_request(requests).await {
            Ok(responses) => responses,
            Err(e) => {
                warn!("batch request failed: {e:#}");
                Vec::new()
            }
        }
    }
}

fn summary_fields_params(metric_names: &[&str]) -> Params {
    let fields = metric_names
        .iter()
        .map(|metric| format!("{metric}.summary(true)"))
        .collect::<Vec<_>>()
        .join(",");

    let mut params = Params::new();
    params.insert("fields".to_string(), fields);
    params
}

fn extract_page_insights(body: &Map<String, Value>) -> PageInsights {
    let mut result = PageInsights::new();
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        debug!("insights response has no data array");
        return result;
    };

    for metric in data {
        let Some(name) = metric.get("name").and_then(Value::as_str) else {
            continue;
        };
        let period = metric.get("period").and_then(Value::as_str).unwrap_or_default();
        if !INSIGHTS_PERIODS.contains(&period) {
            continue;
        }

        let series = metric
            .get("values")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|point| {
                let end_time = point.get("end_time")?.as_str()?;
                let value = point.get("value").filter(|v| !v.is_null())?;
                Some((end_time.to_string(), value.clone()))
            })
            .collect();
        result.insert(name.to_string(), series);
    }

    result
}

fn extract_post_counts(response: &GraphResponse, metric_names: &[&str]) -> PostCounts {
    let mut counts = PostCounts::new();
    let Some(body) = response.decoded_body() else {
        return counts;
    };

    for &metric in metric_names {
        if metric == "shares" {
            let shares = body
                .get("shares")
                .and_then(|shares| shares.get("count"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            counts.insert(metric.to_string(), shares);
        } else if let Some(total) = body
            .get(metric)
            .and_then(|m| m.pointer("/summary/total_count"))
            .and_then(Value::as_u64)
        {
            counts.insert(metric.to_string(), total);
        }
    }

    counts
}

fn extract_post_insights(response: &GraphResponse) -> PostInsights {
    let mut result = PostInsights::new();
    let Some(data) = response
        .decoded_body()
        .and_then(|body| body.get("data"))
        .and_then(Value::as_array)
    else {
        return result;
    };

    // lifetime period: a single value per metric
    for metric in data {
        let name = metric.get("name").and_then(Value::as_str);
        let value = metric.pointer("/values/0/value").filter(|v| !v.is_null());
        if let (Some(name), Some(value)) = (name, value) {
            result.insert(name.to_string(), value.clone());
        }
    }

    result
}

//! Normalized page and post analytics from the Facebook Graph API.
//!
//! [`MetricsAdapter`] turns insights, engagement summaries and post listings
//! into flat maps keyed by metric name or post id. Network access goes through
//! an injected [`GraphClient`]; [`HttpGraphClient`] is the stock implementation.

pub mod adapter;
pub mod client;
pub mod clock;
pub mod config;
pub mod http;
pub mod report;

pub use adapter::{DEFAULT_POSTS_LIMIT, MetricsAdapter, PageInsights, PostCounts, PostIndex, PostInsights};
pub use client::{GraphClient, GraphEdge, GraphNode, GraphRequest, GraphResponse, Params};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use http::HttpGraphClient;
pub use report::{
    write_page_insights_to_csv, write_post_counts_to_csv, write_post_insights_to_csv, write_posts_to_csv,
};

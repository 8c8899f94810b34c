// Example usage of the facebook_metrics library
// This needs FACEBOOK_APP_ID, FACEBOOK_APP_SECRET and a page token in
// FACEBOOK_ACCESS_TOKEN, plus network access to the Graph API

use anyhow::{Result, bail};
use facebook_metrics::*;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let page_id = env::args().nth(1).unwrap_or_else(|| "me".to_string());
    let client = HttpGraphClient::new(Config::from_env()?)?;
    let mut adapter = MetricsAdapter::new(client);

    if !adapter.set_access_token(env::var("FACEBOOK_ACCESS_TOKEN").ok().as_deref()) {
        bail!("FACEBOOK_ACCESS_TOKEN is missing or invalid");
    }

    // Example 1: Daily page insights for the default range
    let insights = adapter
        .get_page_insights_metrics_data(&page_id, &["page_views_total", "page_fans"], None, None)
        .await;
    for (metric, series) in &insights {
        println!("{metric}: {} points", series.len());
    }

    // Example 2: Posts published since yesterday
    let posts = adapter.get_page_posts(&page_id, None, None, DEFAULT_POSTS_LIMIT).await;
    println!("Found {} posts", posts.len());

    // Example 3: Engagement and lifetime insights for those posts
    let post_ids: Vec<&str> = posts.keys().map(String::as_str).collect();
    let counts = adapter
        .get_page_batch_posts_graph_metrics_data(&post_ids, &["comments", "reactions", "shares"])
        .await;
    let post_insights = adapter
        .get_page_batch_posts_insights_metric_data(&post_ids, &["post_impressions", "post_fan_reach"])
        .await;

    // Example 4: Write results to CSV
    write_posts_to_csv(&posts, "example_posts.csv")?;
    write_post_counts_to_csv(&counts, "example_post_counts.csv")?;
    write_post_insights_to_csv(&post_insights, "example_post_insights.csv")?;
    println!("Results written to example_*.csv");

    Ok(())
}

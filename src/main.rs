use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use facebook_metrics::{
    Config, config, DEFAULT_POSTS_LIMIT, HttpGraphClient, MetricsAdapter, write_page_insights_to_csv,
    write_post_counts_to_csv, write_post_insights_to_csv, write_posts_to_csv,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    #[arg(short, long)]
    output: String,

    /// Page or user access token
    #[arg(short, long, env = "FACEBOOK_ACCESS_TOKEN")]
    token: Option<String>,

    #[arg(long, env = config::APP_ID_VAR)]
    app_id: String,

    #[arg(long, env = config::APP_SECRET_VAR, hide_env_values = true)]
    app_secret: String,

    /// Graph API version [default: v2.9]
    #[arg(long, env = config::GRAPH_VERSION_VAR)]
    graph_version: Option<String>,

    /// Graph API base URL [default: https://graph.facebook.com]
    #[arg(long, env = config::GRAPH_URL_VAR)]
    graph_url: Option<String>,
}

#[derive(Subcommand)]
enum Mode {
    /// Daily and lifetime insights of a page
    PageInsights {
        #[arg(short, long)]
        page: String,
        #[arg(short, long, value_delimiter = ',', required = true)]
        metrics: Vec<String>,
        #[arg(long)]
        since: Option<i64>,
        #[arg(long)]
        until: Option<i64>,
    },
    /// Comment, reaction, like and share counts of posts
    PostMetrics {
        #[arg(long, value_delimiter = ',', required = true)]
        posts: Vec<String>,
        #[arg(short, long, value_delimiter = ',', default_value = "comments,reactions,likes,shares")]
        metrics: Vec<String>,
    },
    /// Lifetime insights of posts
    PostInsights {
        #[arg(long, value_delimiter = ',', required = true)]
        posts: Vec<String>,
        #[arg(short, long, value_delimiter = ',', required = true)]
        metrics: Vec<String>,
    },
    /// Posts published on a page within a time range
    Posts {
        #[arg(short, long)]
        page: String,
        #[arg(long)]
        since: Option<i64>,
        #[arg(long)]
        until: Option<i64>,
        #[arg(short, long, default_value_t = DEFAULT_POSTS_LIMIT)]
        limit: u32,
    },
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !Path::new("output").exists() {
        std::fs::create_dir("output")?;
    }

    let config = Config::from_parts(cli.app_id, cli.app_secret, cli.graph_version, cli.graph_url);
    let mut adapter = MetricsAdapter::new(HttpGraphClient::new(config)?);
    if cli.token.is_some() && !adapter.set_access_token(cli.token.as_deref()) {
        bail!("The access token was rejected");
    }

    let output_path = format!("output/{}", cli.output);
    let written = match cli.mode {
        Mode::PageInsights { page, metrics, since, until } => {
            let pb = spinner(&format!("Fetching insights for page {page}"))?;
            let insights = adapter
                .get_page_insights_metrics_data(&page, &as_strs(&metrics), since, until)
                .await;
            pb.finish_and_clear();
            println!("{} metrics returned", insights.len());

            write_page_insights_to_csv(&insights, &output_path)?;
            !insights.is_empty()
        }
        Mode::PostMetrics { posts, metrics } => {
            let pb = spinner(&format!("Fetching engagement for {} posts", posts.len()))?;
            let counts = adapter
                .get_page_batch_posts_graph_metrics_data(&as_strs(&posts), &as_strs(&metrics))
                .await;
            pb.finish_and_clear();
            println!("{} posts returned", counts.len());

            write_post_counts_to_csv(&counts, &output_path)?;
            counts.values().any(|c| !c.is_empty())
        }
        Mode::PostInsights { posts, metrics } => {
            let pb = spinner(&format!("Fetching insights for {} posts", posts.len()))?;
            let insights = adapter
                .get_page_batch_posts_insights_metric_data(&as_strs(&posts), &as_strs(&metrics))
                .await;
            pb.finish_and_clear();
            println!("{} posts returned", insights.len());

            write_post_insights_to_csv(&insights, &output_path)?;
            insights.values().any(|i| !i.is_empty())
        }
        Mode::Posts { page, since, until, limit } => {
            let pb = spinner(&format!("Listing posts of page {page}"))?;
            let posts = adapter.get_page_posts(&page, since, until, limit).await;
            pb.finish_and_clear();
            println!("{} posts found", posts.len());

            write_posts_to_csv(&posts, &output_path)?;
            !posts.is_empty()
        }
    };

    if written {
        println!("You can see the output in: {}", output_path);
    } else {
        println!("Sorry, no data was returned");
    }

    Ok(())
}

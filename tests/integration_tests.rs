use anyhow::Result;
use facebook_metrics::*;
use mockito::Matcher;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_facebook_metrics"));
    command
        .env_remove("FACEBOOK_ACCESS_TOKEN")
        .env_remove("FACEBOOK_GRAPH_VERSION")
        .env_remove("FACEBOOK_GRAPH_URL");
    command
}

#[test]
fn test_cli_help_command() {
    let output = cli().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("page-insights"));
    assert!(stdout.contains("post-metrics"));
    assert!(stdout.contains("post-insights"));
    assert!(stdout.contains("posts"));
}

#[test]
fn test_cli_version_command() {
    let output = cli().arg("--version").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("facebook_metrics"));
}

#[test]
fn test_cli_invalid_command() {
    let output = cli().arg("invalid").output().expect("Failed to execute command");
    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_output_flag() {
    let output = cli()
        .args(["--app-id", "1", "--app-secret", "2", "posts", "--page", "42"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("output") || stderr.contains("required"));
}

#[test]
fn test_cli_missing_credentials() {
    let output = cli()
        .env_remove("FACEBOOK_APP_ID")
        .env_remove("FACEBOOK_APP_SECRET")
        .args(["--output", "posts.csv", "posts", "--page", "42"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--app-id") || stderr.contains("required"));
}

#[test]
fn test_cli_posts_against_mock_graph() -> Result<()> {
    let mut server = mockito::Server::new();
    let first_page = format!(
        r#"{{"data":[{{"id":"42_1","created_time":"2017-04-20T17:50:27+0000"}}],"paging":{{"next":"{}/v2.9/42/posts?after=abc"}}}}"#,
        server.url()
    );
    let _first = server
        .mock("GET", "/v2.9/42/posts")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("since".into(), "1493826552".into()),
            Matcher::UrlEncoded("until".into(), "1496418552".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("access_token".into(), "page_token".into()),
        ]))
        .with_status(200)
        .with_body(first_page)
        .create();
    let _second = server
        .mock("GET", "/v2.9/42/posts")
        .match_query(Matcher::UrlEncoded("after".into(), "abc".into()))
        .with_status(200)
        .with_body(r#"{"data":[{"id":"42_2","created_time":"2017-04-22T18:21:23+0000"}]}"#)
        .create();

    let graph_url = server.url();
    let temp_dir = TempDir::new()?;
    let output = cli()
        .args([
            "--output", "posts.csv",
            "--token", "page_token",
            "--app-id", "1",
            "--app-secret", "2",
            "--graph-url", graph_url.as_str(),
            "posts",
            "--page", "42",
            "--since", "1493826552",
            "--until", "1496418552",
        ])
        .current_dir(&temp_dir)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("2 posts found"));

    let content = fs::read_to_string(temp_dir.path().join("output/posts.csv"))?;
    assert!(content.starts_with("id,created_time"));
    assert!(content.contains("42_1,2017-04-20T17:50:27+0000"));
    assert!(content.contains("42_2,2017-04-22T18:21:23+0000"));

    Ok(())
}

// The adapter driving the HTTP client against a mocked Graph API
mod adapter_with_mock_graph {
    use super::*;

    fn adapter_for(server: &mockito::Server) -> MetricsAdapter<HttpGraphClient> {
        let config = Config::new("123", "secret").with_base_url(server.url());
        let mut adapter = MetricsAdapter::new(HttpGraphClient::new(config).unwrap());
        assert!(adapter.set_access_token(Some("page_token")));
        adapter
    }

    #[tokio::test]
    async fn test_page_insights_workflow() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2.9/2222222/insights")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("metric".into(), "page_views_total,page_fan_adds".into()),
                Matcher::UrlEncoded("since".into(), "1493826552".into()),
                Matcher::UrlEncoded("until".into(), "1496418552".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":[
                    {"name":"page_views_total","period":"day","values":[
                        {"value":123,"end_time":"2017-04-27T07:00:00+0000"},
                        {"value":222,"end_time":"2017-04-28T07:00:00+0000"},
                        {"value":111,"end_time":"2017-04-29T07:00:00+0000"}]},
                    {"name":"page_fan_adds","period":"week","values":[
                        {"value":444,"end_time":"2017-04-27T07:00:00+0000"}]}
                ]}"#,
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let insights = adapter
            .get_page_insights_metrics_data(
                "2222222",
                &["page_views_total", "page_fan_adds"],
                Some(1_493_826_552),
                Some(1_496_418_552),
            )
            .await;

        assert_eq!(insights.len(), 1);
        assert_eq!(insights["page_views_total"].len(), 3);
        assert!(!insights.contains_key("page_fan_adds"));
    }

    #[tokio::test]
    async fn test_graph_error_collapses_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2.9/2222222_11111")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"message":"Unsupported get request.","type":"GraphMethodException","code":100}}"#)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let counts = adapter
            .get_page_post_graph_metrics_data("2222222", "11111", &["comments", "shares"])
            .await;
        assert!(counts.is_empty());
    }

    #[tokio::test]
    async fn test_post_graph_metrics_workflow() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2.9/2222222_11111")
            .match_query(Matcher::UrlEncoded(
                "fields".into(),
                "comments.summary(true),likes.summary(true),shares.summary(true)".into(),
            ))
            .with_status(200)
            .with_body(r#"{"comments":{"data":[],"summary":{"total_count":12}},"id":"2222222_11111"}"#)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let counts = adapter
            .get_page_post_graph_metrics_data("2222222", "11111", &["comments", "likes", "shares"])
            .await;

        assert_eq!(counts.len(), 2);
        assert_eq!(counts["comments"], 12);
        assert_eq!(counts["shares"], 0);
    }

    #[tokio::test]
    async fn test_batch_post_insights_workflow() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/v2.9/1_1/insights")
            .match_query(Matcher::UrlEncoded("period".into(), "lifetime".into()))
            .with_status(200)
            .with_body(r#"{"data":[{"name":"post_impressions","period":"lifetime","values":[{"value":5}]}]}"#)
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/v2.9/2_2/insights")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let insights = adapter
            .get_page_batch_posts_insights_metric_data(&["1_1", "2_2"], &["post_impressions"])
            .await;

        assert_eq!(insights["1_1"]["post_impressions"], 5);
        assert!(insights["2_2"].is_empty());
    }
}

// Error handling tests
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_csv_writing_with_empty_data() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("insights.csv");

        write_page_insights_to_csv(&PageInsights::new(), path.to_str().unwrap())?;
        assert!(!path.exists());

        Ok(())
    }

    #[test]
    fn test_empty_response_shapes() {
        assert!(GraphResponse::empty().decoded_body().is_none());
        assert!(GraphResponse::empty().graph_edge().is_none());
        assert!(GraphResponse::new(serde_json::json!({"data": "nope"})).graph_edge().is_none());
    }
}

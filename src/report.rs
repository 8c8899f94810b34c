use crate::adapter::{PageInsights, PostCounts, PostIndex, PostInsights};
use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;

#[derive(Debug, Serialize)]
struct InsightRow<'a> {
    metric: &'a str,
    end_time: &'a str,
    value: String,
}

#[derive(Debug, Serialize)]
struct PostCountRow<'a> {
    post_id: &'a str,
    metric: &'a str,
    count: u64,
}

#[derive(Debug, Serialize)]
struct PostInsightRow<'a> {
    post_id: &'a str,
    metric: &'a str,
    value: String,
}

#[derive(Debug, Serialize)]
struct PostRow<'a> {
    id: &'a str,
    created_time: &'a str,
}

/// Writes `metric,end_time,value` rows. Nothing is written for empty input.
pub fn write_page_insights_to_csv(insights: &PageInsights, filename: &str) -> Result<()> {
    let rows = insights.iter().flat_map(|(metric, series)| {
        series.iter().map(move |(end_time, value)| InsightRow {
            metric,
            end_time,
            value: cell(value),
        })
    });
    write_rows(rows, filename)
}

/// Writes `post_id,metric,count` rows.
pub fn write_post_counts_to_csv(counts: &BTreeMap<String, PostCounts>, filename: &str) -> Result<()> {
    let rows = counts.iter().flat_map(|(post_id, metrics)| {
        metrics.iter().map(move |(metric, count)| PostCountRow {
            post_id,
            metric,
            count: *count,
        })
    });
    write_rows(rows, filename)
}

/// Writes `post_id,metric,value` rows.
pub fn write_post_insights_to_csv(insights: &BTreeMap<String, PostInsights>, filename: &str) -> Result<()> {
    let rows = insights.iter().flat_map(|(post_id, metrics)| {
        metrics.iter().map(move |(metric, value)| PostInsightRow {
            post_id,
            metric,
            value: cell(value),
        })
    });
    write_rows(rows, filename)
}

/// Writes `id,created_time` rows.
pub fn write_posts_to_csv(posts: &PostIndex, filename: &str) -> Result<()> {
    let rows = posts.iter().map(|(id, created_time)| PostRow { id, created_time });
    write_rows(rows, filename)
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>, filename: &str) -> Result<()> {
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        return Ok(());
    }

    let file = File::create(filename)?;
    let mut wtr = Writer::from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

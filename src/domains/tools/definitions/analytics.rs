//! Reaction analytics tool and its pure aggregation core.
//!
//! The tool fetches a bulk batch of records through the NocoDB client and
//! reduces it to aggregate counts, percentage strings and a one-line
//! summary. Aggregation itself is a pure function over the record set so it
//! can be tested without any network.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use super::schema_of;
use crate::domains::nocodb::NocoClient;
use crate::domains::tools::envelope::now_rfc3339;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::registry::ToolDescriptor;

/// Cap on the bulk fetch feeding the aggregation.
pub const ANALYTICS_FETCH_LIMIT: u32 = 1000;

/// Parameters for the analytics tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetAnalyticsParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    /// The table holding Discord heart-reaction records.
    #[schemars(description = "Table ID of the reactions table")]
    pub table_id: String,
}

/// Aggregate counts over a reaction record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAnalytics {
    pub total_reactions: usize,
    pub with_images: usize,
    pub cinematic_count: usize,
    pub anime_count: usize,
    pub with_sref_codes: usize,
    pub shot_types: BTreeMap<String, usize>,
    pub recent_24h: usize,
}

/// Headline summary derived from [`ReactionAnalytics`].
///
/// Percentages are strings with one decimal place; the literal `"0"` stands
/// in whenever the numerator or the total is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub message: String,
    pub cinematic_percentage: String,
    pub anime_percentage: String,
    pub sref_coverage: String,
}

/// Reaction analytics over a table of Discord heart reactions.
#[derive(Debug, Clone)]
pub struct GetAnalyticsTool;

impl GetAnalyticsTool {
    pub const NAME: &'static str = "nocodb_get_analytics";
    pub const DESCRIPTION: &'static str =
        "Compute Discord heart-reaction analytics over a table: counts, shot-type breakdown, recent activity and percentages.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<GetAnalyticsParams>())
    }

    /// Fetch up to [`ANALYTICS_FETCH_LIMIT`] records and aggregate them.
    ///
    /// A failed fetch propagates unchanged; no partial aggregate is built.
    pub async fn execute(params: &GetAnalyticsParams, client: &NocoClient) -> Result<Value, ToolError> {
        let data = client
            .get_records(&params.project_id, &params.table_id, ANALYTICS_FETCH_LIMIT, 0)
            .await?;
        let records = data
            .get("list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let analytics = aggregate(&records, Utc::now());
        let summary = summarize(&analytics);

        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "analytics": analytics,
            "summary": summary,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Reduce a record set to aggregate counts. Pure and idempotent.
pub fn aggregate(records: &[Value], now: DateTime<Utc>) -> ReactionAnalytics {
    let cutoff = now - Duration::hours(24);

    let mut shot_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut recent_24h = 0;

    for record in records {
        if let Some(shot_type) = non_empty_text(record, "shot_type") {
            *shot_types.entry(shot_type.to_string()).or_insert(0) += 1;
        }
        if let Some(timestamp) = non_empty_text(record, "timestamp") {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
                if parsed.with_timezone(&Utc) > cutoff {
                    recent_24h += 1;
                }
            }
        }
    }

    ReactionAnalytics {
        total_reactions: records.len(),
        with_images: count(records, |r| non_empty_text(r, "image_url").is_some()),
        cinematic_count: count(records, |r| is_truthy(r, "cinematic")),
        anime_count: count(records, |r| is_truthy(r, "anime")),
        with_sref_codes: count(records, |r| non_empty_text(r, "sref_code").is_some()),
        shot_types,
        recent_24h,
    }
}

/// Build the headline summary for an aggregate.
pub fn summarize(analytics: &ReactionAnalytics) -> AnalyticsSummary {
    AnalyticsSummary {
        message: format!(
            "{} total reactions, {} with images, {} in last 24h",
            analytics.total_reactions, analytics.with_images, analytics.recent_24h
        ),
        cinematic_percentage: percentage(analytics.cinematic_count, analytics.total_reactions),
        anime_percentage: percentage(analytics.anime_count, analytics.total_reactions),
        sref_coverage: percentage(analytics.with_sref_codes, analytics.total_reactions),
    }
}

fn count(records: &[Value], predicate: impl Fn(&Value) -> bool) -> usize {
    records.iter().filter(|r| predicate(r)).count()
}

fn non_empty_text<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn is_truthy(record: &Value, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}

/// `(part / total) * 100` to one decimal place, or `"0"` when either side
/// is zero. Avoids division by zero on empty tables.
fn percentage(part: usize, total: usize) -> String {
    if part == 0 || total == 0 {
        "0".to_string()
    } else {
        format!("{:.1}", (part as f64 / total as f64) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<Value> {
        vec![
            json!({
                "image_url": "https://cdn.example.com/a.png",
                "cinematic": true,
                "shot_type": "wide",
                "sref_code": "SREF-1",
            }),
            json!({
                "image_url": "https://cdn.example.com/b.png",
                "cinematic": false,
                "shot_type": "wide",
            }),
            json!({ "shot_type": "close-up", "anime": false }),
            json!({ "image_url": "" }),
        ]
    }

    #[test]
    fn test_fixture_counts() {
        let analytics = aggregate(&fixture(), Utc::now());
        assert_eq!(analytics.total_reactions, 4);
        assert_eq!(analytics.with_images, 2);
        assert_eq!(analytics.cinematic_count, 1);
        assert_eq!(analytics.anime_count, 0);
        assert_eq!(analytics.with_sref_codes, 1);
    }

    #[test]
    fn test_fixture_summary_percentages() {
        let summary = summarize(&aggregate(&fixture(), Utc::now()));
        assert_eq!(summary.cinematic_percentage, "25.0");
        assert_eq!(summary.anime_percentage, "0");
        assert_eq!(summary.sref_coverage, "25.0");
        assert_eq!(summary.message, "4 total reactions, 2 with images, 0 in last 24h");
    }

    #[test]
    fn test_empty_record_set_has_no_division_by_zero() {
        let analytics = aggregate(&[], Utc::now());
        assert_eq!(analytics.total_reactions, 0);
        let summary = summarize(&analytics);
        assert_eq!(summary.cinematic_percentage, "0");
        assert_eq!(summary.anime_percentage, "0");
        assert_eq!(summary.sref_coverage, "0");
    }

    #[test]
    fn test_shot_type_frequency_table() {
        let analytics = aggregate(&fixture(), Utc::now());
        assert_eq!(analytics.shot_types.len(), 2);
        assert_eq!(analytics.shot_types["wide"], 2);
        assert_eq!(analytics.shot_types["close-up"], 1);
    }

    #[test]
    fn test_recent_24h_window() {
        let now = DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let records = vec![
            json!({ "timestamp": "2025-06-15T11:00:00Z" }),
            json!({ "timestamp": "2025-06-14T12:00:01Z" }),
            json!({ "timestamp": "2025-06-13T12:00:00Z" }),
            json!({ "timestamp": "not-a-date" }),
            json!({}),
        ];
        let analytics = aggregate(&records, now);
        assert_eq!(analytics.recent_24h, 2);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let now = Utc::now();
        let records = fixture();
        assert_eq!(aggregate(&records, now), aggregate(&records, now));
    }

    #[test]
    fn test_truthy_flag_handling() {
        let records = vec![
            json!({ "cinematic": 1 }),
            json!({ "cinematic": "yes" }),
            json!({ "cinematic": 0 }),
            json!({ "cinematic": "" }),
            json!({ "cinematic": null }),
        ];
        let analytics = aggregate(&records, Utc::now());
        assert_eq!(analytics.cinematic_count, 2);
    }

    #[test]
    fn test_percentage_one_decimal() {
        assert_eq!(percentage(1, 3), "33.3");
        assert_eq!(percentage(2, 3), "66.7");
        assert_eq!(percentage(3, 3), "100.0");
        assert_eq!(percentage(0, 3), "0");
        assert_eq!(percentage(1, 0), "0");
    }
}

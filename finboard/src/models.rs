//! Domain records passed between sources, storage, jobs and the API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EarningsTime {
    BeforeMarket,
    AfterMarket,
    DuringMarket,
}

/// A scheduled company earnings release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEvent {
    pub symbol: String,
    pub company_name: String,
    pub earnings_date: NaiveDate,
    pub earnings_time: EarningsTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_eps: Option<f64>,
    pub fiscal_quarter: String,
    pub fiscal_year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

/// A macro release such as CPI or a rate decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub importance: Importance,
    pub country: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// The daily top-five market summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub date: NaiveDate,
    pub items: Vec<SummaryItem>,
    pub generated_at: DateTime<Utc>,
}

impl MarketSummary {
    /// Render as a markdown body for the summary store
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        for (i, item) in self.items.iter().enumerate() {
            md.push_str(&format!("## {}. {}\n\n", i + 1, item.title));
            md.push_str(&format!("**Category**: {}\n\n", item.category));
            md.push_str(&item.content);
            md.push_str("\n\n");
            if !item.sources.is_empty() {
                md.push_str(&format!("**Sources**: {}\n\n", item.sources.join(", ")));
            }
        }
        md
    }
}

/// Outcome counts of a scrape run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub success: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earnings_event_wire_format() {
        let json = r#"{
            "symbol": "AAPL",
            "companyName": "Apple Inc.",
            "earningsDate": "2024-05-02",
            "earningsTime": "after-market",
            "expectedEps": 1.5,
            "fiscalQuarter": "Q2",
            "fiscalYear": 2024
        }"#;

        let event: EarningsEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.earnings_time, EarningsTime::AfterMarket);
        assert_eq!(event.actual_eps, None);

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["companyName"], "Apple Inc.");
        assert!(back.get("actualEps").is_none());
    }

    #[test]
    fn test_summary_markdown() {
        let summary = MarketSummary {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            items: vec![SummaryItem {
                title: "Fed holds rates".to_string(),
                content: "Rates unchanged.".to_string(),
                category: "macro".to_string(),
                sources: vec!["Reuters".to_string()],
            }],
            generated_at: Utc::now(),
        };

        let md = summary.to_markdown();
        assert!(md.starts_with("## 1. Fed holds rates"));
        assert!(md.contains("**Sources**: Reuters"));
    }
}

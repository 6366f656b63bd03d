//! Cost data from `GET /cost/app/{id}` and the headline figures derived from it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default look-back window for cost queries.
pub const DEFAULT_COST_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCost {
    /// Day in `YYYY-MM-DD` form
    pub date: String,
    pub cost: f64,
}

impl DailyCost {
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostResponse {
    pub currency: String,
    pub total_cost: f64,
    #[serde(default)]
    pub granularity: Option<String>,
    /// Last day with non-zero spend; Azure cost data lags by a day or two
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub daily_costs: Vec<DailyCost>,
}

/// Headline numbers for a cost tile.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub currency: String,
    pub total: f64,
    /// Spend on the most recent day present in the data
    pub today: f64,
    /// Spend in the calendar month of the most recent day
    pub month_to_date: f64,
    /// Last 7 days against the 7 before, in percent
    pub trend_pct: Option<f64>,
    pub last_updated: Option<String>,
}

impl CostSummary {
    pub fn from_response(response: &CostResponse) -> Self {
        let mut days: Vec<(NaiveDate, f64)> = response
            .daily_costs
            .iter()
            .filter_map(|d| d.day().map(|day| (day, d.cost)))
            .collect();
        days.sort_by_key(|(day, _)| *day);

        let latest = days.last().map(|(day, _)| *day);
        let today = days.last().map(|(_, cost)| *cost).unwrap_or(0.0);
        let month_to_date = latest
            .map(|latest| {
                days.iter()
                    .filter(|(day, _)| day.year() == latest.year() && day.month() == latest.month())
                    .map(|(_, cost)| cost)
                    .sum::<f64>()
            })
            .unwrap_or(0.0);

        let trend_pct = latest.and_then(|latest| {
            let window = |from: i64, to: i64| -> f64 {
                days.iter()
                    .filter(|(day, _)| {
                        let age = (latest - *day).num_days();
                        age >= from && age < to
                    })
                    .map(|(_, cost)| cost)
                    .sum()
            };
            let recent = window(0, 7);
            let previous = window(7, 14);
            if previous > 0.0 {
                Some((recent - previous) / previous * 100.0)
            } else {
                None
            }
        });

        Self {
            currency: response.currency.clone(),
            total: response.total_cost,
            today,
            month_to_date,
            trend_pct,
            last_updated: response.last_updated.clone(),
        }
    }
}

/// Format an amount with thousands separators and the currency symbol when
/// one is known (e.g. 1234.5 INR -> "₹1,234.50").
pub fn format_amount(amount: f64, currency: &str) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (integer, decimal) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let with_commas = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    let sign = if amount < 0.0 { "-" } else { "" };
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{with_commas}.{decimal}"),
        None => format!("{sign}{with_commas}.{decimal} {currency}"),
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_uppercase().as_str() {
        "INR" => Some("₹"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(days: &[(&str, f64)]) -> CostResponse {
        CostResponse {
            currency: "INR".into(),
            total_cost: days.iter().map(|(_, c)| c).sum::<f64>(),
            granularity: Some("30 Days".into()),
            last_updated: days.last().map(|(d, _)| d.to_string()),
            daily_costs: days
                .iter()
                .map(|(date, cost)| DailyCost {
                    date: date.to_string(),
                    cost: *cost,
                })
                .collect(),
        }
    }

    #[test]
    fn parses_backend_payload_with_missing_optionals() {
        let parsed: CostResponse = serde_json::from_value(json!({
            "currency": "INR",
            "total_cost": 12.5
        }))
        .unwrap();
        assert!(parsed.daily_costs.is_empty());
        let summary = CostSummary::from_response(&parsed);
        assert_eq!(summary.today, 0.0);
        assert_eq!(summary.month_to_date, 0.0);
        assert_eq!(summary.trend_pct, None);
    }

    #[test]
    fn month_to_date_only_counts_latest_month() {
        let summary = CostSummary::from_response(&response(&[
            ("2026-09-30", 100.0),
            ("2026-10-01", 10.0),
            ("2026-10-02", 20.0),
        ]));
        assert_eq!(summary.today, 20.0);
        assert_eq!(summary.month_to_date, 30.0);
    }

    #[test]
    fn trend_compares_consecutive_weeks() {
        let mut days = Vec::new();
        for d in 1..=14 {
            let cost = if d <= 7 { 10.0 } else { 15.0 };
            days.push((format!("2026-10-{d:02}"), cost));
        }
        let borrowed: Vec<(&str, f64)> = days.iter().map(|(d, c)| (d.as_str(), *c)).collect();
        let summary = CostSummary::from_response(&response(&borrowed));
        let trend = summary.trend_pct.unwrap();
        assert!((trend - 50.0).abs() < 1e-9);
    }

    #[test]
    fn unparseable_dates_are_ignored() {
        let summary =
            CostSummary::from_response(&response(&[("2026-10-01", 5.0), ("garbage", 99.0)]));
        assert_eq!(summary.today, 5.0);
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(1234.5, "INR"), "₹1,234.50");
        assert_eq!(format_amount(0.0, "usd"), "$0.00");
        assert_eq!(format_amount(1_000_000.0, "CHF"), "1,000,000.00 CHF");
        assert_eq!(format_amount(-12.0, "EUR"), "-€12.00");
    }
}

//! Table rows and text formatting for command output.

use colored::{ColoredString, Colorize};
use shared::cost::format_amount;
use shared::{CostSummary, DailyCost, DisplayStatus, EnvironmentRecord, StatusPair};
use tabled::Tabled;

#[derive(Tabled)]
pub struct EnvironmentRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub env_type: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group: String,
    #[tabled(rename = "Frontend")]
    pub frontend: String,
    #[tabled(rename = "Backend")]
    pub backend: String,
}

impl From<&EnvironmentRecord> for EnvironmentRow {
    fn from(env: &EnvironmentRecord) -> Self {
        Self {
            id: env.id.to_string(),
            name: env.name.clone(),
            env_type: env.env_type.short_label().to_string(),
            resource_group: env.resource_group.clone(),
            frontend: env.frontend_app_name.clone(),
            backend: env.backend_app_name.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct CostRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Cost")]
    pub cost: String,
}

impl CostRow {
    pub fn new(day: &DailyCost, currency: &str) -> Self {
        Self {
            date: day.date.clone(),
            cost: format_amount(day.cost, currency),
        }
    }
}

pub fn status_colored(status: DisplayStatus) -> ColoredString {
    match status {
        DisplayStatus::Running => status.as_str().green(),
        DisplayStatus::Starting => status.as_str().yellow(),
        DisplayStatus::Error => status.as_str().red(),
        DisplayStatus::Stopped => status.as_str().dimmed(),
    }
}

/// One line of `watch` output, e.g. `web-dev  frontend Running  backend Starting`.
pub fn status_line(name: &str, statuses: &StatusPair) -> String {
    format!(
        "{:<24} frontend {:<10} backend {}",
        name,
        status_colored(statuses.frontend),
        status_colored(statuses.backend)
    )
}

/// Week-over-week change, e.g. "+12.5%" or "n/a".
pub fn format_trend(trend_pct: Option<f64>) -> String {
    match trend_pct {
        Some(pct) if pct > 0.0 => format!("+{:.1}%", pct),
        Some(pct) => format!("{:.1}%", pct),
        None => "n/a".to_string(),
    }
}

pub fn print_cost_summary(summary: &CostSummary) {
    println!(
        "  Today:          {}",
        format_amount(summary.today, &summary.currency).bold()
    );
    println!(
        "  Month to date:  {}",
        format_amount(summary.month_to_date, &summary.currency)
    );
    println!(
        "  Period total:   {}",
        format_amount(summary.total, &summary.currency)
    );
    let trend = format_trend(summary.trend_pct);
    let trend = match summary.trend_pct {
        Some(pct) if pct > 0.0 => trend.red(),
        Some(_) => trend.green(),
        None => trend.dimmed(),
    };
    println!("  7-day trend:    {}", trend);
    if let Some(updated) = &summary.last_updated {
        println!("  Data through:   {}", updated);
    }
}

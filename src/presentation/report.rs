use std::fmt;

use crate::analytics::EnrichedSeries;
use crate::config::AnalyticsConfig;
use crate::data::types::MarketDetails;
use crate::presentation::format::{
    format_currency, format_flag, format_percentage, format_price, format_volatility,
    NOT_AVAILABLE,
};

/// Label/value lines of the market lookup panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsPanel {
    pub title: String,
    pub lines: Vec<(&'static str, String)>,
    pub description: String,
    pub warning: Option<String>,
}

pub fn details_panel(details: &MarketDetails) -> DetailsPanel {
    DetailsPanel {
        title: details.name.clone(),
        lines: vec![
            ("Market ID", details.id.to_string()),
            ("Category", details.category.clone()),
            ("YES Price", format_currency(Some(details.current_yes_price), true)),
            ("NO Price", format_currency(Some(details.current_no_price), true)),
            ("Liquidity", format_currency(Some(details.liquidity_usd), true)),
            ("24h Volume", format_currency(Some(details.volume_24h_usd), true)),
            ("Resolves", details.resolution_date.format("%Y-%m-%d").to_string()),
        ],
        description: details.description.clone(),
        warning: details.warning.clone(),
    }
}

impl fmt::Display for DetailsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let width = self.lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in &self.lines {
            writeln!(f, "  {:<width$}  {}", label, value, width = width)?;
        }
        writeln!(f, "  {}", self.description)?;
        if let Some(warning) = &self.warning {
            writeln!(f, "  warning: {}", warning)?;
        }
        Ok(())
    }
}

/// "Recent Data Insights" table: the last few days, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentInsights {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub empty_reason: Option<String>,
}

pub fn recent_insights(
    series: &EnrichedSeries,
    analytics: &AnalyticsConfig,
    count: usize,
) -> RecentInsights {
    let headers = vec![
        "Date".to_string(),
        "YES Price".to_string(),
        format!("{}D MA (Yes)", analytics.short_ma_window),
        format!("{}D %Chg (Yes)", analytics.pct_change_periods),
        format!("{}D Volatility", analytics.volatility_window),
        "High Volume?".to_string(),
    ];

    let rows = series
        .tail(count)
        .iter()
        .rev()
        .map(|row| {
            vec![
                row.date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                format_price(row.yes_price),
                format_price(row.short_ma),
                format_percentage(row.pct_change, true),
                format_volatility(row.volatility),
                format_flag(row.high_volume_day).to_string(),
            ]
        })
        .collect();

    RecentInsights {
        headers,
        rows,
        empty_reason: series.missing_input().map(ToString::to_string),
    }
}

impl fmt::Display for RecentInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return match &self.empty_reason {
                Some(reason) => writeln!(f, "No processed data available ({}).", reason),
                None => writeln!(f, "No processed data available."),
            };
        }

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let render = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())
        };

        render(f, &self.headers)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &self.rows {
            render(f, row)?;
        }
        Ok(())
    }
}

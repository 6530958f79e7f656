use serde::Serialize;

use crate::analytics::{EnrichedRow, EnrichedSeries};
use crate::config::{AnalyticsConfig, ChartConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub color: String,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSpec {
    pub title: String,
    pub title_font_size: u32,
    pub font_color: String,
    pub grid_color: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub margins: Margins,
}

/// Renderer-agnostic chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub layout: LayoutSpec,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    pub fn points(&self) -> usize {
        self.traces.iter().map(|t| t.y.iter().flatten().count()).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} trace(s), {} point(s)",
            self.layout.title,
            self.traces.len(),
            self.points()
        )
    }
}

fn layout_spec(layout: &ChartConfig, title: String, y_axis_title: &str) -> LayoutSpec {
    let [left, right, top, bottom] = layout.margins;
    LayoutSpec {
        title,
        title_font_size: layout.title_font_size,
        font_color: layout.font_color.clone(),
        grid_color: layout.grid_color.clone(),
        x_axis_title: "Date".to_string(),
        y_axis_title: y_axis_title.to_string(),
        margins: Margins { left, right, top, bottom },
    }
}

fn x_axis(series: &EnrichedSeries) -> Vec<String> {
    series
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| match row.date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => i.to_string(),
        })
        .collect()
}

fn trace(
    name: String,
    kind: TraceKind,
    color: &str,
    x: &[String],
    series: &EnrichedSeries,
    value: impl Fn(&EnrichedRow) -> Option<f64>,
) -> Trace {
    Trace {
        name,
        kind,
        color: color.to_string(),
        x: x.to_vec(),
        y: series.rows().iter().map(value).collect(),
    }
}

/// Yes and no prices with the yes price's short and long moving averages.
/// A moving average with no defined value is left out.
pub fn price_chart(
    series: &EnrichedSeries,
    layout: &ChartConfig,
    analytics: &AnalyticsConfig,
) -> ChartSpec {
    let x = x_axis(series);
    let title = format!("Historical Price Trend: {}", series.market_id());

    let mut traces = Vec::new();
    if !series.is_empty() {
        traces.push(trace("YES Price".to_string(), TraceKind::Line, &layout.yes_price_color, &x, series, |r| r.yes_price));
        traces.push(trace("NO Price".to_string(), TraceKind::Line, &layout.no_price_color, &x, series, |r| r.no_price));

        let averages = [
            trace(
                format!("{}D MA", analytics.short_ma_window),
                TraceKind::Line,
                &layout.short_ma_color,
                &x,
                series,
                |r| r.short_ma,
            ),
            trace(
                format!("{}D MA", analytics.long_ma_window),
                TraceKind::Line,
                &layout.long_ma_color,
                &x,
                series,
                |r| r.long_ma,
            ),
        ];
        traces.extend(averages.into_iter().filter(|t| t.y.iter().any(Option::is_some)));
    }

    ChartSpec {
        layout: layout_spec(layout, title, "Price (Probability)"),
        traces,
    }
}

/// Daily volume bars, high-volume days split into their own trace.
pub fn volume_chart(series: &EnrichedSeries, layout: &ChartConfig) -> ChartSpec {
    let x = x_axis(series);
    let title = format!("Trading Volume: {}", series.market_id());
    let has_volume = series.rows().iter().any(|r| r.volume.is_some());

    let traces = if !has_volume {
        Vec::new()
    } else {
        vec![
            trace("Volume".to_string(), TraceKind::Bar, &layout.volume_color, &x, series, |r| {
                r.volume.filter(|_| !r.high_volume_day)
            }),
            trace(
                "High Volume".to_string(),
                TraceKind::Bar,
                &layout.high_volume_color,
                &x,
                series,
                |r| r.volume.filter(|_| r.high_volume_day),
            ),
        ]
    };

    ChartSpec {
        layout: layout_spec(layout, title, "Volume (Mock Units)"),
        traces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::enrich;
    use crate::data::frame::MarketFrame;
    use crate::data::schema::MarketSchema;
    use crate::data::types::MarketId;

    fn series(with_volume: bool) -> EnrichedSeries {
        let id = MarketId::parse("market4").unwrap();
        let analytics = AnalyticsConfig::default();
        let mut frame = MarketFrame::with_dates(["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"])
            .with_values("market4_yes_price", &[0.2, 0.25, 0.22, 0.3])
            .with_values("market4_no_price", &[0.8, 0.75, 0.78, 0.7]);
        if with_volume {
            frame = frame.with_values("market4_volume", &[100.0, 120.0, 110.0, 900.0]);
        }
        enrich(&frame, &MarketSchema::new(&id, &analytics), &analytics)
    }

    #[test]
    fn test_price_chart_uses_shared_layout() {
        let layout = ChartConfig {
            title_font_size: 22,
            ..ChartConfig::default()
        };
        let chart = price_chart(&series(true), &layout, &AnalyticsConfig::default());

        assert_eq!(chart.traces.len(), 4);
        assert_eq!(chart.traces[1].name, "NO Price");
        assert_eq!(chart.traces[1].color, "#f87171");
        assert_eq!(chart.traces[1].y[3], Some(0.7));
        assert_eq!(chart.traces[2].name, "7D MA");
        assert_eq!(chart.traces[3].name, "30D MA");
        assert_eq!(chart.layout.title_font_size, 22);
        assert_eq!(chart.layout.margins.left, 50);
        assert_eq!(chart.traces[0].x[0], "2024-01-01");
        assert_eq!(chart.points(), 16);
    }

    #[test]
    fn test_price_chart_skips_undefined_averages() {
        let id = MarketId::parse("market4").unwrap();
        let analytics = AnalyticsConfig::default();
        let frame = MarketFrame::with_dates(["2024-01-01", "2024-01-02"])
            .with_column("market4_yes_price", vec![None, None]);
        let series = enrich(&frame, &MarketSchema::new(&id, &analytics), &analytics);

        let chart = price_chart(&series, &ChartConfig::default(), &analytics);
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["YES Price", "NO Price"]);
        assert_eq!(chart.points(), 0);
    }

    #[test]
    fn test_volume_chart_splits_high_volume_days() {
        let chart = volume_chart(&series(true), &ChartConfig::default());

        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0].y, vec![Some(100.0), Some(120.0), Some(110.0), None]);
        assert_eq!(chart.traces[1].y, vec![None, None, None, Some(900.0)]);
        assert_eq!(chart.traces[1].color, "#f87171");
    }

    #[test]
    fn test_volume_chart_without_volume() {
        let chart = volume_chart(&series(false), &ChartConfig::default());
        assert!(chart.traces.is_empty());
        assert!(chart.summary().contains("0 trace(s)"));
    }

    #[test]
    fn test_chart_serializes() {
        let chart = price_chart(&series(true), &ChartConfig::default(), &AnalyticsConfig::default());
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["traces"][0]["kind"], "line");
        assert_eq!(json["layout"]["x_axis_title"], "Date");
    }
}

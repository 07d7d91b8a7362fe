use crate::domain::model::{ChartOptions, CityTrend, Extremum, RegionalAverage, SeasonalSeries};
use crate::render::palette::{parse_hex_color, Palette, ANNOTATION, BAR_FILL};
use crate::utils::error::{FluxError, Result};
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;

pub const BAR_CHART_FILE: &str = "avg_temp_by_region.svg";
pub const SEASONAL_CHART_FILE: &str = "seasonal_trends_by_region.svg";
pub const CITY_TREND_CHART_FILE: &str = "temp_trends_by_city.svg";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const FONT: &str = "sans-serif";
const Y_DESC: &str = "Average Temperature (°C)";

/// 單張圖的像素大小與背景色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
}

impl Figure {
    pub fn chart(options: &ChartOptions) -> Result<Self> {
        Ok(Self {
            width: options.width,
            height: options.height,
            background: parse_hex_color(&options.face_color)?,
        })
    }

    pub fn heatmap(options: &ChartOptions) -> Result<Self> {
        Ok(Self {
            width: options.heatmap_width,
            height: options.heatmap_height,
            background: parse_hex_color(&options.face_color)?,
        })
    }
}

/// 上下各留 10% 空間；長條圖以 `include_zero` 保留零基線
pub(crate) fn value_bounds(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo > hi {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    let pad = if hi - lo > f64::EPSILON { (hi - lo) * 0.1 } else { 1.0 };
    (lo - pad, hi + pad)
}

fn month_label(month: u32) -> String {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .map(|m| m.to_string())
        .unwrap_or_default()
}

/// 整數區間含右端點，`0..n-1` 剛好切出 n 個區段。
/// 單一值的區間在 plotters 中無法對映，因此至少保留兩個區段。
fn region_segments(count: usize) -> std::ops::Range<usize> {
    0..count.saturating_sub(1).max(1)
}

/// Bar chart of regional means with the lowest or highest region annotated.
pub fn bar_chart(
    averages: &[RegionalAverage],
    extreme: Option<&RegionalAverage>,
    extremum: Extremum,
    figure: &Figure,
) -> Result<String> {
    let err = |e: &dyn std::fmt::Display| FluxError::render(BAR_CHART_FILE, e);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (figure.width, figure.height)).into_drawing_area();
        root.fill(&figure.background).map_err(|e| err(&e))?;

        let n = averages.len().max(1);
        let (y_min, y_max) = value_bounds(averages.iter().map(|a| a.avg_temperature), true);

        let mut chart = ChartBuilder::on(&root)
            .caption("Average Temperature by Region", (FONT, 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(region_segments(n).into_segmented(), y_min..y_max)
            .map_err(|e| err(&e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(&BLACK.mix(0.3))
            .light_line_style(&WHITE.mix(0.0))
            .x_labels(n + 1)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => averages
                    .get(*i)
                    .map(|a| a.region.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Region")
            .y_desc(Y_DESC)
            .axis_desc_style((FONT, 20))
            .draw()
            .map_err(|e| err(&e))?;

        chart
            .draw_series(averages.iter().enumerate().map(|(i, a)| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), a.avg_temperature),
                    ],
                    BAR_FILL.filled(),
                );
                bar.set_margin(0, 0, 12, 12);
                bar
            }))
            .map_err(|e| err(&e))?;

        // 黑色外框
        chart
            .draw_series(averages.iter().enumerate().map(|(i, a)| {
                let mut edge = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), a.avg_temperature),
                    ],
                    BLACK.stroke_width(1),
                );
                edge.set_margin(0, 0, 12, 12);
                edge
            }))
            .map_err(|e| err(&e))?;

        if let Some(target) = extreme {
            if let Some(i) = averages.iter().position(|a| a.region == target.region) {
                let prefix = match extremum {
                    Extremum::Min => "Min",
                    Extremum::Max => "Max",
                };
                let label = format!("{} Temp: {:.2}°C", prefix, target.avg_temperature);
                let style = (FONT, 16).into_font().color(&ANNOTATION);

                chart
                    .draw_series(std::iter::once(
                        EmptyElement::at((SegmentValue::CenterOf(i), target.avg_temperature))
                            + PathElement::new(vec![(0, -4), (0, -20)], ANNOTATION.stroke_width(1))
                            + Text::new(label, (-50, -40), style),
                    ))
                    .map_err(|e| err(&e))?;
            }
        }

        root.present().map_err(|e| err(&e))?;
    }
    Ok(svg)
}

/// 每個區域一條月份折線，並標註高峰
pub fn seasonal_chart(series: &[SeasonalSeries], figure: &Figure) -> Result<String> {
    let err = |e: &dyn std::fmt::Display| FluxError::render(SEASONAL_CHART_FILE, e);
    let palette = Palette::seasonal_trends();
    tracing::debug!("Drawing {} seasonal series with the '{}' palette", series.len(), palette.name());
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (figure.width, figure.height)).into_drawing_area();
        root.fill(&figure.background).map_err(|e| err(&e))?;

        let (y_min, y_max) = value_bounds(
            series
                .iter()
                .flat_map(|s| s.points.iter().map(|p| p.avg_temperature)),
            false,
        );

        let mut chart = ChartBuilder::on(&root)
            .caption("Seasonal Temperature Trends", (FONT, 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(1u32..12u32, y_min..y_max)
            .map_err(|e| err(&e))?;

        chart
            .configure_mesh()
            .bold_line_style(&BLACK.mix(0.15))
            .light_line_style(&WHITE.mix(0.0))
            .x_labels(12)
            .x_label_formatter(&|m| month_label(*m))
            .x_desc("Month")
            .y_desc(Y_DESC)
            .axis_desc_style((FONT, 20))
            .draw()
            .map_err(|e| err(&e))?;

        for (index, s) in series.iter().enumerate() {
            let color = palette.color(index);

            chart
                .draw_series(LineSeries::new(
                    s.points.iter().map(|p| (p.month, p.avg_temperature)),
                    color.stroke_width(2),
                ))
                .map_err(|e| err(&e))?
                .label(s.region.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            let label = format!("Highest: {:.1}°C", s.peak.avg_temperature);
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((s.peak.month, s.peak.avg_temperature))
                        + Circle::new((0, 0), 3, color.filled())
                        + PathElement::new(vec![(0, 4), (0, 20)], color.stroke_width(1))
                        + Text::new(label, (-10, 24), (FONT, 13).into_font().color(&color)),
                ))
                .map_err(|e| err(&e))?;
        }

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8).filled())
                .border_style(&BLACK)
                .label_font((FONT, 16))
                .draw()
                .map_err(|e| err(&e))?;
        }

        root.present().map_err(|e| err(&e))?;
    }
    Ok(svg)
}

/// 指定城市在單一年度的每日溫度，並標註高峰
pub fn city_trend_chart(trends: &[CityTrend], year: Option<i32>, figure: &Figure) -> Result<String> {
    let err = |e: &dyn std::fmt::Display| FluxError::render(CITY_TREND_CHART_FILE, e);
    let palette = Palette::temperature_trends();
    let title = match year {
        Some(y) => format!("Temperature Trends for Selected Cities ({})", y),
        None => "Temperature Trends for Selected Cities (no data)".to_string(),
    };
    let label_year = year.unwrap_or(2000);

    let (mut x_min, mut x_max) = trends
        .iter()
        .flat_map(|t| t.points.iter().map(|p| p.date.ordinal()))
        .fold((u32::MAX, 0u32), |(lo, hi), d| (lo.min(d), hi.max(d)));
    if x_min > x_max {
        x_min = 1;
        x_max = 365;
    }
    if x_min == x_max {
        x_max += 1;
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (figure.width, figure.height)).into_drawing_area();
        root.fill(&figure.background).map_err(|e| err(&e))?;

        let (y_min, y_max) = value_bounds(
            trends
                .iter()
                .flat_map(|t| t.points.iter().map(|p| p.avg_temperature)),
            false,
        );

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| err(&e))?;

        chart
            .configure_mesh()
            .bold_line_style(&BLACK.mix(0.15))
            .light_line_style(&WHITE.mix(0.0))
            .x_labels(12)
            .x_label_formatter(&|ordinal| {
                NaiveDate::from_yo_opt(label_year, *ordinal)
                    .map(|d| d.format("%b %d").to_string())
                    .unwrap_or_default()
            })
            .x_desc("Date")
            .y_desc(Y_DESC)
            .axis_desc_style((FONT, 20))
            .draw()
            .map_err(|e| err(&e))?;

        for (index, trend) in trends.iter().enumerate() {
            let color = palette.color(index);

            chart
                .draw_series(LineSeries::new(
                    trend
                        .points
                        .iter()
                        .map(|p| (p.date.ordinal(), p.avg_temperature)),
                    color.stroke_width(2),
                ))
                .map_err(|e| err(&e))?
                .label(trend.city.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            let label = format!("{}: {:.1}°C", trend.city, trend.peak.avg_temperature);
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((trend.peak.date.ordinal(), trend.peak.avg_temperature))
                        + Circle::new((0, 0), 3, color.filled())
                        + PathElement::new(vec![(0, 4), (12, 52)], color.stroke_width(1))
                        + Text::new(label, (0, 56), (FONT, 16).into_font().color(&color)),
                ))
                .map_err(|e| err(&e))?;
        }

        if !trends.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8).filled())
                .border_style(&BLACK)
                .label_font((FONT, 16))
                .draw()
                .map_err(|e| err(&e))?;
        }

        root.present().map_err(|e| err(&e))?;
    }
    Ok(svg)
}

use crate::domain::model::{AnalysisSummary, Extremum, ReportMetadata};
use std::fmt::Write;

pub const REPORT_FILE: &str = "report.md";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// Title page of the project.
pub fn front_matter(metadata: &ReportMetadata) -> String {
    format!(
        "# **{title}**\n\
         ### *{subtitle}*\n\
         \n\
         ---\n\
         \n\
         {abstract_text}\n\
         \n\
         ---\n\
         \n\
         ##### **{course}**\n\
         - **Date:** {date}\n\
         - **Professor:** {professor}\n\
         - **Author:** *{author}*\n\
         \n\
         ---\n",
        title = metadata.title,
        subtitle = metadata.subtitle,
        abstract_text = metadata.abstract_text,
        course = metadata.course,
        date = metadata.date,
        professor = metadata.professor,
        author = metadata.author,
    )
}

/// Markdown report: front matter followed by the analysis results.
pub fn render_report(metadata: &ReportMetadata, summary: &AnalysisSummary) -> String {
    let mut out = front_matter(metadata);

    // 寫入 String 不會失敗
    let _ = write_summary(&mut out, summary);
    out
}

fn write_summary(out: &mut String, summary: &AnalysisSummary) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "## Dataset")?;
    writeln!(out)?;
    writeln!(out, "- Rows read: {}", summary.rows_read)?;
    writeln!(out, "- Rows kept: {}", summary.rows_kept)?;
    writeln!(out, "- Rows dropped (missing readings or invalid months): {}", summary.rows_dropped)?;
    if let (Some(first), Some(last)) = (summary.first_year, summary.last_year) {
        writeln!(out, "- Years covered: {}–{}", first, last)?;
    }

    writeln!(out)?;
    writeln!(out, "## Average Temperature by Region")?;
    writeln!(out)?;
    if summary.regional_averages.is_empty() {
        writeln!(out, "No regional data.")?;
    } else {
        writeln!(out, "| Region | Average Temperature (°C) |")?;
        writeln!(out, "|---|---:|")?;
        for avg in &summary.regional_averages {
            writeln!(out, "| {} | {:.2} |", avg.region, avg.avg_temperature)?;
        }
        if let Some(extreme) = &summary.extreme_region {
            let label = match summary.extremum {
                Extremum::Min => "Coldest",
                Extremum::Max => "Warmest",
            };
            writeln!(out)?;
            writeln!(
                out,
                "{} region: **{}** at {:.2}°C",
                label, extreme.region, extreme.avg_temperature
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Seasonal Temperature Trends")?;
    writeln!(out)?;
    let peaks = summary.seasonal_peaks();
    if peaks.is_empty() {
        writeln!(out, "No seasonal data for the selected regions.")?;
    } else {
        for peak in peaks {
            writeln!(
                out,
                "- {}: highest in {} at {:.1}°C",
                peak.region,
                month_name(peak.month),
                peak.avg_temperature
            )?;
        }
    }

    writeln!(out)?;
    match summary.selected_year {
        Some(year) => writeln!(out, "## Temperature Trends for Selected Cities ({})", year)?,
        None => writeln!(out, "## Temperature Trends for Selected Cities")?,
    }
    writeln!(out)?;
    if summary.city_peaks.is_empty() {
        writeln!(out, "No data for the selected cities.")?;
    } else {
        for peak in &summary.city_peaks {
            writeln!(
                out,
                "- {}: peak of {:.1}°C on {}",
                peak.city,
                peak.avg_temperature,
                peak.date.format("%d %B %Y")
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Global Temperature Heatmap")?;
    writeln!(out)?;
    writeln!(out, "- Countries with data: {}", summary.country_count)?;
    if let Some(hot) = &summary.hottest_country {
        writeln!(
            out,
            "- Hottest country: **{}** at {:.1}°C",
            hot.country, hot.avg_temperature
        )?;
    }

    if !summary.charts.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Figures")?;
        writeln!(out)?;
        for chart in &summary.charts {
            writeln!(out, "![{}]({})", chart.trim_end_matches(".svg"), chart)?;
        }
    }

    Ok(())
}

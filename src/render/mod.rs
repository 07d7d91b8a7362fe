pub mod charts;
pub mod heatmap;
pub mod palette;
pub mod report;

pub use charts::{bar_chart, city_trend_chart, seasonal_chart, Figure};
pub use heatmap::heatmap;
pub use palette::Palette;
pub use report::render_report;

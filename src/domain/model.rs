use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 原始 CSV 的一列 (溫度單位為華氏)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTemperatureRecord {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AvgTemperature")]
    pub avg_temperature: f64,
}

/// 城市對照表的一列 (name -> state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStateMapping {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// 清理後的記錄，溫度已換算為攝氏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AvgTemperature")]
    pub avg_temperature: f64,
}

impl TemperatureRecord {
    /// Calendar date of the reading, if the (year, month, day) triple is valid.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Extremum {
    #[default]
    Min,
    Max,
}

impl fmt::Display for Extremum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extremum::Min => write!(f, "min"),
            Extremum::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalAverage {
    pub region: String,
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPoint {
    pub month: u32,
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalSeries {
    pub region: String,
    pub points: Vec<SeasonalPoint>,
    pub peak: SeasonalPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTrend {
    pub city: String,
    pub points: Vec<TrendPoint>,
    pub peak: TrendPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryAverage {
    pub country: String,
    pub avg_temperature: f64,
}

/// 一個國家的輪廓，座標為 (經度, 緯度)
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    pub name: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl CountryShape {
    /// 所有 ring 外框的中心點
    pub fn center(&self) -> Option<(f64, f64)> {
        let mut points = self.rings.iter().flatten();
        let first = points.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldGeometry {
    pub countries: Vec<CountryShape>,
}

/// extract 階段的輸出
#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    pub records: Vec<RawTemperatureRecord>,
    pub city_lookup: Vec<CityStateMapping>,
    pub world: Option<WorldGeometry>,
}

/// 要寫出的檔案
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, media_type: &'static str, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPeak {
    pub region: String,
    pub month: u32,
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPeak {
    pub city: String,
    pub date: NaiveDate,
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub regional_averages: Vec<RegionalAverage>,
    pub extremum: Extremum,
    pub extreme_region: Option<RegionalAverage>,
    pub seasonal: Vec<SeasonalSeries>,
    pub selected_year: Option<i32>,
    pub city_peaks: Vec<CityPeak>,
    pub country_count: usize,
    pub hottest_country: Option<CountryAverage>,
    pub charts: Vec<String>,
}

impl AnalysisSummary {
    pub fn seasonal_peaks(&self) -> Vec<SeasonalPeak> {
        self.seasonal
            .iter()
            .map(|series| SeasonalPeak {
                region: series.region.clone(),
                month: series.peak.month,
                avg_temperature: series.peak.avg_temperature,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<TemperatureRecord>,
    pub summary: AnalysisSummary,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    pub min_year: i32,
    pub max_year: i32,
    /// 原始資料以 -99 表示缺值
    pub missing_sentinel: Option<f64>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            min_year: 1900,
            max_year: 2024,
            missing_sentinel: Some(-99.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// 空白時取前 `region_count` 個地區
    pub regions: Vec<String>,
    pub region_count: usize,
    pub cities: Vec<String>,
    /// 未指定時使用所選城市最先出現的年份
    pub year: Option<i32>,
    pub extreme: Extremum,
}

pub const DEFAULT_CITIES: [&str; 3] = ["Los Angeles", "Moscow", "Karachi"];

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            region_count: 3,
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            year: None,
            extreme: Extremum::Min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub face_color: String,
    pub width: u32,
    pub height: u32,
    pub heatmap_width: u32,
    pub heatmap_height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            face_color: "FFFFFF".to_string(),
            width: 1200,
            height: 600,
            heatmap_width: 2000,
            heatmap_height: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub title: String,
    pub subtitle: String,
    pub abstract_text: String,
    pub course: String,
    pub date: String,
    pub professor: String,
    pub author: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            title: "A World in `Flux`".to_string(),
            subtitle: "Unraveling Global Temperature Trends".to_string(),
            abstract_text: "We will explore **global temperature patterns**, highlighting **regional disparities** and the **impact of climate change**.\nThrough interactive **visualisations**, we will delve into the **past, present, and future** of our planet's climate.".to_string(),
            course: "Data Visualisation: Course Project".to_string(),
            date: "6th December 2024".to_string(),
            professor: "Грандилевский Алексей Ильич".to_string(),
            author: "Умар Ахмед".to_string(),
        }
    }
}

use crate::domain::model::{
    CityTrend, CountryAverage, Extremum, RegionalAverage, SeasonalPoint, SeasonalSeries,
    TemperatureRecord, TrendPoint,
};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// 保留第一次出現的順序
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// 各區域平均溫度，由低到高排序 (同值依名稱)
pub fn regional_averages(records: &[TemperatureRecord]) -> Vec<RegionalAverage> {
    let mut by_region: HashMap<&str, Mean> = HashMap::new();
    for record in records {
        by_region
            .entry(record.region.as_str())
            .or_default()
            .add(record.avg_temperature);
    }

    let mut averages: Vec<RegionalAverage> = by_region
        .into_iter()
        .map(|(region, mean)| RegionalAverage {
            region: region.to_string(),
            avg_temperature: mean.value(),
        })
        .collect();
    averages.sort_by(|a, b| {
        a.avg_temperature
            .total_cmp(&b.avg_temperature)
            .then_with(|| a.region.cmp(&b.region))
    });
    averages
}

pub fn regional_extreme(averages: &[RegionalAverage], extremum: Extremum) -> Option<&RegionalAverage> {
    // 已依平均值排序
    match extremum {
        Extremum::Min => averages.first(),
        Extremum::Max => averages.last(),
    }
}

pub fn default_regions(records: &[TemperatureRecord], count: usize) -> Vec<String> {
    distinct_in_order(records.iter().map(|r| r.region.as_str()))
        .into_iter()
        .take(count)
        .map(str::to_string)
        .collect()
}

/// 指定區域的每月平均；沒有資料的區域略過
pub fn seasonal_trends(records: &[TemperatureRecord], regions: &[String]) -> Vec<SeasonalSeries> {
    let mut series = Vec::with_capacity(regions.len());

    for region in regions {
        let mut by_month: BTreeMap<u32, Mean> = BTreeMap::new();
        for record in records.iter().filter(|r| &r.region == region) {
            by_month
                .entry(record.month)
                .or_default()
                .add(record.avg_temperature);
        }

        let points: Vec<SeasonalPoint> = by_month
            .into_iter()
            .map(|(month, mean)| SeasonalPoint {
                month,
                avg_temperature: mean.value(),
            })
            .collect();

        let Some(peak) = first_max_by(&points, |p| p.avg_temperature).cloned() else {
            tracing::warn!("No data available for region '{}', skipping", region);
            continue;
        };

        series.push(SeasonalSeries {
            region: region.clone(),
            points,
            peak,
        });
    }

    series
}

/// 指定城市出現過的年份，依首次出現順序
pub fn available_years(records: &[TemperatureRecord], cities: &[String]) -> Vec<i32> {
    let wanted: HashSet<&str> = cities.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| wanted.contains(r.city.as_str()))
        .map(|r| r.year)
        .filter(|y| seen.insert(*y))
        .collect()
}

/// Daily readings per requested city within `year`, sorted by date.
pub fn city_trends(records: &[TemperatureRecord], cities: &[String], year: i32) -> Vec<CityTrend> {
    let mut trends = Vec::with_capacity(cities.len());

    for city in cities {
        let mut invalid_dates = 0usize;
        let mut points: Vec<TrendPoint> = records
            .iter()
            .filter(|r| &r.city == city && r.year == year)
            .filter_map(|r| match r.date() {
                Some(date) => Some(TrendPoint {
                    date,
                    avg_temperature: r.avg_temperature,
                }),
                None => {
                    invalid_dates += 1;
                    None
                }
            })
            .collect();

        if invalid_dates > 0 {
            tracing::warn!(
                "Skipped {} readings with invalid dates for '{}' in {}",
                invalid_dates,
                city,
                year
            );
        }

        points.sort_by_key(|p| p.date);

        let Some(peak) = first_max_by(&points, |p| p.avg_temperature).cloned() else {
            tracing::warn!("No data available for city '{}' in {}, skipping", city, year);
            continue;
        };

        trends.push(CityTrend {
            city: city.clone(),
            points,
            peak,
        });
    }

    trends
}

/// 各國平均溫度，依國名排序
pub fn country_averages(records: &[TemperatureRecord]) -> Vec<CountryAverage> {
    let mut by_country: BTreeMap<&str, Mean> = BTreeMap::new();
    for record in records {
        by_country
            .entry(record.country.as_str())
            .or_default()
            .add(record.avg_temperature);
    }

    by_country
        .into_iter()
        .map(|(country, mean)| CountryAverage {
            country: country.to_string(),
            avg_temperature: mean.value(),
        })
        .collect()
}

pub fn hottest_country(averages: &[CountryAverage]) -> Option<&CountryAverage> {
    first_max_by(averages, |c| c.avg_temperature)
}

/// 相同最大值時取第一個
fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            Some(current) if key(item) <= key(current) => {}
            _ => best = Some(item),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(region: &str, country: &str, city: &str, month: u32, day: u32, year: i32, temp: f64) -> TemperatureRecord {
        TemperatureRecord {
            region: region.to_string(),
            country: country.to_string(),
            state: "Unknown".to_string(),
            city: city.to_string(),
            month,
            day,
            year,
            avg_temperature: temp,
        }
    }

    fn sample() -> Vec<TemperatureRecord> {
        vec![
            record("Europe", "Russia", "Moscow", 1, 1, 2019, -10.0),
            record("Europe", "Russia", "Moscow", 7, 1, 2019, 20.0),
            record("Asia", "Pakistan", "Karachi", 1, 1, 2019, 18.0),
            record("Asia", "Pakistan", "Karachi", 6, 1, 2019, 33.0),
            record("Africa", "Egypt", "Cairo", 6, 1, 2020, 30.0),
            record("Asia", "Pakistan", "Karachi", 6, 2, 2020, 35.0),
        ]
    }

    #[test]
    fn test_regional_averages_sorted_ascending() {
        let averages = regional_averages(&sample());
        let names: Vec<&str> = averages.iter().map(|a| a.region.as_str()).collect();

        assert_eq!(names, vec!["Europe", "Asia", "Africa"]);
        assert!((averages[0].avg_temperature - 5.0).abs() < 1e-9);
        assert!((averages[1].avg_temperature - 86.0 / 3.0).abs() < 1e-9);

        assert_eq!(regional_extreme(&averages, Extremum::Min).unwrap().region, "Europe");
        assert_eq!(regional_extreme(&averages, Extremum::Max).unwrap().region, "Africa");
        assert!(regional_extreme(&[], Extremum::Max).is_none());
    }

    #[test]
    fn test_default_regions_in_order_of_appearance() {
        assert_eq!(default_regions(&sample(), 2), vec!["Europe", "Asia"]);
        assert_eq!(default_regions(&sample(), 10).len(), 3);
    }

    #[test]
    fn test_seasonal_trends_skip_unknown_regions() {
        let regions = vec!["Asia".to_string(), "Antarctica".to_string()];
        let series = seasonal_trends(&sample(), &regions);

        assert_eq!(series.len(), 1);
        let asia = &series[0];
        assert_eq!(asia.points.len(), 2);
        assert_eq!(asia.points[0].month, 1);
        assert_eq!(asia.points[1].month, 6);
        assert!((asia.points[1].avg_temperature - 34.0).abs() < 1e-9);
        assert_eq!(asia.peak.month, 6);
    }

    #[test]
    fn test_available_years_follow_selected_cities() {
        let cities = vec!["Karachi".to_string()];
        assert_eq!(available_years(&sample(), &cities), vec![2019, 2020]);
        assert!(available_years(&sample(), &["Lima".to_string()]).is_empty());
    }

    #[test]
    fn test_regional_average_ties_sort_by_name() {
        let records = vec![
            record("Oceania", "Australia", "Sydney", 1, 1, 2019, 20.0),
            record("Europe", "Spain", "Madrid", 1, 1, 2019, 20.0),
            record("Asia", "Japan", "Tokyo", 1, 1, 2019, 25.0),
        ];

        let names: Vec<String> = regional_averages(&records).into_iter().map(|a| a.region).collect();
        assert_eq!(names, vec!["Europe", "Oceania", "Asia"]);
    }

    #[test]
    fn test_city_trends_sorted_with_peak() {
        let mut records = sample();
        records.push(record("Asia", "Pakistan", "Karachi", 3, 15, 2019, 25.0));
        records.push(record("Asia", "Pakistan", "Karachi", 2, 30, 2019, 99.0));

        let cities = vec!["Karachi".to_string(), "Moscow".to_string(), "Lima".to_string()];
        let trends = city_trends(&records, &cities, 2019);

        assert_eq!(trends.len(), 2);
        let karachi = &trends[0];
        let dates: Vec<NaiveDate> = karachi.points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 3, 15).unwrap(),
                NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            ]
        );
        assert_eq!(karachi.peak.avg_temperature, 33.0);
        assert_eq!(trends[1].city, "Moscow");
    }

    #[test]
    fn test_country_averages_and_hottest() {
        let averages = country_averages(&sample());
        let names: Vec<&str> = averages.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(names, vec!["Egypt", "Pakistan", "Russia"]);

        let hottest = hottest_country(&averages).unwrap();
        assert_eq!(hottest.country, "Egypt");
        assert!(hottest_country(&[]).is_none());
    }

    #[test]
    fn test_first_max_keeps_earliest_tie() {
        let values = [(0, 1.0), (1, 3.0), (2, 3.0), (3, 2.0)];
        let best = first_max_by(&values, |v| v.1).unwrap();
        assert_eq!(best.0, 1);
    }
}

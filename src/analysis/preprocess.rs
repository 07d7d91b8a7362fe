use crate::domain::model::{CityStateMapping, CleanOptions, RawTemperatureRecord, TemperatureRecord};
use crate::utils::error::{FluxError, Result};
use std::collections::HashMap;

pub const UNKNOWN_STATE: &str = "Unknown";

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// 解析每日城市溫度 CSV (需有標題列)
pub fn parse_temperature_csv(data: &[u8]) -> Result<Vec<RawTemperatureRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut records = Vec::new();
    for row in reader.deserialize::<RawTemperatureRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// 解析城市對照表 CSV，只使用 `name` 與 `state` 欄位
pub fn parse_city_lookup_csv(data: &[u8]) -> Result<Vec<CityStateMapping>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut mappings = Vec::new();
    for row in reader.deserialize::<CityStateMapping>() {
        mappings.push(row?);
    }
    Ok(mappings)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// 前向填補後再後向填補；全部缺值時回傳錯誤
fn fill_years(years: Vec<Option<i32>>) -> Result<Vec<i32>> {
    let mut filled = years;

    let mut last = None;
    for year in filled.iter_mut() {
        match year {
            Some(y) => last = Some(*y),
            None => *year = last,
        }
    }

    let mut next = None;
    for year in filled.iter_mut().rev() {
        match year {
            Some(y) => next = Some(*y),
            None => *year = next,
        }
    }

    filled
        .into_iter()
        .collect::<Option<Vec<i32>>>()
        .ok_or_else(|| FluxError::processing("no record carries a year inside the valid range"))
}

/// Cleans raw rows: fills states from the city lookup, repairs day and year
/// anomalies, drops missing readings and converts Fahrenheit to Celsius.
/// Rows whose month is not a calendar month are skipped with a warning.
/// Row order is preserved.
pub fn preprocess(
    raw: Vec<RawTemperatureRecord>,
    lookup: &[CityStateMapping],
    options: &CleanOptions,
) -> Result<Vec<TemperatureRecord>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    // 重複的城市名稱以最後一筆為準
    let city_to_state: HashMap<&str, Option<&str>> = lookup
        .iter()
        .map(|m| (m.name.as_str(), non_empty(m.state.as_ref())))
        .collect();

    let years = raw
        .iter()
        .map(|r| {
            (options.min_year..=options.max_year)
                .contains(&r.year)
                .then_some(r.year)
        })
        .collect::<Vec<_>>();
    let invalid_years = years.iter().filter(|y| y.is_none()).count();
    let years = fill_years(years)?;
    if invalid_years > 0 {
        tracing::debug!("Repaired {} out-of-range years", invalid_years);
    }

    let invalid_months = raw.iter().filter(|r| !(1..=12).contains(&r.month)).count();
    if invalid_months > 0 {
        tracing::warn!("Skipping {} rows with a month outside 1-12", invalid_months);
    }

    let total = raw.len();
    let cleaned: Vec<TemperatureRecord> = raw
        .into_iter()
        .zip(years)
        .filter(|(r, _)| (1..=12).contains(&r.month))
        .filter(|(r, _)| match options.missing_sentinel {
            Some(sentinel) => (r.avg_temperature - sentinel).abs() > f64::EPSILON,
            None => true,
        })
        .map(|(r, year)| {
            let state = match city_to_state.get(r.city.as_str()) {
                Some(mapped) => mapped.map(str::to_string),
                None => non_empty(r.state.as_ref()).map(str::to_string),
            }
            .unwrap_or_else(|| UNKNOWN_STATE.to_string());

            TemperatureRecord {
                region: r.region,
                country: r.country,
                state,
                city: r.city,
                month: r.month,
                day: if r.day == 0 { 1 } else { r.day },
                year,
                avg_temperature: fahrenheit_to_celsius(r.avg_temperature),
            }
        })
        .collect();

    if cleaned.len() + invalid_months < total {
        tracing::debug!(
            "Dropped {} rows carrying the missing-value sentinel",
            total - invalid_months - cleaned.len()
        );
    }

    Ok(cleaned)
}

/// 以原始欄位名稱將清理後的資料寫回 CSV
pub fn write_cleaned_csv(records: &[TemperatureRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| FluxError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(city: &str, state: Option<&str>, day: u32, year: i32, temp_f: f64) -> RawTemperatureRecord {
        RawTemperatureRecord {
            region: "North America".to_string(),
            country: "US".to_string(),
            state: state.map(str::to_string),
            city: city.to_string(),
            month: 1,
            day,
            year,
            avg_temperature: temp_f,
        }
    }

    #[test]
    fn test_parse_temperature_csv_with_empty_state() {
        let csv = "Region,Country,State,City,Month,Day,Year,AvgTemperature\n\
                   Europe,Russia,,Moscow,1,1,1995,21.2\n\
                   North America,US,California,Los Angeles,1,2,1995,58.1\n";
        let records = parse_temperature_csv(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, None);
        assert_eq!(records[1].state.as_deref(), Some("California"));
        assert_eq!(records[1].avg_temperature, 58.1);
    }

    #[test]
    fn test_parse_temperature_csv_rejects_malformed_rows() {
        let csv = "Region,Country,State,City,Month,Day,Year,AvgTemperature\n\
                   Europe,Russia,,Moscow,January,1,1995,21.2\n";
        assert!(matches!(
            parse_temperature_csv(csv.as_bytes()),
            Err(FluxError::CsvError(_))
        ));
    }

    #[test]
    fn test_parse_city_lookup_ignores_extra_columns() {
        let csv = "name,state,population\nLos Angeles,California,3898747\nBoise,,235684\n";
        let lookup = parse_city_lookup_csv(csv.as_bytes()).unwrap();

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[0].state.as_deref(), Some("California"));
        assert_eq!(lookup[1].state, None);
    }

    #[test]
    fn test_state_fill_prefers_lookup() {
        let lookup = vec![
            CityStateMapping {
                name: "Birmingham".to_string(),
                state: Some("Alabama".to_string()),
            },
            CityStateMapping {
                name: "Nowhere".to_string(),
                state: None,
            },
        ];
        let rows = vec![
            raw("Birmingham", None, 1, 2000, 50.0),
            raw("Denver", Some("Colorado"), 1, 2000, 50.0),
            raw("Paris", None, 1, 2000, 50.0),
            raw("Nowhere", Some("Ohio"), 1, 2000, 50.0),
            raw("Austin", Some(""), 1, 2000, 50.0),
        ];

        let cleaned = preprocess(rows, &lookup, &CleanOptions::default()).unwrap();
        let states: Vec<&str> = cleaned.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, vec!["Alabama", "Colorado", "Unknown", "Unknown", "Unknown"]);
    }

    #[test]
    fn test_duplicate_lookup_names_use_last_entry() {
        let lookup = vec![
            CityStateMapping {
                name: "Springfield".to_string(),
                state: Some("Illinois".to_string()),
            },
            CityStateMapping {
                name: "Springfield".to_string(),
                state: Some("Missouri".to_string()),
            },
        ];
        let rows = vec![raw("Springfield", Some("Ohio"), 1, 2000, 50.0)];

        let cleaned = preprocess(rows, &lookup, &CleanOptions::default()).unwrap();
        assert_eq!(cleaned[0].state, "Missouri");
    }

    #[test]
    fn test_rows_outside_calendar_months_are_skipped() {
        let mut rows = vec![
            raw("A", None, 1, 2000, 50.0),
            raw("A", None, 2, 2000, 50.0),
            raw("A", None, 3, 2000, 50.0),
            raw("A", None, 4, 2000, -99.0),
        ];
        rows[1].month = 13;
        rows[2].month = 0;

        let cleaned = preprocess(rows, &[], &CleanOptions::default()).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].day, 1);
        assert_eq!(cleaned[0].month, 1);
    }

    #[test]
    fn test_day_and_year_anomalies_are_repaired() {
        let rows = vec![
            raw("A", None, 0, 201, 50.0),
            raw("A", None, 2, 1999, 50.0),
            raw("A", None, 3, 200, 50.0),
            raw("A", None, 4, 2001, 50.0),
            raw("A", None, 5, 2025, 50.0),
        ];

        let cleaned = preprocess(rows, &[], &CleanOptions::default()).unwrap();
        let years: Vec<i32> = cleaned.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![1999, 1999, 1999, 2001, 2001]);
        assert_eq!(cleaned[0].day, 1);
        assert_eq!(cleaned[1].day, 2);
    }

    #[test]
    fn test_no_valid_year_is_an_error() {
        let rows = vec![raw("A", None, 1, 200, 50.0), raw("A", None, 2, 201, 50.0)];
        let result = preprocess(rows, &[], &CleanOptions::default());
        assert!(matches!(result, Err(FluxError::ProcessingError { .. })));
    }

    #[test]
    fn test_sentinel_rows_are_dropped_and_units_converted() {
        let rows = vec![
            raw("A", None, 1, 2000, 32.0),
            raw("A", None, 2, 2000, -99.0),
            raw("A", None, 3, 2000, 212.0),
        ];

        let cleaned = preprocess(rows.clone(), &[], &CleanOptions::default()).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert!((cleaned[0].avg_temperature - 0.0).abs() < 1e-9);
        assert!((cleaned[1].avg_temperature - 100.0).abs() < 1e-9);

        let keep_all = CleanOptions {
            missing_sentinel: None,
            ..CleanOptions::default()
        };
        let cleaned = preprocess(rows, &[], &keep_all).unwrap();
        assert_eq!(cleaned.len(), 3);
        assert!((cleaned[1].avg_temperature - (-72.777_777)).abs() < 1e-3);
    }

    #[test]
    fn test_write_cleaned_csv_uses_source_headers() {
        let cleaned = preprocess(vec![raw("Boise", Some("Idaho"), 7, 2010, 50.0)], &[], &CleanOptions::default())
            .unwrap();
        let bytes = write_cleaned_csv(&cleaned).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Region,Country,State,City,Month,Day,Year,AvgTemperature")
        );
        assert_eq!(lines.next(), Some("North America,US,Idaho,Boise,1,7,2010,10.0"));
    }
}

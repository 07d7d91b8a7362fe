use clap::Parser;
use httpmock::prelude::*;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;
use world_in_flux::core::Pipeline;
use world_in_flux::utils::validation::Validate;
use world_in_flux::{CliConfig, EtlEngine, FluxError, FluxPipeline, LocalStorage, TomlConfig};

const TEMPERATURES: &str = "\
Region,Country,State,City,Month,Day,Year,AvgTemperature
Asia,Pakistan,,Karachi,1,1,2019,68.0
Asia,Pakistan,,Karachi,7,1,2019,95.0
Asia,Pakistan,,Karachi,1,1,2020,-99
Europe,Russia,,Moscow,1,1,2019,14.0
Europe,Russia,,Moscow,7,0,2019,77.0
North America,US,,Los Angeles,1,1,2019,59.0
North America,US,,Los Angeles,7,1,2019,86.0
North America,US,Texas,Houston,7,1,2019,95.0
";

const GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"ADMIN": "Pakistan"},
      "geometry": {"type": "Polygon", "coordinates": [[[61.0, 24.0], [76.0, 24.0], [76.0, 37.0], [61.0, 37.0], [61.0, 24.0]]]}
    },
    {
      "type": "Feature",
      "properties": {"ADMIN": "Russia"},
      "geometry": {"type": "Polygon", "coordinates": [[[30.0, 45.0], [180.0, 45.0], [180.0, 77.0], [30.0, 77.0], [30.0, 45.0]]]}
    }
  ]
}"#;

fn write_input(dir: &TempDir) -> String {
    let path = dir.path().join("city_temperature.csv");
    std::fs::write(&path, TEMPERATURES).unwrap();
    path.to_str().unwrap().to_string()
}

fn read_zip_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_with_remote_lookup_and_geometry() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);
    let output_path = temp_dir.path().join("output");
    let output_path = output_path.to_str().unwrap();

    let server = MockServer::start();
    let lookup_mock = server.mock(|when, then| {
        when.method(GET).path("/cities.csv");
        then.status(200)
            .body("name,state\nLos Angeles,California\nHouston,\n");
    });
    let geometry_mock = server.mock(|when, then| {
        when.method(GET).path("/world.geojson");
        then.status(200)
            .header("Content-Type", "application/geo+json")
            .body(GEOJSON);
    });

    let config = CliConfig::parse_from([
        "world-in-flux",
        "--input",
        &input,
        "--city-lookup",
        &server.url("/cities.csv"),
        "--world-geometry",
        &server.url("/world.geojson"),
        "--output-path",
        output_path,
        "--extreme",
        "max",
    ]);
    assert!(config.validate().is_ok());

    let pipeline = FluxPipeline::new(LocalStorage::new(temp_dir.path()), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, false);
    let result = engine.run().await.unwrap();

    lookup_mock.assert();
    geometry_mock.assert();
    assert!(result.ends_with("world_in_flux.zip"));

    let zip_path = Path::new(output_path).join("world_in_flux.zip");
    assert!(zip_path.exists());
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(std::fs::read(&zip_path).unwrap())).unwrap();

    let file_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    for expected in [
        "avg_temp_by_region.svg",
        "seasonal_trends_by_region.svg",
        "temp_trends_by_city.svg",
        "global_temperature_heatmap.svg",
        "cleaned_data.csv",
        "summary.json",
        "report.md",
    ] {
        assert!(file_names.contains(&expected.to_string()), "missing {}", expected);
        assert!(Path::new(output_path).join(expected).exists());
    }

    let cleaned = read_zip_entry(&mut archive, "cleaned_data.csv");
    assert!(cleaned.starts_with("Region,Country,State,City,Month,Day,Year,AvgTemperature"));
    assert!(cleaned.contains("Los Angeles"));
    assert!(cleaned.contains("California"));
    // Houston 在對照表中州別為空
    assert!(!cleaned.contains("Texas"));
    assert!(cleaned.contains("Unknown"));
    assert!(!cleaned.contains("-99"));

    let summary: serde_json::Value =
        serde_json::from_str(&read_zip_entry(&mut archive, "summary.json")).unwrap();
    assert_eq!(summary["rows_read"], 8);
    assert_eq!(summary["rows_kept"], 7);
    assert_eq!(summary["rows_dropped"], 1);
    assert_eq!(summary["extremum"], "max");
    assert_eq!(summary["selected_year"], 2019);
    assert_eq!(summary["hottest_country"]["country"], "Pakistan");

    let heatmap = read_zip_entry(&mut archive, "global_temperature_heatmap.svg");
    assert!(heatmap.contains("<svg"));
    assert!(heatmap.contains("Pakistan"));

    let report = read_zip_entry(&mut archive, "report.md");
    assert!(report.contains("A World in `Flux`"));
    assert!(report.contains("Pakistan"));
}

#[tokio::test]
async fn test_toml_config_without_bundle_or_network() {
    let temp_dir = TempDir::new().unwrap();
    write_input(&temp_dir);

    let config = TomlConfig::from_toml_str(
        r#"
[source]
input = "city_temperature.csv"
city_lookup = ""
world_geometry = ""

[analysis]
regions = ["Europe"]
cities = ["Moscow"]

[load]
output_path = "results"
bundle = false

[report]
author = "Test Author"
"#,
    )
    .unwrap();
    assert!(config.validate().is_ok());

    let pipeline = FluxPipeline::new(LocalStorage::new(temp_dir.path()), config);
    let output = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(output, "results");
    let results = temp_dir.path().join("results");
    assert!(results.join("report.md").exists());
    assert!(results.join("global_temperature_heatmap.svg").exists());
    assert!(!results.join("world_in_flux.zip").exists());

    let report = std::fs::read_to_string(results.join("report.md")).unwrap();
    assert!(report.contains("Test Author"));
    assert!(report.contains("Moscow"));

    let summary: serde_json::Value =
        serde_json::from_slice(&std::fs::read(results.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["seasonal"].as_array().unwrap().len(), 1);
    assert_eq!(summary["seasonal"][0]["region"], "Europe");
    assert_eq!(summary["city_peaks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_strict_lookup_failure_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);
    let output_path = temp_dir.path().join("output");

    let server = MockServer::start();
    let lookup_mock = server.mock(|when, then| {
        when.method(GET).path("/cities.csv");
        then.status(404);
    });

    let config = CliConfig::parse_from([
        "world-in-flux",
        "--input",
        &input,
        "--city-lookup",
        &server.url("/cities.csv"),
        "--no-geometry",
        "--strict-lookup",
        "--output-path",
        output_path.to_str().unwrap(),
    ]);

    let pipeline = FluxPipeline::new(LocalStorage::new(temp_dir.path()), config);
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    lookup_mock.assert();
    assert!(matches!(err, FluxError::HttpError(_)));
    assert!(!output_path.exists());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir);
    let output_path = temp_dir.path().join("output");

    let config = CliConfig::parse_from([
        "world-in-flux",
        "--input",
        &input,
        "--no-city-lookup",
        "--no-geometry",
        "--output-path",
        output_path.to_str().unwrap(),
        "--dry-run",
    ]);

    let pipeline = FluxPipeline::new(LocalStorage::new(temp_dir.path()), config);
    let artifacts = EtlEngine::new(pipeline).dry_run().await.unwrap();

    assert_eq!(artifacts.len(), 7);
    assert!(artifacts.iter().all(|(_, size)| *size > 0));
    assert!(!output_path.exists());
}

#[tokio::test]
async fn test_malformed_input_is_a_data_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.csv");
    std::fs::write(
        &path,
        "Region,Country,State,City,Month,Day,Year,AvgTemperature\nAsia,Pakistan,,Karachi,one,1,2019,68.0\n",
    )
    .unwrap();

    let config = CliConfig::parse_from([
        "world-in-flux",
        "--input",
        path.to_str().unwrap(),
        "--no-city-lookup",
        "--no-geometry",
    ]);

    let pipeline = FluxPipeline::new(LocalStorage::new(temp_dir.path()), config);
    let err = pipeline.extract().await.unwrap_err();

    assert!(matches!(err, FluxError::CsvError(_)));
    assert_eq!(err.category(), world_in_flux::utils::error::ErrorCategory::Data);
}

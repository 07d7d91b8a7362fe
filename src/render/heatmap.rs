use crate::domain::model::{CountryAverage, CountryShape, WorldGeometry};
use crate::render::charts::Figure;
use crate::render::palette::{to_hex, Palette, ANNOTATION};
use crate::utils::error::{FluxError, Result};
use plotters::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

pub const HEATMAP_FILE: &str = "global_temperature_heatmap.svg";

const FONT: &str = "sans-serif";
const NAME_PROPERTIES: [&str; 3] = ["ADMIN", "NAME", "name"];
const TILE_COLUMNS: usize = 12;

fn parse_ring(value: &Value) -> Option<Vec<(f64, f64)>> {
    value
        .as_array()?
        .iter()
        .map(|point| {
            let point = point.as_array()?;
            Some((point.first()?.as_f64()?, point.get(1)?.as_f64()?))
        })
        .collect()
}

/// 只保留外環 (第一個 ring)，內部的洞不填色
fn exterior_ring(polygon: &Value) -> Option<Vec<(f64, f64)>> {
    parse_ring(polygon.as_array()?.first()?)
}

fn feature_rings(geometry: &Value) -> Option<Vec<Vec<(f64, f64)>>> {
    let coordinates = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => Some(vec![exterior_ring(coordinates)?]),
        "MultiPolygon" => coordinates.as_array()?.iter().map(exterior_ring).collect(),
        _ => None,
    }
}

impl WorldGeometry {
    /// Parses a GeoJSON FeatureCollection of country polygons.
    ///
    /// Country names come from the `ADMIN` property (falling back to `NAME`
    /// and `name`). Features without a name or with a geometry other than
    /// `Polygon`/`MultiPolygon` are skipped.
    pub fn from_geojson(data: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(data)?;
        let features = document
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| FluxError::GeometryError {
                message: "GeoJSON document has no 'features' array".to_string(),
            })?;

        let mut countries = Vec::with_capacity(features.len());
        let mut skipped = 0usize;

        for feature in features {
            let name = feature.get("properties").and_then(|props| {
                NAME_PROPERTIES
                    .iter()
                    .find_map(|key| props.get(*key).and_then(Value::as_str))
            });
            let rings = feature.get("geometry").and_then(feature_rings);

            match (name, rings) {
                (Some(name), Some(rings)) if !rings.is_empty() => countries.push(CountryShape {
                    name: name.to_string(),
                    rings,
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} GeoJSON features without usable geometry", skipped);
        }

        Ok(Self { countries })
    }

    pub fn find(&self, name: &str) -> Option<&CountryShape> {
        self.countries.iter().find(|c| c.name == name)
    }
}

/// 依各國平均值的線性色階
struct HeatScale {
    palette: Palette,
    min: f64,
    max: f64,
}

impl HeatScale {
    fn new(averages: &[CountryAverage]) -> Self {
        let (min, max) = averages
            .iter()
            .map(|c| c.avg_temperature)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min, max) = if min > max {
            (0.0, 1.0)
        } else if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        Self {
            palette: Palette::global_heatmap(),
            min,
            max,
        }
    }

    fn color(&self, value: f64) -> RGBColor {
        self.palette.sample((value - self.min) / (self.max - self.min))
    }
}

/// Choropleth of mean temperature per country.
///
/// Countries are joined to the averages by exact name; countries without
/// data are drawn white. Without geometry a ranked tile grid is drawn
/// instead so the figure always exists.
pub fn heatmap(
    averages: &[CountryAverage],
    hottest: Option<&CountryAverage>,
    world: Option<&WorldGeometry>,
    figure: &Figure,
) -> Result<String> {
    let err = |e: &dyn std::fmt::Display| FluxError::render(HEATMAP_FILE, e);
    let scale = HeatScale::new(averages);
    tracing::debug!(
        "Heat scale {:.1}°C ({}) to {:.1}°C ({})",
        scale.min,
        to_hex(scale.color(scale.min)),
        scale.max,
        to_hex(scale.color(scale.max))
    );
    let annotation_style = (FONT, 20).into_font().color(&ANNOTATION);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (figure.width, figure.height)).into_drawing_area();
        root.fill(&figure.background).map_err(|e| err(&e))?;

        let root = root
            .titled("Global Temperature Heatmap", (FONT, 40))
            .map_err(|e| err(&e))?;
        let map_height = figure.height.saturating_sub(60) * 85 / 100;
        let (upper, lower) = root.split_vertically(map_height);

        match world {
            Some(world) if !world.countries.is_empty() => {
                let by_name: HashMap<&str, f64> = averages
                    .iter()
                    .map(|c| (c.country.as_str(), c.avg_temperature))
                    .collect();

                let mut chart = ChartBuilder::on(&upper)
                    .margin(20)
                    .build_cartesian_2d(-180f64..180f64, -90f64..90f64)
                    .map_err(|e| err(&e))?;

                for shape in &world.countries {
                    let fill = country_fill(&by_name, &scale, &shape.name);

                    chart
                        .draw_series(
                            shape
                                .rings
                                .iter()
                                .map(|ring| Polygon::new(ring.clone(), fill.filled())),
                        )
                        .map_err(|e| err(&e))?;
                    chart
                        .draw_series(shape.rings.iter().map(|ring| {
                            let mut outline = ring.clone();
                            if let Some(first) = ring.first() {
                                outline.push(*first);
                            }
                            PathElement::new(outline, BLACK.stroke_width(1))
                        }))
                        .map_err(|e| err(&e))?;
                }

                if let Some(hot) = hottest {
                    match world.find(&hot.country).and_then(CountryShape::center) {
                        Some(center) => {
                            chart
                                .draw_series(std::iter::once(
                                    EmptyElement::at(center)
                                        + Circle::new((0, 0), 4, ANNOTATION.filled())
                                        + PathElement::new(vec![(4, 4), (70, 90)], ANNOTATION.stroke_width(1))
                                        + Text::new(hot.country.clone(), (72, 92), annotation_style.clone())
                                        + Text::new(
                                            format!("{:.1}°C", hot.avg_temperature),
                                            (72, 116),
                                            annotation_style.clone(),
                                        ),
                                ))
                                .map_err(|e| err(&e))?;
                        }
                        None => draw_hottest_caption(&upper, hot, &annotation_style)
                            .map_err(|e| err(&e))?,
                    }
                }
            }
            _ => {
                draw_tile_grid(&upper, averages, &scale, hottest, &annotation_style)
                    .map_err(|e| err(&e))?;
                if let Some(hot) = hottest {
                    draw_hottest_caption(&upper, hot, &annotation_style).map_err(|e| err(&e))?;
                }
            }
        }

        draw_color_bar(&lower, &scale).map_err(|e| err(&e))?;

        root.present().map_err(|e| err(&e))?;
    }
    Ok(svg)
}

type AreaResult = std::result::Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// 沒有資料的國家填白色
fn country_fill(by_name: &HashMap<&str, f64>, scale: &HeatScale, country: &str) -> RGBColor {
    by_name
        .get(country)
        .map(|v| scale.color(*v))
        .unwrap_or(WHITE)
}

/// 最熱國家沒有輪廓可標註時，寫在圖的左上角
fn draw_hottest_caption(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    hottest: &CountryAverage,
    annotation_style: &TextStyle<'_>,
) -> AreaResult {
    let text = format!(
        "Hottest: {} {:.1}°C",
        hottest.country, hottest.avg_temperature
    );
    area.draw_text(&text, annotation_style, (30, 10))
}

/// 沒有地圖輪廓時，依溫度由高到低排成方塊
fn draw_tile_grid(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    averages: &[CountryAverage],
    scale: &HeatScale,
    hottest: Option<&CountryAverage>,
    annotation_style: &TextStyle<'_>,
) -> AreaResult {
    if averages.is_empty() {
        return area.draw_text("No Data", annotation_style, (30, 10));
    }

    let mut ranked: Vec<&CountryAverage> = averages.iter().collect();
    ranked.sort_by(|a, b| b.avg_temperature.total_cmp(&a.avg_temperature));

    let columns = TILE_COLUMNS.min(ranked.len());
    let rows = ranked.len().div_ceil(columns);

    // 上方留給最熱國家的標註
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .margin_top(44)
        .build_cartesian_2d(0f64..columns as f64, 0f64..rows as f64)?;

    let label_style = (FONT, 12).into_font().color(&BLACK);
    for (i, country) in ranked.iter().enumerate() {
        let column = (i % columns) as f64;
        let top = (rows - i / columns) as f64;
        let is_hottest = hottest.is_some_and(|h| h.country == country.country);

        chart.draw_series(std::iter::once(Rectangle::new(
            [(column + 0.03, top - 0.97), (column + 0.97, top - 0.03)],
            scale.color(country.avg_temperature).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(column + 0.03, top - 0.97), (column + 0.97, top - 0.03)],
            if is_hottest {
                ANNOTATION.stroke_width(3)
            } else {
                BLACK.stroke_width(1)
            },
        )))?;
        chart.draw_series(std::iter::once(
            EmptyElement::at((column + 0.08, top - 0.1))
                + Text::new(country.country.clone(), (0, 0), label_style.clone())
                + Text::new(
                    format!("{:.1}°C", country.avg_temperature),
                    (0, 16),
                    label_style.clone(),
                ),
        ))?;
    }

    Ok(())
}

fn draw_color_bar(area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>, scale: &HeatScale) -> AreaResult {
    let steps = scale.palette.len().max(1);
    let span = scale.max - scale.min;

    let mut chart = ChartBuilder::on(area)
        .margin_left(220)
        .margin_right(220)
        .margin_top(10)
        .x_label_area_size(30)
        .build_cartesian_2d(scale.min..scale.max, 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(6)
        .x_label_formatter(&|v| format!("{:.0}°C", v))
        .draw()?;

    chart.draw_series((0..steps).map(|i| {
        let x0 = scale.min + span * i as f64 / steps as f64;
        let x1 = scale.min + span * (i + 1) as f64 / steps as f64;
        Rectangle::new([(x0, 0.0), (x1, 1.0)], scale.palette.color(i).filled())
    }))?;

    // 無資料圖例
    area.draw(&Rectangle::new([(30, 14), (60, 34)], WHITE.filled()))?;
    area.draw(&Rectangle::new([(30, 14), (60, 34)], BLACK.stroke_width(1)))?;
    area.draw_text("No Data", &(FONT, 16).into_font().color(&BLACK), (68, 16))?;

    Ok(())
}

use crate::utils::error::{FluxError, Result};
use plotters::style::RGBColor;

/// 區域平均長條圖的填色
pub const BAR_FILL: RGBColor = RGBColor(0xC7, 0xE1, 0x71);
pub const ANNOTATION: RGBColor = RGBColor(0xFF, 0x00, 0x00);

/// 以索引取色的固定色盤
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: &'static str,
    colors: Vec<RGBColor>,
}

impl Palette {
    fn from_hex(name: &'static str, hex: &[&str]) -> Self {
        let colors = hex
            .iter()
            .filter_map(|h| parse_hex_color(h).ok())
            .collect();
        Self { name, colors }
    }

    pub fn seasonal_trends() -> Self {
        Self::from_hex(
            "seasonal_trends",
            &["C77CFF", "FEA903", "C7E171", "FFDAB9", "CCE2CE", "FFF200", "DCD0FF"],
        )
    }

    pub fn temperature_trends() -> Self {
        Self::from_hex("temperature_trends", &["C7E171", "C77CFF", "FEA903", "E0EAFF"])
    }

    /// `#FEA9xx` with the blue channel stepping 16, 40, ..., 232.
    pub fn global_heatmap() -> Self {
        let colors = (16u16..256)
            .step_by(24)
            .map(|blue| RGBColor(0xFE, 0xA9, blue as u8))
            .collect();
        Self {
            name: "global_heatmap",
            colors,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// 超出範圍的索引沿用最後一個顏色
    pub fn color(&self, index: usize) -> RGBColor {
        match self.colors.len() {
            0 => RGBColor(0, 0, 0),
            n => self.colors[index.min(n - 1)],
        }
    }

    /// 將 `[0, 1]` 的 `t` 對應到色盤，超出範圍的值會被夾住
    pub fn sample(&self, t: f64) -> RGBColor {
        let n = self.colors.len();
        if n == 0 {
            return RGBColor(0, 0, 0);
        }
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let index = ((t * n as f64).floor() as usize).min(n - 1);
        self.colors[index]
    }
}

pub fn parse_hex_color(value: &str) -> Result<RGBColor> {
    let digits = value.trim_start_matches('#');
    let invalid = || FluxError::InvalidConfigValueError {
        field: "face_color".to_string(),
        value: value.to_string(),
        reason: "Expected a color of 6 hex digits, e.g. FFFFFF".to_string(),
    };

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02X}{:02X}{:02X}", color.0, color.1, color.2)
}

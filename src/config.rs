use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripConfig {
    pub aggregator: AggregatorConfig,
    pub export: ExportConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Ceiling for the displayed speed. This only guards the display against
    /// sensor spikes, it says nothing about what the vehicle can do.
    pub max_speed_kmh: f64,
    /// Position deltas at or below this are treated as GPS jitter.
    pub jitter_threshold_m: f64,
    /// Samples at or below this speed do not count towards the average.
    pub stationary_speed_kmh: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            max_speed_kmh: 220.0,
            jitter_threshold_m: 0.5,
            stationary_speed_kmh: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    Standard,
    MutedStandard,
    Satellite,
    Hybrid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    // in map units, applied on each side of the route, must be positive
    pub padding_map_units: f64,
    pub stroke_width: f32,
    pub accent_color: [u8; 4],
    pub show_buildings: bool,
    pub map_type: MapType,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            width: 1200,
            height: 1200,
            padding_map_units: 1000.0,
            stroke_width: 5.0,
            accent_color: [0, 122, 255, 255],
            show_buildings: true,
            map_type: MapType::Standard,
        }
    }
}

impl TripConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TripConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config {}: {}", path.display(), e))?;
        let config = Self::from_json_str(&json)?;
        info!("loaded trip config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let aggregator = &self.aggregator;
        if !(aggregator.max_speed_kmh > 0.0) {
            bail!("max_speed_kmh must be positive");
        }
        if !(aggregator.jitter_threshold_m >= 0.0) || !(aggregator.stationary_speed_kmh >= 0.0) {
            bail!("aggregator thresholds must not be negative");
        }

        let export = &self.export;
        if export.width == 0 || export.height == 0 {
            bail!(
                "invalid export size: {}x{}",
                export.width,
                export.height
            );
        }
        if !(export.padding_map_units > 0.0) {
            bail!("padding_map_units must be positive");
        }
        if !(export.stroke_width > 0.0) {
            bail!("stroke_width must be positive");
        }
        Ok(())
    }
}

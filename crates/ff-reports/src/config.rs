//! Run configuration for the plotting programs.
//!
//! Loads a YAML file with `${VAR}` and `${VAR:-default}` environment
//! substitution. Every field has a default, so a file only needs the keys it
//! changes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ff_common::layout;
use ff_common::{AccumulationPeriod, BoundingBox};
use projection::Crs;
use renderer::{CoastStyle, SymbolTable, TextStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config/flash_floods.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root that all relative data and plot paths are resolved against.
    pub repo_root: PathBuf,
    pub mask_path: PathBuf,
    pub timeseries: TimeseriesConfig,
    pub map: MapConfig,
    pub rendering: RenderingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("/ec/vol/ecpoint_dev/mofp/phd/probability_of_flash_flood"),
            mask_path: PathBuf::from("data/raw/mask/usa_era5.grib"),
            timeseries: TimeseriesConfig::default(),
            map: MapConfig::default(),
            rendering: RenderingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeseriesConfig {
    pub year_start: i32,
    pub year_end: i32,
    /// Directory of the gridded report files.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Draw the grid-cell counts next to the point counts.
    pub show_grid_series: bool,
    pub dpi: f64,
}

impl Default for TimeseriesConfig {
    fn default() -> Self {
        Self {
            year_start: 2021,
            year_end: 2021,
            input_dir: PathBuf::from("data/processed/03_grid_acc_reports_ff"),
            output_dir: PathBuf::from("data/plot/12_timeseries_point_grid_ff"),
            show_grid_series: false,
            // The published charts were saved at 1000 dpi
            dpi: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Write a PNG under the output directory
    File,
    /// Show the plot in an external viewer and wait for it to close
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Start of the accumulation period as `YYYYMMDDHH`.
    pub period_start: String,
    /// `[south, west, north, east]` in degrees
    pub domain: Vec<f64>,
    pub crs: Crs,
    pub output_mode: OutputMode,
    pub point_dir: PathBuf,
    pub grid_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Output width in pixels
    pub width: u32,
    /// Command that opens a PNG path in interactive mode.
    pub viewer: String,
    pub layers: LayersConfig,
    pub coast: CoastStyle,
    pub title_style: TextStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            period_start: "2021090100".to_string(),
            domain: vec![22.0, -130.0, 52.0, -60.0],
            crs: Crs::Epsg3857,
            output_mode: OutputMode::File,
            point_dir: PathBuf::from("data/processed/02_point_acc_reports_ff"),
            grid_dir: PathBuf::from("data/processed/03_grid_acc_reports_ff"),
            output_dir: PathBuf::from("data/plot/13_map_point_grid_ff"),
            width: 5000,
            viewer: "display".to_string(),
            layers: LayersConfig::default(),
            coast: CoastStyle::default(),
            title_style: TextStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub enabled: bool,
    pub symbols: SymbolTable,
}

/// The three overlay layers, drawn in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    pub domain_points: LayerConfig,
    pub grid_reports: LayerConfig,
    pub point_reports: LayerConfig,
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            domain_points: LayerConfig {
                enabled: true,
                symbols: SymbolTable::domain_points(),
            },
            grid_reports: LayerConfig {
                enabled: false,
                symbols: SymbolTable::grid_reports(),
            },
            point_reports: LayerConfig {
                enabled: true,
                symbols: SymbolTable::point_reports(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// TrueType font for titles and labels. Text is skipped without one.
    pub font_path: Option<PathBuf>,
    /// GeoJSON coastlines and land polygons
    pub coastline_path: Option<PathBuf>,
    /// GeoJSON political boundaries
    pub boundaries_path: Option<PathBuf>,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            font_path: Some(PathBuf::from(
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            )),
            coastline_path: None,
            boundaries_path: None,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config in {:?}", path))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!(path = %path.display(), "Config file not found, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Config =
            serde_yaml::from_str(&expanded).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ts = &self.timeseries;
        anyhow::ensure!(
            ts.year_start <= ts.year_end,
            "timeseries.year_start ({}) must not be after year_end ({})",
            ts.year_start,
            ts.year_end
        );
        anyhow::ensure!(
            ts.dpi.is_finite() && ts.dpi > 0.0,
            "timeseries.dpi must be greater than 0, got {}",
            ts.dpi
        );

        self.map_domain()?;
        self.map_period()?;
        anyhow::ensure!(self.map.width > 0, "map.width must be greater than 0");
        anyhow::ensure!(
            self.map.output_mode == OutputMode::File || !self.map.viewer.trim().is_empty(),
            "map.viewer is required for interactive output"
        );
        Ok(())
    }

    /// Resolve a configured path against `repo_root`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        layout::resolve(&self.repo_root, path)
    }

    pub fn map_domain(&self) -> Result<BoundingBox> {
        BoundingBox::from_swne(&self.map.domain).context("Invalid map.domain")
    }

    pub fn map_period(&self) -> Result<AccumulationPeriod> {
        AccumulationPeriod::parse_start(&self.map.period_start).context("Invalid map.period_start")
    }
}

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::Color;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.map.width, 5000);
        assert_eq!(config.map.crs, Crs::Epsg3857);
        assert!(!config.timeseries.show_grid_series);
        assert!(!config.map.layers.grid_reports.enabled);
    }

    #[test]
    fn test_default_dpi_matches_chart_style() {
        let config = Config::default();
        assert_eq!(config.timeseries.dpi, 100.0);
        assert_eq!(config.timeseries.dpi, renderer::ChartStyle::default().dpi);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::from_yaml(include_str!("../../../config/flash_floods.yaml")).unwrap();
        let defaults = Config::default();

        assert_eq!(config.mask_path, defaults.mask_path);
        assert_eq!(config.timeseries, defaults.timeseries);
        assert_eq!(config.map.layers, defaults.map.layers);
        assert_eq!(config.map.coast, defaults.map.coast);
        assert_eq!(config.map.domain, defaults.map.domain);
        assert_eq!(config.map.width, defaults.map.width);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "repo_root: /data/ff\n\
             timeseries:\n  year_start: 2019\n  year_end: 2021\n  show_grid_series: true\n\
             map:\n  output_mode: interactive\n  crs: plate_carree\n",
        )
        .unwrap();

        assert_eq!(config.repo_root, PathBuf::from("/data/ff"));
        assert_eq!(config.timeseries.year_start, 2019);
        assert!(config.timeseries.show_grid_series);
        assert_eq!(config.timeseries.dpi, 100.0);
        assert_eq!(config.map.output_mode, OutputMode::Interactive);
        assert_eq!(config.map.crs, Crs::Epsg4326);
        assert_eq!(config.map.period_start, "2021090100");
    }

    #[test]
    fn test_symbol_tables_from_yaml() {
        let config = Config::from_yaml(
            "map:\n  layers:\n    point_reports:\n      enabled: true\n      symbols:\n        \
             - { min: -0.1, max: 0.1, marker: 15, colour: \"rgb(0,0,1)\", height_cm: 0.25 }\n",
        )
        .unwrap();

        let rule = config.map.layers.point_reports.symbols.select(0.0).unwrap();
        assert_eq!(rule.colour, Color::rgb(0, 0, 255));
        assert_eq!(rule.height_cm, 0.25);
        assert!(rule.outline);
        // Untouched layers keep their defaults
        assert!(config.map.layers.domain_points.enabled);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("FF_CONFIG_TEST_ROOT", "/scratch/ff");
        std::env::remove_var("FF_CONFIG_TEST_WIDTH");
        let config = Config::from_yaml(
            "repo_root: ${FF_CONFIG_TEST_ROOT}\nmap:\n  width: ${FF_CONFIG_TEST_WIDTH:-1200}\n",
        )
        .unwrap();
        assert_eq!(config.repo_root, PathBuf::from("/scratch/ff"));
        assert_eq!(config.map.width, 1200);
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("FF_CONFIG_TEST_REQUIRED");
        assert!(expand_env_vars("${FF_CONFIG_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_validation_failures() {
        let reversed_years = "timeseries:\n  year_start: 2022\n  year_end: 2021\n";
        assert!(Config::from_yaml(reversed_years).is_err());

        let flipped_domain = "map:\n  domain: [52, -130, 22, -60]\n";
        assert!(Config::from_yaml(flipped_domain).is_err());

        assert!(Config::from_yaml("map:\n  width: 0\n").is_err());
        assert!(Config::from_yaml("timeseries:\n  dpi: 0\n").is_err());
        assert!(Config::from_yaml("map:\n  period_start: yesterday\n").is_err());
        assert!(Config::from_yaml("map:\n  crs: epsg:5070\n").is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());

        let path = dir.path().join("flash_floods.yaml");
        fs::write(&path, "map:\n  width: 800\n").unwrap();
        assert_eq!(Config::load_or_default(&path).unwrap().map.width, 800);
    }

    #[test]
    fn test_resolve_against_repo_root() {
        let config = Config {
            repo_root: PathBuf::from("/repo"),
            ..Config::default()
        };
        assert_eq!(
            config.resolve(&config.mask_path),
            PathBuf::from("/repo/data/raw/mask/usa_era5.grib")
        );
    }
}

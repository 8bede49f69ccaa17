//! Flash-flood report aggregation and plotting pipelines.
//!
//! Reads the domain mask, daily report grids and point-report tables from
//! a date-keyed directory tree, reduces them to daily counts or map point
//! sets, and hands the result to a [`renderer::Renderer`].

pub mod aggregate;
pub mod config;
pub mod error;
pub mod map;
pub mod mask;
pub mod output;
pub mod overlay;
pub mod reader;
pub mod table;
pub mod timeseries;

pub use aggregate::{aggregate_range, aggregate_year, count_day, DailyCount, YearSeries};
pub use config::{Config, OutputMode, DEFAULT_CONFIG_PATH};
pub use error::{ReportsError, ReportsResult};
pub use map::{run_map, MapOutput};
pub use mask::{load_domain_mask, DomainMask};
pub use overlay::{build_overlay, Overlay};
pub use reader::{Grib2GridReader, GridReader};
pub use timeseries::run_timeseries;

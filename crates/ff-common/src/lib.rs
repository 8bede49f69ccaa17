//! Common types shared by the flash-flood report plotting crates.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;
pub mod layout;
pub mod period;
pub mod points;

pub use bbox::BoundingBox;
pub use error::{CommonError, CommonResult};
pub use field::GeoField;
pub use grid::{normalize_lon, GridPoint, GridSpec, ScanMode};
pub use layout::DataCategory;
pub use period::{days_in_year, periods_in_year, AccumulationPeriod, ACCUMULATION_HOURS};
pub use points::{GeoPoint, GeoPoints};

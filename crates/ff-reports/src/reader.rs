//! Grid file access behind a trait, so pipelines can be fed in-memory grids.

use std::io::ErrorKind;
use std::path::Path;

use ff_common::GeoField;
use grib2_parser::{read_first_field, Grib2Error};
use tracing::debug;

use crate::error::{ReportsError, ReportsResult};

/// Reads the first field of a gridded data file.
pub trait GridReader {
    fn read_field(&self, path: &Path) -> ReportsResult<GeoField>;
}

/// Reads GRIB2 files with the in-workspace decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grib2GridReader;

impl GridReader for Grib2GridReader {
    fn read_field(&self, path: &Path) -> ReportsResult<GeoField> {
        match read_first_field(path) {
            Ok(grib) => {
                debug!(
                    path = %path.display(),
                    points = grib.field.len(),
                    reference_time = %grib.reference_time,
                    "Read grid"
                );
                Ok(grib.field)
            }
            Err(Grib2Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(ReportsError::MissingInput(path.to_path_buf()))
            }
            Err(source) => Err(ReportsError::Grid {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

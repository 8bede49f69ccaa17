//! GRIB2 parser (WMO FM 92 GRIB Edition 2).
//!
//! Reads the regular lat/lon grids the flash-flood report data is stored
//! in: message splitting, section parsing, simple unpacking with bitmaps,
//! and the geometry needed to place every value on the map.

pub mod sections;
pub mod unpacking;

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use ff_common::{CommonError, GeoField, GridSpec, ScanMode};
use thiserror::Error;
use tracing::debug;

use sections::{
    Bitmap, DataRepresentation, DataSection, GridDefinition, Identification, Indicator,
    ProductDefinition, BITMAP_NONE, BITMAP_PRESENT, BITMAP_PREVIOUS,
};

pub use unpacking::{unpack_simple, unpack_with_grib_crate};

/// Template number of simple packing in Section 5.
pub const SIMPLE_PACKING: u16 = 0;

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unpacking failed: {0}")]
    UnpackingError(String),

    #[error("Unsupported template: {0}")]
    UnsupportedTemplate(String),

    #[error("No GRIB2 messages found")]
    NoMessages,

    #[error("Grid does not match its values: {0}")]
    Field(#[from] CommonError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    /// Resolved bitmap (a "previous bitmap" reference is already followed)
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    /// The whole message, for decoders that need it
    pub raw: Bytes,
}

impl Grib2Message {
    /// (rows, columns)
    pub fn grid_dims(&self) -> (usize, usize) {
        (
            self.grid_definition.num_points_latitude as usize,
            self.grid_definition.num_points_longitude as usize,
        )
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.identification.reference_time
    }

    /// Geometry of a template 3.0 grid.
    pub fn grid_spec(&self) -> Result<GridSpec, Grib2Error> {
        let gd = &self.grid_definition;
        if gd.template_number != 0 {
            return Err(Grib2Error::UnsupportedTemplate(format!(
                "grid definition template 3.{} (only 3.0 regular lat/lon is supported)",
                gd.template_number
            )));
        }

        let spec = GridSpec::from_increments(
            gd.num_points_longitude as usize,
            gd.num_points_latitude as usize,
            gd.longitude_increment_microdegrees as f64 / 1e6,
            gd.latitude_increment_microdegrees as f64 / 1e6,
            gd.first_longitude_microdegrees as f64 / 1e6,
            gd.first_latitude_microdegrees as f64 / 1e6,
            ScanMode::from_grib2_flag(gd.scanning_mode),
        );

        if spec.len() != gd.num_data_points as usize {
            return Err(Grib2Error::InvalidSection {
                section: 3,
                reason: format!(
                    "{} x {} grid does not hold {} points",
                    spec.nx, spec.ny, gd.num_data_points
                ),
            });
        }

        Ok(spec)
    }

    /// All grid values in storage order, NaN where missing.
    pub fn unpack_data(&self) -> Result<Vec<f32>, Grib2Error> {
        let dr = &self.data_representation;
        let num_points = self.grid_definition.num_data_points;

        if dr.template_number != SIMPLE_PACKING {
            debug!(
                template = dr.template_number,
                "Decoding data with grib crate"
            );
            let values = unpack_with_grib_crate(&self.raw)?;
            if values.len() != num_points as usize {
                return Err(Grib2Error::UnpackingError(format!(
                    "decoded {} values for {} grid points",
                    values.len(),
                    num_points
                )));
            }
            return Ok(values);
        }

        let bitmap = self.bitmap.as_ref().map(|b| b.data.as_ref());
        let values = unpack_simple(
            &self.data_section.data,
            num_points,
            dr.bits_per_value,
            dr.reference_value,
            dr.binary_scale_factor,
            dr.decimal_scale_factor,
            bitmap,
        )?;

        Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }

    /// Decode values and geometry together.
    pub fn to_field(&self) -> Result<Grib2Field, Grib2Error> {
        let spec = self.grid_spec()?;
        let values = self.unpack_data()?;
        Ok(Grib2Field {
            reference_time: self.reference_time(),
            discipline: self.indicator.discipline,
            parameter_category: self.product_definition.parameter_category,
            parameter_number: self.product_definition.parameter_number,
            field: GeoField::new(spec, values)?,
        })
    }
}

/// A decoded field with its metadata.
#[derive(Debug, Clone)]
pub struct Grib2Field {
    pub reference_time: DateTime<Utc>,
    pub discipline: u8,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub field: GeoField,
}

/// Sequential reader over the messages of a GRIB2 file.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    previous_bitmap: Option<Bitmap>,
}

impl Grib2Reader {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            previous_bitmap: None,
        }
    }

    /// Parse the next message, or `None` at end of file.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        // Skip padding between messages
        let start = match find_magic(&self.data[self.offset..]) {
            Some(pos) => self.offset + pos,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        let indicator = sections::parse_indicator(&self.data[start..])?;
        let length = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "message length {} does not fit in memory",
                indicator.message_length
            ))
        })?;

        if length < 16 + 4 || start + length > self.data.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "message at offset {} declares {} bytes but {} remain",
                start,
                length,
                self.data.len() - start
            )));
        }

        let raw = self.data.slice(start..start + length);
        self.offset = start + length;

        if &raw[length - 4..] != b"7777" {
            return Err(Grib2Error::InvalidFormat(
                "missing end marker 7777".to_string(),
            ));
        }

        let identification = sections::parse_identification(&raw)?;
        let grid_definition = sections::parse_grid_definition(&raw)?;
        let product_definition = sections::parse_product_definition(&raw)?;
        let data_representation = sections::parse_data_representation(&raw)?;
        let bitmap = self.resolve_bitmap(sections::parse_bitmap(&raw)?)?;
        let data_section = sections::parse_data_section(&raw)?;

        Ok(Some(Grib2Message {
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            data_section,
            raw,
        }))
    }

    fn resolve_bitmap(&mut self, bitmap: Bitmap) -> Result<Option<Bitmap>, Grib2Error> {
        match bitmap.indicator {
            BITMAP_NONE => Ok(None),
            BITMAP_PRESENT => {
                self.previous_bitmap = Some(bitmap.clone());
                Ok(Some(bitmap))
            }
            BITMAP_PREVIOUS => self.previous_bitmap.clone().map(Some).ok_or_else(|| {
                Grib2Error::InvalidSection {
                    section: 6,
                    reason: "refers to a previous bitmap but none was defined".to_string(),
                }
            }),
            other => Err(Grib2Error::UnsupportedTemplate(format!(
                "predefined bitmap {}",
                other
            ))),
        }
    }
}

fn find_magic(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"GRIB")
}

/// Read and decode the first field of a GRIB2 file.
pub fn read_first_field(path: impl AsRef<Path>) -> Result<Grib2Field, Grib2Error> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mut reader = Grib2Reader::new(Bytes::from(bytes));

    let message = reader.next_message()?.ok_or(Grib2Error::NoMessages)?;
    let field = message.to_field()?;

    debug!(
        path = %path.display(),
        points = field.field.len(),
        reference_time = %field.reference_time,
        "Read GRIB2 field"
    );

    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_messages() {
        let mut reader = Grib2Reader::new(Bytes::new());
        assert!(reader.next_message().unwrap().is_none());
    }

    #[test]
    fn test_truncated_message_is_rejected() {
        let mut data = b"GRIB".to_vec();
        data.extend_from_slice(&[0, 0, 0, 2]);
        data.extend_from_slice(&1000u64.to_be_bytes());
        let mut reader = Grib2Reader::new(Bytes::from(data));
        assert!(matches!(
            reader.next_message(),
            Err(Grib2Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_previous_bitmap_without_definition() {
        let mut reader = Grib2Reader::new(Bytes::new());
        let result = reader.resolve_bitmap(Bitmap {
            indicator: BITMAP_PREVIOUS,
            data: Bytes::new(),
        });
        assert!(result.is_err());
    }
}

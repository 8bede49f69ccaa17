//! GRIB2 section parsing.
//!
//! Each GRIB2 message consists of numbered sections. Section 0 is fixed at
//! the start of the message; the rest are located by walking the
//! length-prefixed section chain.

use crate::Grib2Error;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 3: Grid Definition Section
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template_number: u16,
    pub num_data_points: u32,
    pub grid_shape: u8,
    pub num_points_longitude: u32,
    pub num_points_latitude: u32,
    pub first_latitude_microdegrees: i32,
    pub first_longitude_microdegrees: i32,
    pub last_latitude_microdegrees: i32,
    pub last_longitude_microdegrees: i32,
    pub longitude_increment_microdegrees: u32,
    pub latitude_increment_microdegrees: u32,
    pub scanning_mode: u8,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template_number: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub forecast_time: u32,
    pub level_type: u8,
    pub level_value: u32,
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of packed values (excludes bitmap-absent points)
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

/// Bitmap indicator: a bitmap follows in this section.
pub const BITMAP_PRESENT: u8 = 0;
/// Bitmap indicator: reuse the bitmap of the previous message.
pub const BITMAP_PREVIOUS: u8 = 254;
/// Bitmap indicator: no bitmap, every point has a value.
pub const BITMAP_NONE: u8 = 255;

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}. Convert the file first, e.g. `grib_set -s edition=2 in.grib out.grib`",
            edition
        )));
    }

    let message_length = u64::from_be_bytes([
        data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
    ]);

    Ok(Indicator {
        discipline,
        edition,
        message_length,
    })
}

/// Parse Section 1 (Identification), always at offset 16.
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    const OFFSET: usize = 16;

    if data.len() < OFFSET + 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Not enough data".to_string(),
        });
    }
    if data[OFFSET + 4] != 1 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: format!("Expected section 1 at offset 16, found {}", data[OFFSET + 4]),
        });
    }

    // Skip section length (4 bytes) and section number (1 byte)
    let sec_data = &data[OFFSET + 5..];

    let center = u16::from_be_bytes([sec_data[0], sec_data[1]]);
    let sub_center = u16::from_be_bytes([sec_data[2], sec_data[3]]);
    let table_version = sec_data[4];
    let local_table_version = sec_data[5];
    let significance_of_reference_time = sec_data[6];

    let year = u16::from_be_bytes([sec_data[7], sec_data[8]]);
    let month = sec_data[9];
    let day = sec_data[10];
    let hour = sec_data[11];
    let minute = sec_data[12];
    let second = sec_data[13];

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    let reference_time = DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc);

    Ok(Identification {
        center,
        sub_center,
        table_version,
        local_table_version,
        significance_of_reference_time,
        reference_time,
        production_status: sec_data[14],
        data_type: sec_data[15],
    })
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let section_data = section_slice(data, 3)?;
    if section_data.len() < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    // Bytes 6-9: number of data points, 12-13: grid definition template
    let num_data_points = u32::from_be_bytes([
        section_data[6],
        section_data[7],
        section_data[8],
        section_data[9],
    ]);
    let template_number = u16::from_be_bytes([section_data[12], section_data[13]]);

    let gd = &section_data[14..];

    if template_number != 0 {
        // Only the dimensions sit at a common position across templates
        let ni = read_u32(gd, 16).unwrap_or(0);
        let nj = read_u32(gd, 20).unwrap_or(0);
        return Ok(GridDefinition {
            template_number,
            num_data_points,
            grid_shape: gd.first().copied().unwrap_or(0),
            num_points_longitude: ni,
            num_points_latitude: nj,
            first_latitude_microdegrees: 0,
            first_longitude_microdegrees: 0,
            last_latitude_microdegrees: 0,
            last_longitude_microdegrees: 0,
            longitude_increment_microdegrees: 0,
            latitude_increment_microdegrees: 0,
            scanning_mode: 0,
        });
    }

    // Template 3.0: Latitude/longitude (equidistant cylindrical)
    //
    // Byte 0: Shape of the Earth
    // Bytes 16-19: Ni, 20-23: Nj
    // Bytes 24-27: Basic angle, 28-31: Subdivisions
    // Bytes 32-35: La1, 36-39: Lo1 (signed, microdegrees)
    // Byte 40: Resolution and component flags
    // Bytes 41-44: La2, 45-48: Lo2 (signed, microdegrees)
    // Bytes 49-52: Di, 53-56: Dj (microdegrees)
    // Byte 57: Scanning mode
    if gd.len() < 58 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("Template 0 needs at least 58 bytes, got {}", gd.len()),
        });
    }

    // Angles are in microdegrees only when the basic angle is 0 or missing
    let basic_angle = u32::from_be_bytes([gd[24], gd[25], gd[26], gd[27]]);
    if basic_angle != 0 && basic_angle != 0xFFFF_FFFF {
        return Err(Grib2Error::UnsupportedTemplate(format!(
            "Grid template 3.0 with basic angle {}",
            basic_angle
        )));
    }

    Ok(GridDefinition {
        template_number,
        num_data_points,
        grid_shape: gd[0],
        num_points_longitude: u32::from_be_bytes([gd[16], gd[17], gd[18], gd[19]]),
        num_points_latitude: u32::from_be_bytes([gd[20], gd[21], gd[22], gd[23]]),
        first_latitude_microdegrees: decode_grib2_signed(&gd[32..36]),
        first_longitude_microdegrees: decode_grib2_signed(&gd[36..40]),
        last_latitude_microdegrees: decode_grib2_signed(&gd[41..45]),
        last_longitude_microdegrees: decode_grib2_signed(&gd[45..49]),
        longitude_increment_microdegrees: u32::from_be_bytes([gd[49], gd[50], gd[51], gd[52]]),
        latitude_increment_microdegrees: u32::from_be_bytes([gd[53], gd[54], gd[55], gd[56]]),
        scanning_mode: gd[57],
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(data: &[u8]) -> Result<ProductDefinition, Grib2Error> {
    let section_data = section_slice(data, 4)?;

    if section_data.len() < 11 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Bytes 7-8: template number, 9: category, 10: number.
    // For templates 4.0/4.8: 18-21 forecast time, 22 first surface type,
    // 24-27 scaled value of first surface.
    let template_number = u16::from_be_bytes([section_data[7], section_data[8]]);

    Ok(ProductDefinition {
        template_number,
        parameter_category: section_data[9],
        parameter_number: section_data[10],
        forecast_time: read_u32(section_data, 18).unwrap_or(0),
        level_type: section_data.get(22).copied().unwrap_or(1),
        level_value: read_u32(section_data, 24).unwrap_or(0),
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section_data = section_slice(data, 5)?;

    if section_data.len() < 11 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Bytes 5-8: number of packed values, 9-10: template number.
    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 all start with
    // R (f32), E (i16), D (i16), bits (u8), original type (u8).
    let num_data_points = u32::from_be_bytes([
        section_data[5],
        section_data[6],
        section_data[7],
        section_data[8],
    ]);
    let template_number = u16::from_be_bytes([section_data[9], section_data[10]]);
    let t = &section_data[11..];

    let reference_value = if t.len() >= 4 {
        f32::from_be_bytes([t[0], t[1], t[2], t[3]])
    } else {
        0.0
    };
    let binary_scale_factor = t.get(4..6).map(decode_grib2_signed_i16).unwrap_or(0);
    let decimal_scale_factor = t.get(6..8).map(decode_grib2_signed_i16).unwrap_or(0);

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value: t.get(8).copied().unwrap_or(0),
        original_data_type: t.get(9).copied().unwrap_or(0),
    })
}

/// Parse Section 6 (Bitmap)
pub fn parse_bitmap(data: &[u8]) -> Result<Bitmap, Grib2Error> {
    let section_data = section_slice(data, 6)?;

    if section_data.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    Ok(Bitmap {
        indicator: section_data[5],
        data: Bytes::copy_from_slice(&section_data[6..]),
    })
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let section_data = section_slice(data, 7)?;

    Ok(DataSection {
        data: Bytes::copy_from_slice(&section_data[5..]),
    })
}

// ===== Helper Functions =====

/// Decode a GRIB2 sign-magnitude 32-bit integer (MSB is the sign).
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    if bytes.len() != 4 {
        return 0;
    }
    let raw = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// 16-bit variant of [`decode_grib2_signed`], used by scale factors.
pub fn decode_grib2_signed_i16(bytes: &[u8]) -> i16 {
    if bytes.len() != 2 {
        return 0;
    }
    let raw = u16::from_be_bytes([bytes[0], bytes[1]]);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Bytes of section `section_num`, including its 5-byte header.
fn section_slice(data: &[u8], section_num: u8) -> Result<&[u8], Grib2Error> {
    let offset = find_section(data, section_num)?;
    let length = read_u32(data, offset).unwrap_or(0) as usize;
    Ok(&data[offset..offset + length])
}

/// Find a section by number within a message
pub fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 4 <= data.len() && &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Reached end of message without finding section".to_string(),
            });
        }

        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Section not found".to_string(),
            });
        }

        let section_length = read_u32(data, offset).unwrap_or(0) as usize;

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += section_length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_grib2_signed() {
        assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x03, 0xE8]), 1000);
        assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x03, 0xE8]), -1000);
        assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x00]), 0);
        assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x00]), 0);
    }

    #[test]
    fn test_decode_grib2_signed_i16() {
        assert_eq!(decode_grib2_signed_i16(&[0x80, 0x0D]), -13);
        assert_eq!(decode_grib2_signed_i16(&[0x00, 0x02]), 2);
    }

    #[test]
    fn test_indicator_rejects_edition_1() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(matches!(
            parse_indicator(&data),
            Err(Grib2Error::InvalidFormat(msg))
                if msg.contains("edition 2, got 1") && msg.contains("grib_set -s edition=2")
        ));
    }

    #[test]
    fn test_indicator_reads_full_length() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[7] = 2;
        data[8..16].copy_from_slice(&0x1_0000_0010u64.to_be_bytes());
        assert_eq!(parse_indicator(&data).unwrap().message_length, 0x1_0000_0010);
    }
}

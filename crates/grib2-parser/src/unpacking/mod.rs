//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded here. Other data
//! representation templates (complex packing, JPEG2000, PNG, CCSDS) are
//! handed to the `grib` crate.

use std::io::Cursor;

use crate::Grib2Error;

/// Unpack simple packed GRIB2 data.
///
/// Formula: value = (R + X * 2^E) * 10^(-D)
///
/// `num_points` is the number of grid points. With a bitmap, only points
/// whose bit is set consume a packed value; the rest come back as `None`.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: u32,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<Option<f32>>, Grib2Error> {
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;

    let mut values = Vec::with_capacity(num_points as usize);
    let mut bit_position = 0;
    let bits_per_value = bits_per_value as usize;

    for i in 0..(num_points as usize) {
        if let Some(bm) = bitmap {
            if !bit_is_set(bm, i) {
                values.push(None);
                continue;
            }
        }

        // Zero-width packing: every present point is the reference value
        let packed_value = if bits_per_value == 0 {
            0
        } else {
            let v = extract_bits(packed_data, bit_position, bits_per_value)
                .map_err(|e| Grib2Error::UnpackingError(format!("Failed to extract bits: {}", e)))?;
            bit_position += bits_per_value;
            v
        };

        let value = (reference + packed_value as f64 * binary_scale) * decimal_scale;
        values.push(Some(value as f32));
    }

    Ok(values)
}

/// Bitmap: 1 bit per grid point, MSB first, 1 = value present.
fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    bitmap
        .get(index / 8)
        .map(|byte| (byte >> (7 - index % 8)) & 1 == 1)
        .unwrap_or(false)
}

/// Extract bits from a byte array
/// Returns the bits as a 32-bit unsigned integer
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("Invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;

    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        if byte_idx >= data.len() {
            return Err("Not enough data to extract bits".to_string());
        }

        let bit = (data[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | (bit as u32);
    }

    Ok(result)
}

/// Decode the first field of a GRIB2 message with the `grib` crate.
///
/// Missing points come back as NaN.
pub fn unpack_with_grib_crate(message: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let grib_file = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate: {}", e)))?;

    let (_index, submessage) = grib_file
        .iter()
        .next()
        .ok_or(Grib2Error::NoMessages)?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate: {}", e)))?;

    Ok(values.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        // 0b10110101
        let data = vec![0b10110101];

        assert_eq!(extract_bits(&data, 0, 2).unwrap(), 0b10);
        assert_eq!(extract_bits(&data, 2, 2).unwrap(), 0b11);
        assert_eq!(extract_bits(&data, 0, 8).unwrap(), 0b10110101);
        assert!(extract_bits(&data, 4, 8).is_err());
    }

    #[test]
    fn test_simple_unpacking() {
        let packed = vec![100, 200];
        let vals = unpack_simple(&packed, 2, 8, 0.0, 0, 0, None).unwrap();

        assert_eq!(vals.len(), 2);
        assert!((vals[0].unwrap() - 100.0).abs() < 0.1);
        assert!((vals[1].unwrap() - 200.0).abs() < 0.1);
    }

    #[test]
    fn test_scale_factors() {
        // (10 + 3 * 2^1) * 10^-1 = 1.6
        let vals = unpack_simple(&[3], 1, 8, 10.0, 1, 1, None).unwrap();
        assert!((vals[0].unwrap() - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_bitmap_absent_points_consume_no_bits() {
        // Points 0 and 2 present; packed values are 7 and 9
        let bitmap = [0b1010_0000];
        let vals = unpack_simple(&[7, 9], 3, 8, 0.0, 0, 0, Some(&bitmap)).unwrap();

        assert_eq!(vals, vec![Some(7.0), None, Some(9.0)]);
    }

    #[test]
    fn test_zero_width_with_bitmap() {
        let bitmap = [0b0100_0000];
        let vals = unpack_simple(&[], 2, 0, 5.0, 0, 0, Some(&bitmap)).unwrap();

        assert_eq!(vals, vec![None, Some(5.0)]);
    }

    #[test]
    fn test_truncated_data_is_an_error() {
        assert!(unpack_simple(&[1], 2, 8, 0.0, 0, 0, None).is_err());
    }
}

//! Synthetic GRIB2 messages and grid patterns.
//!
//! The builder writes a valid single-field GRIB2 message on a regular
//! lat/lon grid (template 3.0) with simple packing (template 5.0). NaN data
//! values are written as bitmap-absent points.

/// Encode a signed integer the GRIB2 way: sign bit plus magnitude.
pub fn encode_grib2_signed_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

/// 16-bit variant of [`encode_grib2_signed_i32`], used for scale factors.
pub fn encode_grib2_signed_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

fn microdegrees(deg: f64) -> i32 {
    (deg * 1_000_000.0).round() as i32
}

/// Build a minimal GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition, angles in microdegrees
    ni: u32,
    nj: u32,
    la1: i32,
    lo1: i32,
    di: u32,
    dj: u32,
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    // Packing
    decimal_scale_factor: i16,
    bits_per_value: u8,
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// A 1° grid of `ni` x `nj` zeros whose first point is (lat 50, lon -130),
    /// stored north to south.
    pub fn new(ni: u32, nj: u32) -> Self {
        Self {
            discipline: 0,
            center: 98, // ECMWF
            year: 2021,
            month: 1,
            day: 1,
            hour: 0,
            ni,
            nj,
            la1: 50_000_000,
            lo1: -130_000_000,
            di: 1_000_000,
            dj: 1_000_000,
            scanning_mode: 0b0000_0000,
            param_category: 1,
            param_number: 8,
            decimal_scale_factor: 0,
            bits_per_value: 16,
            data_values: vec![0.0; (ni * nj) as usize],
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    /// Latitude and longitude of the first stored point, in degrees.
    pub fn with_origin(mut self, lat: f64, lon: f64) -> Self {
        self.la1 = microdegrees(lat);
        self.lo1 = microdegrees(lon);
        self
    }

    /// Unsigned grid increments, in degrees.
    pub fn with_increments(mut self, di: f64, dj: f64) -> Self {
        self.di = microdegrees(di.abs()) as u32;
        self.dj = microdegrees(dj.abs()) as u32;
        self
    }

    pub fn with_scanning_mode(mut self, flag: u8) -> Self {
        self.scanning_mode = flag;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_decimal_scale(mut self, d: i16) -> Self {
        self.decimal_scale_factor = d;
        self
    }

    /// Packed width for non-constant fields. Clamped to 1..=24.
    pub fn with_bits_per_value(mut self, bits: u8) -> Self {
        self.bits_per_value = bits.clamp(1, 24);
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    /// Values in storage order. NaN marks a missing point.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Set individual points, leaving the rest unchanged.
    pub fn with_values_at(mut self, points: &[(usize, f32)]) -> Self {
        for &(idx, value) in points {
            if let Some(slot) = self.data_values.get_mut(idx) {
                *slot = value;
            }
        }
        self
    }

    fn has_missing(&self) -> bool {
        self.data_values.iter().any(|v| v.is_nan())
    }

    fn present_values(&self) -> Vec<f64> {
        let scale = 10f64.powi(self.decimal_scale_factor as i32);
        self.data_values
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v as f64 * scale)
            .collect()
    }

    /// Reference value, binary scale factor and bits per value.
    fn packing(&self) -> (f32, i16, u8) {
        let present = self.present_values();
        let min = present.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = present.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if present.is_empty() {
            return (0.0, 0, 0);
        }

        let range = max - min;
        if range == 0.0 {
            return (min as f32, 0, 0);
        }

        // packed = (value * 10^D - R) / 2^E must fit in `bits`
        let max_packed = ((1u64 << self.bits_per_value) - 1) as f64;
        let e = (range / max_packed).log2().ceil() as i16;
        (min as f32, e, self.bits_per_value)
    }

    /// Build the complete GRIB2 message bytes.
    pub fn build(&self) -> Vec<u8> {
        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let section5 = self.build_section5();
        let section6 = self.build_section6();
        let section7 = self.build_section7();

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(21);
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(0); // Local table version
        section.push(0); // Significance of reference time (analysis)

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0);
        section.push(0);

        section.push(0); // Production status
        section.push(0); // Type of data (analysis)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(72);
        section.extend_from_slice(&72u32.to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Shape of the Earth
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // Subdivisions

        let la2 = self.last_coordinate(self.la1, self.dj, self.nj, self.scanning_mode & 0x40 != 0);
        let lo2 = self.last_coordinate(self.lo1, self.di, self.ni, self.scanning_mode & 0x80 == 0);

        section.extend_from_slice(&encode_grib2_signed_i32(self.la1));
        section.extend_from_slice(&encode_grib2_signed_i32(self.lo1));
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&encode_grib2_signed_i32(la2));
        section.extend_from_slice(&encode_grib2_signed_i32(lo2));
        section.extend_from_slice(&self.di.to_be_bytes());
        section.extend_from_slice(&self.dj.to_be_bytes());
        section.push(self.scanning_mode);

        section
    }

    fn last_coordinate(&self, first: i32, step: u32, count: u32, increasing: bool) -> i32 {
        let span = step as i64 * count.saturating_sub(1) as i64;
        let last = if increasing {
            first as i64 + span
        } else {
            first as i64 - span
        };
        last as i32
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(34);
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(0); // Type of generating process (analysis)
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes());
        section.push(0);
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&0u32.to_be_bytes());

        section.push(1); // Ground or water surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.push(255);
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();
        let num_packed = self.present_values().len() as u32;

        let mut section = Vec::with_capacity(21);
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&num_packed.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&encode_grib2_signed_i16(binary_scale_factor));
        section.extend_from_slice(&encode_grib2_signed_i16(self.decimal_scale_factor));
        section.push(bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        if !self.has_missing() {
            let mut section = Vec::with_capacity(6);
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255); // No bitmap
            return section;
        }

        let mut bitmap = vec![0u8; self.data_values.len().div_ceil(8)];
        for (idx, value) in self.data_values.iter().enumerate() {
            if !value.is_nan() {
                bitmap[idx / 8] |= 0x80 >> (idx % 8);
            }
        }

        let mut section = Vec::with_capacity(6 + bitmap.len());
        section.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
        section.push(6);
        section.push(0); // Bitmap follows
        section.extend_from_slice(&bitmap);
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let packed = self.pack_simple();

        let mut section = Vec::with_capacity(5 + packed.len());
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed);
        section
    }

    fn pack_simple(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();
        if bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2f64.powi(binary_scale_factor as i32);
        let max_packed = (1u64 << bits_per_value) - 1;
        let mut writer = BitWriter::default();

        for value in self.present_values() {
            let packed = ((value - reference_value as f64) / binary_scale).round();
            let packed = (packed.max(0.0) as u64).min(max_packed);
            writer.write(packed, bits_per_value);
        }

        writer.finish()
    }
}

/// MSB-first bit packer.
#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    fn write(&mut self, value: u64, bits: u8) {
        for shift in (0..bits).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> shift) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, in row-major order.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A domain mask: 1 inside the rectangle `[col0, col1) x [row0, row1)`,
/// 0 everywhere else.
pub fn create_box_mask(
    width: usize,
    height: usize,
    cols: std::ops::Range<usize>,
    rows: std::ops::Range<usize>,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let inside = cols.contains(&col) && rows.contains(&row);
            data.push(if inside { 1.0 } else { 0.0 });
        }
    }
    data
}

/// Sparse report counts: zeros everywhere except the given cells.
pub fn create_report_grid(width: usize, height: usize, reports: &[(usize, f32)]) -> Vec<f32> {
    let mut data = vec![0.0; width * height];
    for &(idx, count) in reports {
        if let Some(slot) = data.get_mut(idx) {
            *slot = count;
        }
    }
    data
}

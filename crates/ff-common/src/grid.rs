//! Grid specifications for regular lat/lon analysis grids.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon grid.
///
/// `dx` and `dy` are signed: they carry the direction in which storage order
/// walks along each axis, so the coordinate of a stored point is always
/// `first + index * step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points along a parallel (longitude direction)
    pub nx: usize,
    /// Number of points along a meridian (latitude direction)
    pub ny: usize,
    /// Signed longitude step in degrees
    pub dx: f64,
    /// Signed latitude step in degrees
    pub dy: f64,
    /// Longitude of the first stored point
    pub first_x: f64,
    /// Latitude of the first stored point
    pub first_y: f64,
    /// Scan mode flags (determines how data is ordered)
    pub scan_mode: ScanMode,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        first_x: f64,
        first_y: f64,
        scan_mode: ScanMode,
    ) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_x,
            first_y,
            scan_mode,
        }
    }

    /// Build a grid from unsigned increments, deriving step signs from the
    /// scan mode the way GRIB2 template 3.0 encodes them.
    pub fn from_increments(
        nx: usize,
        ny: usize,
        di: f64,
        dj: f64,
        first_lon: f64,
        first_lat: f64,
        scan_mode: ScanMode,
    ) -> Self {
        let dx = if scan_mode.i_negative { -di.abs() } else { di.abs() };
        let dy = if scan_mode.j_positive { dj.abs() } else { -dj.abs() };
        Self::new(nx, ny, dx, dy, first_lon, first_lat, scan_mode)
    }

    /// Calculate the geographic bounding box of this grid.
    pub fn bbox(&self) -> BoundingBox {
        let last_x = self.first_x + self.nx.saturating_sub(1) as f64 * self.dx;
        let last_y = self.first_y + self.ny.saturating_sub(1) as f64 * self.dy;

        BoundingBox {
            min_x: self.first_x.min(last_x),
            min_y: self.first_y.min(last_y),
            max_x: self.first_x.max(last_x),
            max_y: self.first_y.max(last_y),
        }
    }

    /// Coordinates of the point stored at `offset` in the value array.
    pub fn point_at(&self, offset: usize) -> Option<GridPoint> {
        if offset >= self.len() {
            return None;
        }

        let (i, j) = self.scan_mode.grid_indices(offset, self.nx, self.ny);

        Some(GridPoint {
            lon: normalize_lon(self.first_x + i as f64 * self.dx),
            lat: self.first_y + j as f64 * self.dy,
            i,
            j,
        })
    }

    /// Coordinates of every point, in storage order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.len()).filter_map(move |offset| self.point_at(offset))
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// A point on the grid with both indices and coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lon: f64,
    pub lat: f64,
    pub i: usize,
    pub j: usize,
}

/// Scan mode flags for grid data ordering.
///
/// Based on GRIB2 scanning mode (Flag Table 3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// Points along a row run from east to west
    pub i_negative: bool,
    /// Rows run from south to north
    pub j_positive: bool,
    /// Adjacent points in storage are along a column, not a row
    pub j_consecutive: bool,
    /// Row scan direction alternates
    pub alternating_rows: bool,
}

impl ScanMode {
    /// Most common mode: data starts at top-left, rows go west to east,
    /// columns go north to south.
    pub fn standard() -> Self {
        Self {
            i_negative: false,
            j_positive: false,
            j_consecutive: false,
            alternating_rows: false,
        }
    }

    /// Create from GRIB2 flag byte.
    pub fn from_grib2_flag(flag: u8) -> Self {
        Self {
            i_negative: (flag & 0x80) != 0,
            j_positive: (flag & 0x40) != 0,
            j_consecutive: (flag & 0x20) != 0,
            alternating_rows: (flag & 0x10) != 0,
        }
    }

    /// Column and row index of the value stored at `offset`.
    pub fn grid_indices(&self, offset: usize, nx: usize, ny: usize) -> (usize, usize) {
        if self.j_consecutive {
            let i = offset / ny;
            let mut j = offset % ny;
            if self.alternating_rows && i % 2 == 1 {
                j = ny - 1 - j;
            }
            (i, j)
        } else {
            let j = offset / nx;
            let mut i = offset % nx;
            if self.alternating_rows && j % 2 == 1 {
                i = nx - 1 - i;
            }
            (i, j)
        }
    }
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::standard()
    }
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.25° global grid stored north to south, starting at 0°E.
    fn global_quarter_degree() -> GridSpec {
        GridSpec::from_increments(1440, 721, 0.25, 0.25, 0.0, 90.0, ScanMode::standard())
    }

    #[test]
    fn test_global_grid_bbox() {
        let bbox = global_quarter_degree().bbox();

        assert!(bbox.min_x.abs() < 0.001);
        assert!((bbox.min_y + 90.0).abs() < 0.001);
        assert!((bbox.max_x - 359.75).abs() < 0.001);
        assert!((bbox.max_y - 90.0).abs() < 0.001);
    }

    #[test]
    fn test_point_at_walks_rows_first() {
        let grid = global_quarter_degree();

        let first = grid.point_at(0).unwrap();
        assert_eq!((first.i, first.j), (0, 0));
        assert!((first.lat - 90.0).abs() < 1e-9);

        let second_row = grid.point_at(1440).unwrap();
        assert_eq!((second_row.i, second_row.j), (0, 1));
        assert!((second_row.lat - 89.75).abs() < 1e-9);

        assert!(grid.point_at(grid.len()).is_none());
    }

    #[test]
    fn test_longitudes_are_wrapped() {
        let grid = global_quarter_degree();
        // 230°E is 130°W
        let p = grid.point_at(920).unwrap();
        assert!((p.lon + 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_south_to_north_grid() {
        let mode = ScanMode::from_grib2_flag(0x40);
        let grid = GridSpec::from_increments(3, 2, 1.0, 1.0, -100.0, 30.0, mode);
        let top = grid.point_at(3).unwrap();
        assert!((top.lat - 31.0).abs() < 1e-9);
        assert!((top.lon + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scan_mode_from_grib2() {
        let mode = ScanMode::from_grib2_flag(0x40);
        assert!(!mode.i_negative);
        assert!(mode.j_positive);
        assert!(!mode.j_consecutive);
    }

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(0.0), 0.0);
        assert_eq!(normalize_lon(180.0), -180.0);
        assert_eq!(normalize_lon(359.0), -1.0);
        assert_eq!(normalize_lon(-190.0), 170.0);
    }
}

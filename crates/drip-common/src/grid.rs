//! Grid specifications for drought index rasters.

use crate::{BoundingBox, DripError, DripResult};
use serde::{Deserialize, Serialize};

/// Specification of a regular, north-up lat/lon grid.
///
/// Row 0 is the northern edge and column 0 the western edge. Cells are
/// square, `resolution` degrees on a side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (longitude direction)
    pub width: usize,
    /// Number of rows (latitude direction)
    pub height: usize,
    /// Cell size in degrees
    pub resolution: f64,
    /// Longitude of the western edge
    pub min_lon: f64,
    /// Latitude of the northern edge
    pub max_lat: f64,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(width: usize, height: usize, resolution: f64, min_lon: f64, max_lat: f64) -> Self {
        Self {
            width,
            height,
            resolution,
            min_lon,
            max_lat,
        }
    }

    /// Build the grid covering `bbox` at `resolution`, rounding partial cells up.
    pub fn from_bbox(bbox: &BoundingBox, resolution: f64) -> DripResult<Self> {
        check_resolution(resolution)?;
        let bbox = bbox.normalized();
        let width = (bbox.width() / resolution - 1e-9).ceil().max(1.0) as usize;
        let height = (bbox.height() / resolution - 1e-9).ceil().max(1.0) as usize;
        let spec = Self::new(width, height, resolution, bbox.min_lon, bbox.max_lat);
        spec.validate()?;
        Ok(spec)
    }

    /// Check that the grid describes a real extent: a finite, positive
    /// resolution and a finite origin.
    ///
    /// Specs built with [`GridSpec::new`] or deserialized from user input
    /// are not checked until this is called.
    pub fn validate(&self) -> DripResult<()> {
        check_resolution(self.resolution)?;
        if !self.min_lon.is_finite() || !self.max_lat.is_finite() {
            return Err(DripError::invalid_parameter(
                "origin",
                format!(
                    "must be finite, got min_lon {} max_lat {}",
                    self.min_lon, self.max_lat
                ),
            ));
        }
        let extent = self.bbox();
        if !extent.max_lon.is_finite() || !extent.min_lat.is_finite() {
            return Err(DripError::invalid_parameter(
                "extent",
                format!("{} is not finite", extent),
            ));
        }
        Ok(())
    }

    /// Calculate the bounding box of this grid (cell edges, not centres).
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon,
            min_lat: self.max_lat - self.height as f64 * self.resolution,
            max_lon: self.min_lon + self.width as f64 * self.resolution,
            max_lat: self.max_lat,
        }
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Find the cell containing a geographic point.
    ///
    /// Uses floor-division binning. Points on the closing eastern or southern
    /// edge bin into the last column or row.
    pub fn coord_to_cell(&self, lon: f64, lat: f64) -> DripResult<(usize, usize)> {
        let extent = self.bbox();
        if self.is_empty()
            || !lon.is_finite()
            || !lat.is_finite()
            || !extent.contains_point(lon, lat)
        {
            return Err(DripError::out_of_bounds(lon, lat, extent.to_string()));
        }

        let col = ((lon - self.min_lon) / self.resolution).floor() as usize;
        let row = ((self.max_lat - lat) / self.resolution).floor() as usize;

        Ok((row.min(self.height - 1), col.min(self.width - 1)))
    }

    /// Coordinate `(lon, lat)` of a cell centre.
    pub fn cell_to_coord(&self, row: usize, col: usize) -> DripResult<(f64, f64)> {
        if row >= self.height || col >= self.width {
            return Err(DripError::invalid_parameter(
                "cell",
                format!(
                    "({}, {}) is outside a {}x{} grid",
                    row, col, self.height, self.width
                ),
            ));
        }

        Ok((
            self.min_lon + (col as f64 + 0.5) * self.resolution,
            self.max_lat - (row as f64 + 0.5) * self.resolution,
        ))
    }

    /// Get the 1D array index for a 2D grid position (row-major).
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn check_resolution(resolution: f64) -> DripResult<()> {
    if !(resolution > 0.0) || !resolution.is_finite() {
        return Err(DripError::invalid_parameter(
            "resolution",
            format!("must be a positive number, got {}", resolution),
        ));
    }
    Ok(())
}

/// Common grid definitions.
pub mod grids {
    use super::*;

    /// Quarter-degree grid over the contiguous United States
    /// (130°W–55°W, 20°N–50°N).
    pub fn conus_0p25() -> GridSpec {
        GridSpec::new(300, 120, 0.25, -130.0, 50.0)
    }

    /// Eighth-degree grid over the same extent (gridMET-style datasets).
    pub fn conus_0p125() -> GridSpec {
        GridSpec::new(600, 240, 0.125, -130.0, 50.0)
    }
}

//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in decimal degrees (WGS84 lon/lat).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Create a bounding box from the portal's `(lat_min, lat_max, lon_min, lon_max)`
    /// ordering, swapping reversed bounds.
    pub fn from_lat_lon(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self::new(lon_min, lat_min, lon_max, lat_max).normalized()
    }

    /// Parse a bounding box text entry: "lat_min,lat_max,lon_min,lon_max"
    pub fn from_lat_lon_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
            if !value.is_finite() {
                return Err(BboxParseError::InvalidNumber(part.to_string()));
            }
        }

        Ok(Self::from_lat_lon(values[0], values[1], values[2], values[3]))
    }

    /// Return a copy with min/max swapped where they were given reversed.
    pub fn normalized(&self) -> Self {
        Self {
            min_lon: self.min_lon.min(self.max_lon),
            min_lat: self.min_lat.min(self.max_lat),
            max_lon: self.min_lon.max(self.max_lon),
            max_lat: self.min_lat.max(self.max_lat),
        }
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_lon: self.min_lon.max(other.min_lon),
            min_lat: self.min_lat.max(other.min_lat),
            max_lon: self.max_lon.min(other.max_lon),
            max_lat: self.max_lat.min(other.max_lat),
        })
    }

    /// Clamp every edge of this box into `extent`.
    ///
    /// Unlike [`intersection`](Self::intersection) this never fails: a box
    /// lying wholly outside `extent` collapses onto the nearest edge.
    pub fn clamp_to(&self, extent: &BoundingBox) -> BoundingBox {
        let b = self.normalized();
        BoundingBox {
            min_lon: b.min_lon.clamp(extent.min_lon, extent.max_lon),
            min_lat: b.min_lat.clamp(extent.min_lat, extent.max_lat),
            max_lon: b.max_lon.clamp(extent.min_lon, extent.max_lon),
            max_lat: b.max_lat.clamp(extent.min_lat, extent.max_lat),
        }
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Generate a cache key fragment for this bbox (quantized to avoid floating point issues).
    pub fn cache_key(&self) -> String {
        format!(
            "{:.6}_{:.6}_{:.6}_{:.6}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[lon {}..{}, lat {}..{}]",
            self.min_lon, self.max_lon, self.min_lat, self.max_lat
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'lat_min,lat_max,lon_min,lon_max'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),
}

impl From<BboxParseError> for crate::DripError {
    fn from(err: BboxParseError) -> Self {
        crate::DripError::InvalidBbox(err.to_string())
    }
}

//! Location selectors and their resolution into area masks.
//!
//! Every analysis restricts its input stack to a region by multiplying it
//! with a [`Mask`]. Selectors arrive from the UI layer (map clicks, state or
//! county choices, bounding-box text entry, rasterized shapefiles) and are
//! resolved once per call against the [`GridIndex`].

use std::hash::{Hash, Hasher};

use drip_common::{BoundingBox, DripError, DripResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::grid_index::GridIndex;
use crate::types::Mask;

/// Which cells of the grid an analysis covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationSelector {
    /// The entire grid.
    All,
    /// A single cell.
    Point { row: usize, col: usize },
    /// A set of cells given as parallel row/column lists.
    PointSet { rows: Vec<usize>, cols: Vec<usize> },
    /// A precomputed footprint, e.g. a rasterized state or shapefile.
    Region { footprint: Array2<bool> },
    /// A geographic box; clamped to the grid extent on resolution.
    BoundingBox {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },
}

impl LocationSelector {
    /// Selector for the cell containing `(lon, lat)`.
    pub fn point_at(grid: &GridIndex, lon: f64, lat: f64) -> DripResult<Self> {
        let (row, col) = grid.resolve(lon, lat)?;
        Ok(Self::Point { row, col })
    }

    /// Selector for the cells containing each `(lon, lat)` pair.
    pub fn points_at(grid: &GridIndex, coords: &[(f64, f64)]) -> DripResult<Self> {
        let mut rows = Vec::with_capacity(coords.len());
        let mut cols = Vec::with_capacity(coords.len());
        for &(lon, lat) in coords {
            let (row, col) = grid.resolve(lon, lat)?;
            rows.push(row);
            cols.push(col);
        }
        Ok(Self::PointSet { rows, cols })
    }

    /// Selector for the cells behind a list of grid IDs.
    pub fn from_grid_ids(grid: &GridIndex, ids: &[usize]) -> DripResult<Self> {
        let (rows, cols) = ids
            .iter()
            .map(|&id| grid.id_to_cell(id))
            .collect::<DripResult<Vec<_>>>()?
            .into_iter()
            .unzip();
        Ok(Self::PointSet { rows, cols })
    }

    /// Selector for a geographic box.
    pub fn bbox(bbox: &BoundingBox) -> Self {
        Self::BoundingBox {
            lat_min: bbox.min_lat,
            lat_max: bbox.max_lat,
            lon_min: bbox.min_lon,
            lon_max: bbox.max_lon,
        }
    }

    /// Resolve this selector into a mask over `grid`.
    pub fn resolve(&self, grid: &GridIndex) -> DripResult<Mask> {
        resolve(self, grid)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Point { .. } => "point",
            Self::PointSet { .. } => "point_set",
            Self::Region { .. } => "region",
            Self::BoundingBox { .. } => "bbox",
        }
    }
}

impl Hash for LocationSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::All => {}
            Self::Point { row, col } => (row, col).hash(state),
            Self::PointSet { rows, cols } => (rows, cols).hash(state),
            Self::Region { footprint } => {
                footprint.dim().hash(state);
                footprint.iter().for_each(|v| v.hash(state));
            }
            Self::BoundingBox {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
            } => {
                // -0.0 == 0.0, so both must hash alike
                for v in [lat_min, lat_max, lon_min, lon_max] {
                    (v + 0.0).to_bits().hash(state);
                }
            }
        }
    }
}

/// Resolve a selector into an `H × W` mask of {1, NaN}.
///
/// Cell indices outside the grid are ignored, so an empty or fully
/// out-of-range point set yields an all-NaN mask rather than an error.
pub fn resolve(selector: &LocationSelector, grid: &GridIndex) -> DripResult<Mask> {
    let (rows, cols) = grid.shape();

    let mask = match selector {
        LocationSelector::All => Mask::all(rows, cols),
        LocationSelector::Point { row, col } => {
            let mut mask = Mask::none(rows, cols);
            mask.select(*row, *col);
            mask
        }
        LocationSelector::PointSet {
            rows: point_rows,
            cols: point_cols,
        } => {
            if point_rows.len() != point_cols.len() {
                return Err(DripError::invalid_parameter(
                    "point_set",
                    format!(
                        "{} rows but {} cols",
                        point_rows.len(),
                        point_cols.len()
                    ),
                ));
            }
            let mut mask = Mask::none(rows, cols);
            for (&row, &col) in point_rows.iter().zip(point_cols) {
                mask.select(row, col);
            }
            mask
        }
        LocationSelector::Region { footprint } => {
            if footprint.dim() != (rows, cols) {
                return Err(DripError::shape_mismatch(
                    format!("{:?}", (rows, cols)),
                    format!("{:?}", footprint.dim()),
                ));
            }
            Mask::from_footprint(footprint)
        }
        LocationSelector::BoundingBox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        } => {
            if [lat_min, lat_max, lon_min, lon_max]
                .iter()
                .any(|v| !v.is_finite())
            {
                return Err(DripError::InvalidBbox(format!(
                    "non-finite bounds lat {}..{}, lon {}..{}",
                    lat_min, lat_max, lon_min, lon_max
                )));
            }
            let bbox = BoundingBox::from_lat_lon(*lat_min, *lat_max, *lon_min, *lon_max);
            bbox_mask(&bbox, grid)?
        }
    };

    tracing::debug!(
        selector = selector.kind(),
        selected = mask.selected_count(),
        "Resolved location selector"
    );

    Ok(mask)
}

/// Cells whose centre lies inside the clamped box.
///
/// When the clamped box is thinner than a cell along an axis (a box wholly
/// outside the grid collapses onto its boundary) that axis falls back to the
/// cells containing the box edges, giving the nearest boundary strip.
fn bbox_mask(bbox: &BoundingBox, grid: &GridIndex) -> DripResult<Mask> {
    let spec = grid.spec();
    let (rows, cols) = spec.shape();
    if spec.is_empty() {
        return Ok(Mask::none(rows, cols));
    }

    let clamped = bbox.clamp_to(&spec.bbox());
    let res = spec.resolution;

    // Row centres run north to south from max_lat.
    let row_range = match centre_range(
        (spec.max_lat - clamped.max_lat) / res,
        (spec.max_lat - clamped.min_lat) / res,
        rows,
    ) {
        Some(range) => range,
        None => {
            let (top, _) = spec.coord_to_cell(clamped.min_lon, clamped.max_lat)?;
            let (bottom, _) = spec.coord_to_cell(clamped.min_lon, clamped.min_lat)?;
            (top, bottom)
        }
    };

    let col_range = match centre_range(
        (clamped.min_lon - spec.min_lon) / res,
        (clamped.max_lon - spec.min_lon) / res,
        cols,
    ) {
        Some(range) => range,
        None => {
            let (_, left) = spec.coord_to_cell(clamped.min_lon, clamped.min_lat)?;
            let (_, right) = spec.coord_to_cell(clamped.max_lon, clamped.min_lat)?;
            (left, right)
        }
    };

    let mut mask = Mask::none(rows, cols);
    for row in row_range.0..=row_range.1 {
        for col in col_range.0..=col_range.1 {
            mask.select(row, col);
        }
    }
    Ok(mask)
}

/// Index range of cells whose centre `i + 0.5` lies in `[lo, hi]` (both in
/// cell units), or `None` if no centre does.
fn centre_range(lo: f64, hi: f64, n: usize) -> Option<(usize, usize)> {
    const EPS: f64 = 1e-9;
    let first = (lo - 0.5 - EPS).ceil().max(0.0);
    let last = (hi - 0.5 + EPS).floor().min(n as f64 - 1.0);
    (first <= last).then(|| (first as usize, last as usize))
}

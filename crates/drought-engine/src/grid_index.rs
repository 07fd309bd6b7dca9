//! Coordinate and grid-ID lookups for a fixed drought index grid.

use drip_common::{DripError, DripResult, GridSpec};
use ndarray::{Array2, ArrayView2};

/// Bidirectional lookup between geographic coordinates, array cells and
/// stable grid IDs.
///
/// Grid IDs are assigned in row-major order, starting at 0, to every valid
/// cell. No-data cells (ocean, outside the dataset footprint) have no ID.
/// Built once; all lookups are pure.
#[derive(Debug, Clone)]
pub struct GridIndex {
    spec: GridSpec,
    ids: Array2<Option<usize>>,
    cells: Vec<(usize, usize)>,
}

impl GridIndex {
    /// Index where every cell holds data.
    pub fn new(spec: GridSpec) -> DripResult<Self> {
        let footprint = Array2::from_elem(spec.shape(), true);
        Self::with_footprint(spec, &footprint)
    }

    /// Index with an explicit validity footprint (`true` = has data).
    pub fn with_footprint(spec: GridSpec, footprint: &Array2<bool>) -> DripResult<Self> {
        spec.validate()?;
        if footprint.dim() != spec.shape() {
            return Err(DripError::shape_mismatch(
                format!("{:?}", spec.shape()),
                format!("{:?}", footprint.dim()),
            ));
        }
        Ok(Self::build(spec, footprint))
    }

    /// Index whose valid cells are the non-NaN cells of a reference layer,
    /// typically the first time step of a dataset.
    pub fn from_reference_layer(spec: GridSpec, layer: ArrayView2<'_, f64>) -> DripResult<Self> {
        let footprint = layer.mapv(|v| !v.is_nan());
        Self::with_footprint(spec, &footprint)
    }

    fn build(spec: GridSpec, footprint: &Array2<bool>) -> Self {
        let mut ids = Array2::from_elem(spec.shape(), None);
        let mut cells = Vec::new();

        for ((row, col), &valid) in footprint.indexed_iter() {
            if valid {
                ids[[row, col]] = Some(cells.len());
                cells.push((row, col));
            }
        }

        tracing::debug!(
            rows = spec.height,
            cols = spec.width,
            valid_cells = cells.len(),
            "Built grid index"
        );

        Self { spec, ids, cells }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.spec.shape()
    }

    /// Find the cell containing `(lon, lat)`. Never clamps.
    pub fn resolve(&self, lon: f64, lat: f64) -> DripResult<(usize, usize)> {
        self.spec.coord_to_cell(lon, lat)
    }

    /// Cell-centre coordinate `(lon, lat)`.
    pub fn cell_to_coord(&self, row: usize, col: usize) -> DripResult<(f64, f64)> {
        self.spec.cell_to_coord(row, col)
    }

    /// Stable ID of a valid cell.
    pub fn grid_id(&self, row: usize, col: usize) -> DripResult<usize> {
        match self.ids.get((row, col)) {
            Some(Some(id)) => Ok(*id),
            Some(None) => Err(DripError::no_data(format!("cell ({}, {})", row, col))),
            None => Err(DripError::no_data(format!(
                "cell ({}, {}) is outside a {}x{} grid",
                row, col, self.spec.height, self.spec.width
            ))),
        }
    }

    /// Cell of a grid ID.
    pub fn id_to_cell(&self, id: usize) -> DripResult<(usize, usize)> {
        self.cells
            .get(id)
            .copied()
            .ok_or_else(|| DripError::no_data(format!("grid id {}", id)))
    }

    /// Grid ID of the cell containing `(lon, lat)`.
    pub fn grid_id_at(&self, lon: f64, lat: f64) -> DripResult<usize> {
        let (row, col) = self.resolve(lon, lat)?;
        self.grid_id(row, col)
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        matches!(self.ids.get((row, col)), Some(Some(_)))
    }

    /// Number of cells that carry an ID.
    pub fn valid_count(&self) -> usize {
        self.cells.len()
    }

    /// Validity footprint (`true` = has data).
    pub fn footprint(&self) -> Array2<bool> {
        self.ids.mapv(|id| id.is_some())
    }
}

//! JSON stack files.
//!
//! A stack file carries one grid and any number of index stacks on it:
//!
//! ```json
//! {
//!   "grid": { "width": 2, "height": 1, "resolution": 0.25,
//!             "min_lon": -100.0, "max_lat": 40.0 },
//!   "indices": {
//!     "spi3": {
//!       "times": ["2012-06", "2012-07"],
//!       "values": [[[-0.4, null]], [[-1.7, null]]]
//!     }
//!   }
//! }
//! ```
//!
//! `values` is `[time][row][col]`; `null` marks no data.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use drip_common::{parse_date, GridSpec};
use drought_engine::{ArrayStack, GridIndex, MemoryStackSource};
use ndarray::{Array2, Array3};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct StackFile {
    pub grid: GridSpec,
    pub indices: BTreeMap<String, IndexStack>,
}

#[derive(Debug, Deserialize)]
pub struct IndexStack {
    pub times: Vec<String>,
    pub values: Vec<Vec<Vec<Option<f64>>>>,
}

/// A stack file turned into engine inputs.
pub struct LoadedStacks {
    pub grid: GridIndex,
    pub source: MemoryStackSource,
}

impl StackFile {
    /// Read and parse a stack file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open stack file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse stack file {}", path.display()))
    }

    /// Build the grid index and the in-memory source.
    ///
    /// A cell gets a grid ID when any index holds data for it at any time.
    pub fn into_engine(self) -> Result<LoadedStacks> {
        let shape = self.grid.shape();
        let mut footprint = Array2::from_elem(shape, false);
        let mut source = MemoryStackSource::new();

        for (name, index) in self.indices {
            let stack = index
                .into_array_stack(shape)
                .with_context(|| format!("Invalid stack for index '{}'", name))?;

            for layer in stack.data().outer_iter() {
                footprint.zip_mut_with(&layer, |valid, v| *valid |= !v.is_nan());
            }

            info!(index = %name, steps = stack.len(), "Loaded index stack");
            source.insert(&name, stack);
        }

        let grid = GridIndex::with_footprint(self.grid, &footprint)?;
        Ok(LoadedStacks { grid, source })
    }
}

impl IndexStack {
    fn into_array_stack(self, (rows, cols): (usize, usize)) -> Result<ArrayStack> {
        let times = self
            .times
            .iter()
            .map(|t| parse_date(t))
            .collect::<Result<Vec<_>, _>>()?;

        if self.values.len() != times.len() {
            bail!(
                "{} layers but {} timestamps",
                self.values.len(),
                times.len()
            );
        }

        let mut data = Array3::from_elem((times.len(), rows, cols), f64::NAN);
        for (t, layer) in self.values.iter().enumerate() {
            if layer.len() != rows {
                bail!("layer {} has {} rows, grid has {}", t, layer.len(), rows);
            }
            for (row, line) in layer.iter().enumerate() {
                if line.len() != cols {
                    bail!(
                        "layer {} row {} has {} columns, grid has {}",
                        t,
                        row,
                        line.len(),
                        cols
                    );
                }
                for (col, value) in line.iter().enumerate() {
                    data[[t, row, col]] = value.unwrap_or(f64::NAN);
                }
            }
        }

        Ok(ArrayStack::new(data, times)?)
    }
}

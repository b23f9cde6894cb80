//! Likelihood field lookup
//!
//! A dense table of precomputed distances from every grid cell to the
//! nearest known boundary feature. The table is produced offline and loaded
//! once as a blob of row-major little-endian `f64` values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::common::{DistanceField, LocalizationError, LocalizationResult};
use crate::mapping::FieldGeometry;

/// Distance reported for coordinates outside the table
pub const OUT_OF_FIELD_DISTANCE: f64 = 200.0;

const CELL_BYTES: usize = std::mem::size_of::<f64>();

/// Read-only distance table addressed by world coordinates
#[derive(Debug, Clone)]
pub struct LikelihoodField {
    table: DMatrix<f64>,
    geometry: FieldGeometry,
}

impl LikelihoodField {
    /// Build from row-major values; the length must match the geometry
    pub fn from_values(geometry: FieldGeometry, values: &[f64]) -> LocalizationResult<Self> {
        geometry.validate()?;
        if values.len() != geometry.cell_count() {
            return Err(LocalizationError::FieldSize {
                expected: geometry.cell_count(),
                actual: values.len(),
            });
        }
        let table = DMatrix::from_row_slice(geometry.grid_height, geometry.grid_width, values);
        Ok(LikelihoodField { table, geometry })
    }

    /// Build by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(geometry: FieldGeometry, f: F) -> LocalizationResult<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        geometry.validate()?;
        let table = DMatrix::from_fn(geometry.grid_height, geometry.grid_width, f);
        Ok(LikelihoodField { table, geometry })
    }

    /// Decode a table from a reader. Short input is an error; trailing bytes
    /// beyond the table are ignored.
    pub fn from_reader<R: Read>(geometry: FieldGeometry, mut reader: R) -> LocalizationResult<Self> {
        geometry.validate()?;
        let expected = geometry.cell_count();
        let mut bytes = Vec::with_capacity(expected * CELL_BYTES);
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < expected * CELL_BYTES {
            return Err(LocalizationError::FieldSize {
                expected,
                actual: bytes.len() / CELL_BYTES,
            });
        }
        if bytes.len() > expected * CELL_BYTES {
            warn!(
                extra_bytes = bytes.len() - expected * CELL_BYTES,
                "likelihood field blob is longer than the grid, ignoring the tail"
            );
        }

        let values: Vec<f64> = bytes
            .chunks_exact(CELL_BYTES)
            .take(expected)
            .map(|chunk| {
                let mut raw = [0u8; CELL_BYTES];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        Self::from_values(geometry, &values)
    }

    /// Load the table from a file
    pub fn load<P: AsRef<Path>>(geometry: FieldGeometry, path: P) -> LocalizationResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LocalizationError::FieldLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let field = Self::from_reader(geometry, file)?;
        info!(
            path = %path.display(),
            width = geometry.grid_width,
            height = geometry.grid_height,
            "likelihood field loaded"
        );
        Ok(field)
    }

    pub fn geometry(&self) -> &FieldGeometry {
        &self.geometry
    }

    /// Raw table cell, `None` outside the grid
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.table.get((row, col)).copied()
    }

    /// Distance to the nearest boundary feature for a world coordinate.
    ///
    /// Coordinates are truncated toward zero and shifted by the grid center.
    /// Indices equal to the width or height are tolerated as long as the
    /// row-major linear index stays inside the table; anything else yields
    /// [`OUT_OF_FIELD_DISTANCE`].
    pub fn distance(&self, world_x: f64, world_y: f64) -> f64 {
        if !world_x.is_finite() || !world_y.is_finite() {
            return OUT_OF_FIELD_DISTANCE;
        }
        let width = self.geometry.grid_width as i64;
        let height = self.geometry.grid_height as i64;
        // saturating cast, then checked shift so huge inputs stay out of range
        let (Some(col), Some(row)) = (
            (world_x.trunc() as i64).checked_add(self.geometry.center_x),
            self.geometry.center_y.checked_sub(world_y.trunc() as i64),
        ) else {
            return OUT_OF_FIELD_DISTANCE;
        };

        if (0..=width).contains(&col) && (0..=height).contains(&row) {
            let pos = row * width + col;
            if pos < width * height {
                return self.table[((pos / width) as usize, (pos % width) as usize)];
            }
        }
        OUT_OF_FIELD_DISTANCE
    }
}

impl DistanceField for LikelihoodField {
    fn distance(&self, world_x: f64, world_y: f64) -> f64 {
        LikelihoodField::distance(self, world_x, world_y)
    }
}

//! Field geometry shared by the boundary bitmap and the likelihood field
//!
//! World coordinates have their origin at the field center with y pointing
//! up. Grid coordinates have their origin at the top-left corner with rows
//! going down, offset from the world origin by `(center_x, center_y)`.

use crate::common::{LocalizationError, LocalizationResult};

/// Dimensions of the playing field and of the grids that cover it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    /// Playing-field width in world units
    pub field_width: f64,
    /// Playing-field height in world units
    pub field_height: f64,
    /// Grid columns
    pub grid_width: usize,
    /// Grid rows
    pub grid_height: usize,
    /// Grid column of the world origin
    pub center_x: i64,
    /// Grid row of the world origin
    pub center_y: i64,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self::with_border(900, 600, 100)
    }
}

impl FieldGeometry {
    /// Field of `width × height` surrounded by a `border` margin on every side,
    /// with the world origin at the grid center.
    pub fn with_border(width: usize, height: usize, border: usize) -> Self {
        let grid_width = width + 2 * border;
        let grid_height = height + 2 * border;
        FieldGeometry {
            field_width: width as f64,
            field_height: height as f64,
            grid_width,
            grid_height,
            center_x: (grid_width / 2) as i64,
            center_y: (grid_height / 2) as i64,
        }
    }

    /// Number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.grid_width * self.grid_height
    }

    pub fn validate(&self) -> LocalizationResult<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(LocalizationError::InvalidParameter(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if !(self.field_width > 0.0 && self.field_height > 0.0) {
            return Err(LocalizationError::InvalidParameter(format!(
                "field extent must be positive, got {}x{}",
                self.field_width, self.field_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let g = FieldGeometry::default();
        assert_eq!(g.grid_width, 1100);
        assert_eq!(g.grid_height, 800);
        assert_eq!((g.center_x, g.center_y), (550, 400));
        assert_eq!(g.cell_count(), 880_000);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_empty_grid_rejected() {
        let g = FieldGeometry::with_border(0, 0, 0);
        assert!(matches!(g.validate(), Err(LocalizationError::InvalidParameter(_))));
    }
}

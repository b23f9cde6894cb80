// Field representation module: geometry, boundary bitmap and likelihood field

pub mod field_bitmap;
pub mod geometry;
pub mod likelihood_field;

pub use field_bitmap::*;
pub use geometry::*;
pub use likelihood_field::*;

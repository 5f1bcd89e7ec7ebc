//! Composite quality indices computed per aggregated row.

pub mod air;
pub mod water;

pub use air::air_quality_index;
pub use water::water_quality_index;

//! Visualization stages
//!
//! Contains the goniometer density field and the offline renderer that
//! composes it with the graticule and meters.

mod density;
mod overlay;

pub use density::DensityAccumulator;
pub(crate) use density::layer_image;
pub use overlay::render_overlay;

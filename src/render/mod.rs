pub mod composite;
pub mod raster;
pub mod surface;

pub use raster::{ReferenceLayers, rasterize_reference};
pub use surface::Surface;

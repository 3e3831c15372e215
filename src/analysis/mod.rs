pub mod aggregate;
pub mod geometry;
pub mod scan;
pub mod segment;

pub use aggregate::{DeviationReport, aggregate_deviation, filtered_mean, split_into_three};
pub use geometry::{CanvasLayout, ReferenceArc, ReferenceLine, ReferencePath, arc_from_points};
pub use scan::{DistanceSample, measure_distances};
pub use segment::{Orientation, SegmentedTrajectory, segment_trajectory};

pub mod collection;
pub mod cost;
pub mod cost_matrix;
pub mod edge_analysis;
pub mod error;
pub mod feature;
pub mod merging;
pub mod parallel;
pub mod segment;
pub mod settings;
pub mod splitting;
pub mod spot;

#[cfg(test)]
mod test_cost_functions;

pub use collection::{FeatureFilter, SpotCollection};
pub use cost::{CostCalculator, LinkingCostCalculator};
pub use cost_matrix::{BuildStats, CostMatrix};
pub use edge_analysis::{EdgeFeatures, EdgeVelocityAnalyzer};
pub use error::TrackError;
pub use feature::{Feature, FeatureStore};
pub use merging::MergingCostFunction;
pub use segment::TrackSegment;
pub use settings::{FeaturePenalties, LinkingSettings, TrackerSettings};
pub use splitting::SplittingCostFunction;
pub use spot::{Spot, SpotId, SpotIdAllocator};

use crate::feature::Feature;
use crate::spot::SpotId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("invalid tracker settings: {0}")]
    Config(String),
    #[error("spot {spot} has no value for feature {feature}")]
    MissingFeature { spot: SpotId, feature: Feature },
    #[error("spot {spot} has a non-finite or out-of-range value for feature {feature}")]
    InvalidFeature { spot: SpotId, feature: Feature },
    #[error("could not start worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;

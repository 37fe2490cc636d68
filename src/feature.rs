use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/* -----------------------------------------------------------------------------
 * Dimension enum
 * ----------------------------------------------------------------------------- */

/// Physical dimension of a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    None,
    Position,
    Length,
    Time,
    Intensity,
    Quality,
    Angle,
}

/* -----------------------------------------------------------------------------
 * Feature enum
 * ----------------------------------------------------------------------------- */

/// Closed set of numeric features a spot can carry.
///
/// Features serialize with their upper-case key (`"POSITION_X"`,
/// `"MEAN_INTENSITY"`, ...), which is also the spelling used in the
/// penalty tables of the tracker settings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    PositionX,
    PositionY,
    PositionZ,
    PositionT,
    Quality,
    Radius,
    MeanIntensity,
    MedianIntensity,
    MinIntensity,
    MaxIntensity,
    TotalIntensity,
    StandardDeviation,
    Contrast,
    Snr,
    Morphology,
    #[serde(rename = "ELLIPSOIDFIT_SEMIAXISLENGTH_A")]
    EllipsoidSemiAxisA,
    #[serde(rename = "ELLIPSOIDFIT_SEMIAXISLENGTH_B")]
    EllipsoidSemiAxisB,
    #[serde(rename = "ELLIPSOIDFIT_SEMIAXISLENGTH_C")]
    EllipsoidSemiAxisC,
    #[serde(rename = "ELLIPSOIDFIT_AXISPHI_A")]
    EllipsoidPhiA,
    #[serde(rename = "ELLIPSOIDFIT_AXISPHI_B")]
    EllipsoidPhiB,
    #[serde(rename = "ELLIPSOIDFIT_AXISPHI_C")]
    EllipsoidPhiC,
    #[serde(rename = "ELLIPSOIDFIT_AXISTHETA_A")]
    EllipsoidThetaA,
    #[serde(rename = "ELLIPSOIDFIT_AXISTHETA_B")]
    EllipsoidThetaB,
    #[serde(rename = "ELLIPSOIDFIT_AXISTHETA_C")]
    EllipsoidThetaC,
}

impl Feature {
    pub const COUNT: usize = 24;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::PositionX,
        Feature::PositionY,
        Feature::PositionZ,
        Feature::PositionT,
        Feature::Quality,
        Feature::Radius,
        Feature::MeanIntensity,
        Feature::MedianIntensity,
        Feature::MinIntensity,
        Feature::MaxIntensity,
        Feature::TotalIntensity,
        Feature::StandardDeviation,
        Feature::Contrast,
        Feature::Snr,
        Feature::Morphology,
        Feature::EllipsoidSemiAxisA,
        Feature::EllipsoidSemiAxisB,
        Feature::EllipsoidSemiAxisC,
        Feature::EllipsoidPhiA,
        Feature::EllipsoidPhiB,
        Feature::EllipsoidPhiC,
        Feature::EllipsoidThetaA,
        Feature::EllipsoidThetaB,
        Feature::EllipsoidThetaC,
    ];

    /// Features set on every spot at construction.
    pub const POSITION: [Feature; 4] = [
        Feature::PositionX,
        Feature::PositionY,
        Feature::PositionZ,
        Feature::PositionT,
    ];

    /// Features that enter the Euclidean distance between two spots.
    pub const SPATIAL: [Feature; 3] =
        [Feature::PositionX, Feature::PositionY, Feature::PositionZ];

    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn key(&self) -> &'static str {
        match self {
            Feature::PositionX => "POSITION_X",
            Feature::PositionY => "POSITION_Y",
            Feature::PositionZ => "POSITION_Z",
            Feature::PositionT => "POSITION_T",
            Feature::Quality => "QUALITY",
            Feature::Radius => "RADIUS",
            Feature::MeanIntensity => "MEAN_INTENSITY",
            Feature::MedianIntensity => "MEDIAN_INTENSITY",
            Feature::MinIntensity => "MIN_INTENSITY",
            Feature::MaxIntensity => "MAX_INTENSITY",
            Feature::TotalIntensity => "TOTAL_INTENSITY",
            Feature::StandardDeviation => "STANDARD_DEVIATION",
            Feature::Contrast => "CONTRAST",
            Feature::Snr => "SNR",
            Feature::Morphology => "MORPHOLOGY",
            Feature::EllipsoidSemiAxisA => "ELLIPSOIDFIT_SEMIAXISLENGTH_A",
            Feature::EllipsoidSemiAxisB => "ELLIPSOIDFIT_SEMIAXISLENGTH_B",
            Feature::EllipsoidSemiAxisC => "ELLIPSOIDFIT_SEMIAXISLENGTH_C",
            Feature::EllipsoidPhiA => "ELLIPSOIDFIT_AXISPHI_A",
            Feature::EllipsoidPhiB => "ELLIPSOIDFIT_AXISPHI_B",
            Feature::EllipsoidPhiC => "ELLIPSOIDFIT_AXISPHI_C",
            Feature::EllipsoidThetaA => "ELLIPSOIDFIT_AXISTHETA_A",
            Feature::EllipsoidThetaB => "ELLIPSOIDFIT_AXISTHETA_B",
            Feature::EllipsoidThetaC => "ELLIPSOIDFIT_AXISTHETA_C",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feature::PositionX => "X",
            Feature::PositionY => "Y",
            Feature::PositionZ => "Z",
            Feature::PositionT => "T",
            Feature::Quality => "Quality",
            Feature::Radius => "Radius",
            Feature::MeanIntensity => "Mean intensity",
            Feature::MedianIntensity => "Median intensity",
            Feature::MinIntensity => "Minimal intensity",
            Feature::MaxIntensity => "Maximal intensity",
            Feature::TotalIntensity => "Total intensity",
            Feature::StandardDeviation => "Standard deviation",
            Feature::Contrast => "Contrast",
            Feature::Snr => "Signal/Noise ratio",
            Feature::Morphology => "Morphology",
            Feature::EllipsoidSemiAxisA => "Ellipsoid A semi-axis length",
            Feature::EllipsoidSemiAxisB => "Ellipsoid B semi-axis length",
            Feature::EllipsoidSemiAxisC => "Ellipsoid C semi-axis length",
            Feature::EllipsoidPhiA => "Ellipsoid A axis φ azimuth",
            Feature::EllipsoidPhiB => "Ellipsoid B axis φ azimuth",
            Feature::EllipsoidPhiC => "Ellipsoid C axis φ azimuth",
            Feature::EllipsoidThetaA => "Ellipsoid A axis θ azimuth",
            Feature::EllipsoidThetaB => "Ellipsoid B axis θ azimuth",
            Feature::EllipsoidThetaC => "Ellipsoid C axis θ azimuth",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Feature::PositionX => "X",
            Feature::PositionY => "Y",
            Feature::PositionZ => "Z",
            Feature::PositionT => "T",
            Feature::Quality => "Quality",
            Feature::Radius => "R",
            Feature::MeanIntensity => "Mean",
            Feature::MedianIntensity => "Median",
            Feature::MinIntensity => "Min",
            Feature::MaxIntensity => "Max",
            Feature::TotalIntensity => "Total int.",
            Feature::StandardDeviation => "Stdev.",
            Feature::Contrast => "Contrast",
            Feature::Snr => "SNR",
            Feature::Morphology => "Morpho.",
            Feature::EllipsoidSemiAxisA => "la",
            Feature::EllipsoidSemiAxisB => "lb",
            Feature::EllipsoidSemiAxisC => "lc",
            Feature::EllipsoidPhiA => "φa",
            Feature::EllipsoidPhiB => "φb",
            Feature::EllipsoidPhiC => "φc",
            Feature::EllipsoidThetaA => "θa",
            Feature::EllipsoidThetaB => "θb",
            Feature::EllipsoidThetaC => "θc",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Feature::PositionX | Feature::PositionY | Feature::PositionZ => {
                Dimension::Position
            }
            Feature::PositionT => Dimension::Time,
            Feature::Quality => Dimension::Quality,
            Feature::Radius
            | Feature::EllipsoidSemiAxisA
            | Feature::EllipsoidSemiAxisB
            | Feature::EllipsoidSemiAxisC => Dimension::Length,
            Feature::MeanIntensity
            | Feature::MedianIntensity
            | Feature::MinIntensity
            | Feature::MaxIntensity
            | Feature::TotalIntensity
            | Feature::StandardDeviation => Dimension::Intensity,
            Feature::Contrast | Feature::Snr | Feature::Morphology => {
                Dimension::None
            }
            Feature::EllipsoidPhiA
            | Feature::EllipsoidPhiB
            | Feature::EllipsoidPhiC
            | Feature::EllipsoidThetaA
            | Feature::EllipsoidThetaB
            | Feature::EllipsoidThetaC => Dimension::Angle,
        }
    }

    /// Whether values of this feature are integers stored as `f64`.
    pub fn is_int(&self) -> bool {
        matches!(self, Feature::PositionT | Feature::Morphology)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature key: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.key() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/* -----------------------------------------------------------------------------
 * FeatureStore struct
 * ----------------------------------------------------------------------------- */

/// Per-spot feature values, one slot per [`Feature`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureStore {
    values: [Option<f64>; Feature::COUNT],
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.index()]
    }

    /// Overwrites any previous value.
    #[inline(always)]
    pub fn put(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = Some(value);
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.values[feature.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set features and their values, in [`Feature::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .iter()
            .filter_map(move |&f| self.get(f).map(|value| (f, value)))
    }
}

/// `|a - b| / |(a + b) / 2|`.
///
/// The mean is taken in absolute value so that negative-valued features
/// (angles, signed offsets) still give a non-negative difference. Every
/// penalty factor `1 + weight * diff` then stays at or above 1, and a cost
/// never drops when a weight grows.
///
/// When `a + b == 0` the difference is `0.0` for equal values and
/// `f64::INFINITY` otherwise.
pub fn normalized_diff(a: f64, b: f64) -> f64 {
    let mean = (a + b) / 2.;
    if mean == 0. {
        if a == b {
            return 0.;
        }
        return f64::INFINITY;
    }
    (a - b).abs() / mean.abs()
}

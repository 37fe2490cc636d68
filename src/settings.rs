//! Tracker settings bundle.
//!
//! The bundle uses the same upper-case keys as the tracker configuration
//! files (`ALLOW_TRACK_MERGING`, `BLOCKING_VALUE`, ...). Parsing reports a
//! missing key or a value of the wrong type as [`TrackError::Config`];
//! [`TrackerSettings::merging`] and [`TrackerSettings::splitting`] check the
//! numeric ranges before a cost matrix is built.

use crate::error::{Result, TrackError};
use crate::feature::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Penalty weight per feature. Iterates in [`Feature`] order.
pub type FeaturePenalties = BTreeMap<Feature, f64>;

pub const DEFAULT_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_BLOCKING_VALUE: f64 = 1.0e7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrackerSettings {
    pub allow_track_merging: bool,
    pub allow_track_splitting: bool,
    pub merging_max_distance: f64,
    pub splitting_max_distance: f64,
    pub blocking_value: f64,
    pub merging_feature_penalties: FeaturePenalties,
    pub splitting_feature_penalties: FeaturePenalties,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            allow_track_merging: false,
            allow_track_splitting: false,
            merging_max_distance: DEFAULT_MAX_DISTANCE,
            splitting_max_distance: DEFAULT_MAX_DISTANCE,
            blocking_value: DEFAULT_BLOCKING_VALUE,
            merging_feature_penalties: FeaturePenalties::new(),
            splitting_feature_penalties: FeaturePenalties::new(),
        }
    }
}

/// Validated parameters for one event type (merging or splitting).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkingSettings {
    pub allowed: bool,
    pub max_distance: f64,
    pub blocking_value: f64,
    pub penalties: FeaturePenalties,
}

impl TrackerSettings {
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| TrackError::Config(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrackError::Config(e.to_string()))
    }

    /// Allow merging events closer than `max_distance`.
    pub fn with_merging(self, max_distance: f64) -> Self {
        Self {
            allow_track_merging: true,
            merging_max_distance: max_distance,
            ..self
        }
    }

    /// Allow splitting events closer than `max_distance`.
    pub fn with_splitting(self, max_distance: f64) -> Self {
        Self {
            allow_track_splitting: true,
            splitting_max_distance: max_distance,
            ..self
        }
    }

    pub fn with_blocking_value(self, blocking_value: f64) -> Self {
        Self {
            blocking_value,
            ..self
        }
    }

    pub fn with_merging_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.merging_feature_penalties.insert(feature, weight);
        self
    }

    pub fn with_splitting_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.splitting_feature_penalties.insert(feature, weight);
        self
    }

    pub fn merging(&self) -> Result<LinkingSettings> {
        LinkingSettings::validated(
            "merging",
            self.allow_track_merging,
            self.merging_max_distance,
            self.blocking_value,
            &self.merging_feature_penalties,
        )
    }

    pub fn splitting(&self) -> Result<LinkingSettings> {
        LinkingSettings::validated(
            "splitting",
            self.allow_track_splitting,
            self.splitting_max_distance,
            self.blocking_value,
            &self.splitting_feature_penalties,
        )
    }
}

impl LinkingSettings {
    fn validated(
        event: &str,
        allowed: bool,
        max_distance: f64,
        blocking_value: f64,
        penalties: &FeaturePenalties,
    ) -> Result<Self> {
        if !(blocking_value.is_finite() && blocking_value > 0.) {
            return Err(TrackError::Config(format!(
                "blocking value must be finite and positive, but got {}",
                blocking_value
            )));
        }
        if allowed {
            if !(max_distance.is_finite() && max_distance > 0.) {
                return Err(TrackError::Config(format!(
                    "{} max distance must be finite and positive, but got {}",
                    event, max_distance
                )));
            }
            if let Some((feature, weight)) = penalties
                .iter()
                .find(|(_, w)| !(w.is_finite() && **w >= 0.))
            {
                return Err(TrackError::Config(format!(
                    "{} penalty for {} must be finite and non-negative, but got {}",
                    event, feature, weight
                )));
            }
        }
        Ok(Self {
            allowed,
            max_distance,
            blocking_value,
            penalties: penalties.clone(),
        })
    }
}

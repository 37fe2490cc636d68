use crate::error::{Result, TrackError};
use crate::feature::{normalized_diff, Feature, FeatureStore};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/*----------------------------------------------------------------------------
SpotId
----------------------------------------------------------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpotId(u64);

impl SpotId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out spot identities. Shared by reference between detection threads;
/// ids are unique per allocator and never reused.
#[derive(Debug, Default)]
pub struct SpotIdAllocator {
    next: AtomicU64,
}

impl SpotIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> SpotId {
        SpotId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/*----------------------------------------------------------------------------
Spot struct
----------------------------------------------------------------------------*/

/// One detection in one frame.
///
/// Position features are written at construction, and a spot never loses a
/// feature afterwards. Equality and hashing only look at the id.
#[derive(Debug, Clone)]
pub struct Spot {
    id: SpotId,
    name: Option<String>,
    features: FeatureStore,
    visible: bool,
}

impl Spot {
    /// `coordinates` is `[x, y, z]`; use `z = 0` for 2-D data.
    pub fn new(ids: &SpotIdAllocator, coordinates: [f64; 3], frame: i64) -> Self {
        let mut features = FeatureStore::new();
        for (feature, value) in Feature::SPATIAL.iter().zip(coordinates) {
            features.put(*feature, value);
        }
        features.put(Feature::PositionT, frame as f64);
        Self {
            id: ids.next_id(),
            name: None,
            features,
            visible: true,
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn id(&self) -> SpotId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.features.get(feature)
    }

    pub fn put(&mut self, feature: Feature, value: f64) {
        self.features.put(feature, value);
    }

    /// Value of `feature`, or [`TrackError::MissingFeature`].
    pub fn require(&self, feature: Feature) -> Result<f64> {
        self.features
            .get(feature)
            .ok_or(TrackError::MissingFeature {
                spot: self.id,
                feature,
            })
    }

    /// Frame index, read from [`Feature::PositionT`]. A value that is not
    /// finite or does not fit an `i64` is an error.
    pub fn frame(&self) -> Result<i64> {
        let t = self.require(Feature::PositionT)?.round();
        if !(i64::MIN as f64..=i64::MAX as f64).contains(&t) {
            return Err(TrackError::InvalidFeature {
                spot: self.id,
                feature: Feature::PositionT,
            });
        }
        Ok(t as i64)
    }

    pub fn position(&self) -> Result<[f64; 3]> {
        Ok([
            self.require(Feature::PositionX)?,
            self.require(Feature::PositionY)?,
            self.require(Feature::PositionZ)?,
        ])
    }

    pub fn set_frame(&mut self, frame: i64) {
        self.put(Feature::PositionT, frame as f64);
    }

    /// `self[feature] - other[feature]`.
    pub fn diff_to(&self, other: &Spot, feature: Feature) -> Result<f64> {
        Ok(self.require(feature)? - other.require(feature)?)
    }

    /// Absolute difference over the mean magnitude. See [`normalized_diff`]
    /// for the zero-mean case.
    pub fn normalized_diff_to(&self, other: &Spot, feature: Feature) -> Result<f64> {
        Ok(normalized_diff(self.require(feature)?, other.require(feature)?))
    }

    /// Squared Euclidean distance over x, y and z.
    pub fn square_distance_to(&self, other: &Spot) -> Result<f64> {
        let mut sum = 0.;
        for feature in Feature::SPATIAL {
            let d = other.require(feature)? - self.require(feature)?;
            sum += d * d;
        }
        Ok(sum)
    }
}

impl PartialEq for Spot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Spot {}

impl Hash for Spot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn format_value(value: f64) -> String {
    if value >= 1e4 {
        format!("{:.1e}", value)
    } else {
        format!("{:.1}", value)
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => writeln!(f, "Spot: {}", name)?,
            None => writeln!(f, "Spot: <no name>")?,
        }
        match self.get(Feature::PositionT) {
            Some(t) => writeln!(f, "Frame: {}", t)?,
            None => writeln!(f, "Frame: <none>")?,
        }
        match self.position() {
            Ok([x, y, z]) => writeln!(f, "Position: ({}, {}, {})", x, y, z)?,
            Err(_) => writeln!(f, "Position: <no coordinates>")?,
        }
        if self.features.is_empty() {
            return writeln!(f, "No features calculated");
        }
        writeln!(f, "Feature list:")?;
        for (feature, value) in self.features.iter() {
            writeln!(f, "\t{}: {}", feature, format_value(value))?;
        }
        Ok(())
    }
}

use crate::error::Result;
use crate::feature::Feature;
use crate::spot::Spot;
use std::collections::BTreeMap;

/*----------------------------------------------------------------------------
FeatureFilter
----------------------------------------------------------------------------*/

/// Keeps spots whose `feature` is strictly above (or strictly below) `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureFilter {
    pub feature: Feature,
    pub value: f64,
    pub is_above: bool,
}

impl FeatureFilter {
    pub fn above(feature: Feature, value: f64) -> Self {
        Self {
            feature,
            value,
            is_above: true,
        }
    }

    pub fn below(feature: Feature, value: f64) -> Self {
        Self {
            feature,
            value,
            is_above: false,
        }
    }

    /// A spot without the feature never passes.
    pub fn accepts(&self, spot: &Spot) -> bool {
        match spot.get(self.feature) {
            Some(v) if self.is_above => v > self.value,
            Some(v) => v < self.value,
            None => false,
        }
    }
}

/*----------------------------------------------------------------------------
SpotCollection
----------------------------------------------------------------------------*/

/// Spots of a whole movie, grouped by frame.
///
/// Filtering never removes spots, it only flips their visibility.
#[derive(Debug, Clone, Default)]
pub struct SpotCollection {
    frames: BTreeMap<i64, Vec<Spot>>,
}

impl SpotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spot: Spot) -> Result<()> {
        let frame = spot.frame()?;
        self.frames.entry(frame).or_default().push(spot);
        Ok(())
    }

    pub fn frames(&self) -> impl Iterator<Item = i64> + '_ {
        self.frames.keys().copied()
    }

    pub fn get(&self, frame: i64) -> &[Spot] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_mut(&mut self, frame: i64) -> Option<&mut [Spot]> {
        self.frames.get_mut(&frame).map(Vec::as_mut_slice)
    }

    pub fn len(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len_visible(&self) -> usize {
        self.iter_visible().count()
    }

    /// All spots, frame by frame.
    pub fn iter(&self) -> impl Iterator<Item = &Spot> + '_ {
        self.frames.values().flatten()
    }

    pub fn iter_visible(&self) -> impl Iterator<Item = &Spot> + '_ {
        self.iter().filter(|spot| spot.is_visible())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Spot> + '_ {
        self.frames.values_mut().flatten()
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for spot in self.iter_mut() {
            spot.set_visible(visible);
        }
    }

    /// Marks visible exactly the spots accepted by `filter`.
    pub fn filter(&mut self, filter: &FeatureFilter) {
        self.filter_all(std::slice::from_ref(filter));
    }

    /// Marks visible exactly the spots accepted by every filter. With no
    /// filters every spot becomes visible.
    pub fn filter_all(&mut self, filters: &[FeatureFilter]) {
        for spot in self.iter_mut() {
            let keep = filters.iter().all(|f| f.accepts(&*spot));
            spot.set_visible(keep);
        }
    }

    /// Values of `feature`, skipping spots that lack it.
    pub fn collect_values(&self, feature: Feature, visible_only: bool) -> Vec<f64> {
        self.iter()
            .filter(|spot| !visible_only || spot.is_visible())
            .filter_map(|spot| spot.get(feature))
            .collect()
    }

    pub fn collect_values_for(
        &self,
        features: &[Feature],
        visible_only: bool,
    ) -> BTreeMap<Feature, Vec<f64>> {
        features
            .iter()
            .map(|&f| (f, self.collect_values(f, visible_only)))
            .collect()
    }
}

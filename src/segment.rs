use crate::error::Result;
use crate::spot::{Spot, SpotId};
use std::collections::{BTreeMap, HashSet};

/*----------------------------------------------------------------------------
TrackSegment struct
----------------------------------------------------------------------------*/

/// Provisional trajectory: spots ordered by frame, ties broken by id.
#[derive(Debug, Clone, Default)]
pub struct TrackSegment {
    spots: BTreeMap<(i64, SpotId), Spot>,
    ids: HashSet<SpotId>,
}

impl TrackSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_spots<I>(spots: I) -> Result<Self>
    where
        I: IntoIterator<Item = Spot>,
    {
        let mut segment = Self::new();
        for spot in spots {
            segment.insert(spot)?;
        }
        Ok(segment)
    }

    /// Adds `spot`, keyed by its current frame. Returns `false` if a spot
    /// with the same id was already present.
    pub fn insert(&mut self, spot: Spot) -> Result<bool> {
        let key = (spot.frame()?, spot.id());
        if !self.ids.insert(spot.id()) {
            return Ok(false);
        }
        self.spots.insert(key, spot);
        Ok(true)
    }

    /// Earliest member.
    pub fn first(&self) -> Option<&Spot> {
        self.spots.first_key_value().map(|(_, spot)| spot)
    }

    /// Latest member.
    pub fn last(&self) -> Option<&Spot> {
        self.spots.last_key_value().map(|(_, spot)| spot)
    }

    pub fn contains(&self, spot: &Spot) -> bool {
        self.ids.contains(&spot.id())
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spot> + '_ {
        self.spots.values()
    }
}

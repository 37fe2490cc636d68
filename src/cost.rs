use crate::error::Result;
use crate::settings::FeaturePenalties;
use crate::spot::Spot;

/*-----------------------------------------------------------------------------
CostCalculator trait
-----------------------------------------------------------------------------*/

/// Cost of linking two spots.
///
/// Implementations return `blocking_value` for pairs that must not be
/// linked. An `Err` is only returned for spots lacking a feature the
/// computation needs.
pub trait CostCalculator: Sync {
    fn linking_cost(
        &self,
        a: &Spot,
        b: &Spot,
        max_distance: f64,
        blocking_value: f64,
        penalties: &FeaturePenalties,
    ) -> Result<f64>;
}

impl<T> CostCalculator for &T
where
    T: CostCalculator + ?Sized,
{
    fn linking_cost(
        &self,
        a: &Spot,
        b: &Spot,
        max_distance: f64,
        blocking_value: f64,
        penalties: &FeaturePenalties,
    ) -> Result<f64> {
        (**self).linking_cost(a, b, max_distance, blocking_value, penalties)
    }
}

/*-----------------------------------------------------------------------------
LinkingCostCalculator
-----------------------------------------------------------------------------*/

/// Squared distance, compounded by one `1 + weight * normalized_diff` factor
/// per penalized feature.
///
/// Pairs further apart than `max_distance` are blocked. A feature whose
/// normalized difference is infinite (opposite values summing to zero) also
/// blocks the pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkingCostCalculator;

impl CostCalculator for LinkingCostCalculator {
    fn linking_cost(
        &self,
        a: &Spot,
        b: &Spot,
        max_distance: f64,
        blocking_value: f64,
        penalties: &FeaturePenalties,
    ) -> Result<f64> {
        let d2 = a.square_distance_to(b)?;
        if d2.sqrt() > max_distance {
            return Ok(blocking_value);
        }

        let mut cost = d2;
        for (&feature, &weight) in penalties.iter() {
            if weight <= 0. {
                continue;
            }
            let ndiff = a.normalized_diff_to(b, feature)?;
            cost *= 1. + weight * ndiff;
        }

        if !cost.is_finite() {
            return Ok(blocking_value);
        }
        Ok(cost)
    }
}

//! Splitting cost matrix.
//!
//! Rows are middle points, columns are track segments. Cell `(i, j)` is the
//! cost of segment `j` branching off middle point `i`, i.e. of linking the
//! segment's first spot back to that point one frame earlier.

use crate::cost::{CostCalculator, LinkingCostCalculator};
use crate::cost_matrix::{fill_matrix, BuildStats, CostMatrix};
use crate::error::Result;
use crate::parallel::RowScheduler;
use crate::segment::TrackSegment;
use crate::settings::TrackerSettings;
use crate::spot::Spot;
use log::{debug, trace};
use std::time::Instant;

#[derive(Debug)]
pub struct SplittingCostFunction<'a, C = LinkingCostCalculator> {
    calculator: C,
    settings: &'a TrackerSettings,
    segments: &'a [TrackSegment],
    middle_points: &'a [Spot],
    scheduler: RowScheduler,
}

impl<'a> SplittingCostFunction<'a, LinkingCostCalculator> {
    pub fn with_defaults(
        settings: &'a TrackerSettings,
        segments: &'a [TrackSegment],
        middle_points: &'a [Spot],
    ) -> Self {
        Self::new(LinkingCostCalculator, settings, segments, middle_points)
    }
}

impl<'a, C> SplittingCostFunction<'a, C>
where
    C: CostCalculator,
{
    pub fn new(
        calculator: C,
        settings: &'a TrackerSettings,
        segments: &'a [TrackSegment],
        middle_points: &'a [Spot],
    ) -> Self {
        Self {
            calculator,
            settings,
            segments,
            middle_points,
            scheduler: RowScheduler::new(),
        }
    }

    pub fn with_num_threads(self, num_threads: usize) -> Self {
        Self {
            scheduler: self.scheduler.with_num_threads(num_threads),
            ..self
        }
    }

    pub fn num_threads(&self) -> usize {
        self.scheduler.num_threads()
    }

    /// Builds the `middle_points x segments` matrix, or `middle_points x 0`
    /// when splitting is not allowed.
    pub fn build(&self) -> Result<CostMatrix> {
        let start = Instant::now();
        let params = self.settings.splitting()?;
        let rows = self.middle_points.len();

        if !params.allowed {
            trace!("splitting disabled, {} middle points get no candidates", rows);
            let stats = BuildStats {
                elapsed: start.elapsed(),
                num_threads: 0,
            };
            return Ok(CostMatrix::without_columns(rows, params.blocking_value, stats));
        }

        let starts = self
            .segments
            .iter()
            .map(|segment| match segment.first() {
                Some(first) => first.frame().map(|frame| Some((first, frame))),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        let middle_frames = self
            .middle_points
            .iter()
            .map(Spot::frame)
            .collect::<Result<Vec<_>>>()?;

        let cols = self.segments.len();
        let matrix = fill_matrix(
            &self.scheduler,
            rows,
            cols,
            params.blocking_value,
            |i, j| {
                let middle = &self.middle_points[i];
                // a segment cannot branch off one of its own spots
                if self.segments[j].contains(middle) {
                    return Ok(None);
                }
                let Some((seg_start, start_frame)) = starts[j] else {
                    return Ok(None);
                };
                if middle_frames[i].checked_add(1) != Some(start_frame) {
                    return Ok(None);
                }
                self.calculator
                    .linking_cost(
                        seg_start,
                        middle,
                        params.max_distance,
                        params.blocking_value,
                        &params.penalties,
                    )
                    .map(Some)
            },
        )?;

        let stats = BuildStats {
            elapsed: start.elapsed(),
            num_threads: self.scheduler.workers_for(rows),
        };
        debug!(
            "splitting cost matrix {}x{} built in {:?} with {} threads",
            rows, cols, stats.elapsed, stats.num_threads
        );
        Ok(CostMatrix::new(matrix, params.blocking_value, stats))
    }
}

//! Merging cost matrix.
//!
//! Rows are track segments, columns are middle points. Cell `(i, j)` is the
//! cost of appending middle point `j` to the end of segment `i`. Merges only
//! reach into the frame right after the segment's last spot; every other
//! pair is blocked.

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
pub struct MergingCostFunction<'a, C = LinkingCostCalculator> {
    calculator: C,
    settings: &'a TrackerSettings,
    segments: &'a [TrackSegment],
    middle_points: &'a [Spot],
    scheduler: RowScheduler,
}

impl<'a> MergingCostFunction<'a, LinkingCostCalculator> {
    /// Uses [`LinkingCostCalculator`] and one worker per processing unit.
    pub fn with_defaults(
        settings: &'a TrackerSettings,
        segments: &'a [TrackSegment],
        middle_points: &'a [Spot],
    ) -> Self {
        Self::new(LinkingCostCalculator, settings, segments, middle_points)
    }
}

impl<'a, C> MergingCostFunction<'a, C>
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

    /// Builds the `segments x middle_points` matrix, or `segments x 0` when
    /// merging is not allowed.
    pub fn build(&self) -> Result<CostMatrix> {
        let start = Instant::now();
        let params = self.settings.merging()?;
        let rows = self.segments.len();

        if !params.allowed {
            trace!("merging disabled, {} segments get no candidates", rows);
            let stats = BuildStats {
                elapsed: start.elapsed(),
                num_threads: 0,
            };
            return Ok(CostMatrix::without_columns(rows, params.blocking_value, stats));
        }

        // Frames are read once, before any worker starts.
        let ends = self
            .segments
            .iter()
            .map(|segment| match segment.last() {
                Some(end) => end.frame().map(|frame| Some((end, frame))),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        let middle_frames = self
            .middle_points
            .iter()
            .map(Spot::frame)
            .collect::<Result<Vec<_>>>()?;

        let cols = self.middle_points.len();
        let matrix = fill_matrix(
            &self.scheduler,
            rows,
            cols,
            params.blocking_value,
            |i, j| {
                let Some((end, end_frame)) = ends[i] else {
                    return Ok(None);
                };
                // only into the very next frame
                if end_frame.checked_add(1) != Some(middle_frames[j]) {
                    return Ok(None);
                }
                self.calculator
                    .linking_cost(
                        end,
                        &self.middle_points[j],
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
            "merging cost matrix {}x{} built in {:?} with {} threads",
            rows, cols, stats.elapsed, stats.num_threads
        );
        Ok(CostMatrix::new(matrix, params.blocking_value, stats))
    }
}

use crate::cost_matrix::BuildStats;
use crate::error::Result;
use crate::feature::Feature;
use crate::parallel::RowScheduler;
use crate::spot::Spot;
use log::debug;
use std::time::Instant;

/// Features of one link between two spots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFeatures {
    /// Euclidean distance between the two spots.
    pub displacement: f64,
    /// Displacement per frame. Infinite for two spots in the same frame.
    pub velocity: f64,
}

impl EdgeFeatures {
    pub fn between(source: &Spot, target: &Spot) -> Result<Self> {
        let dx = target.diff_to(source, Feature::PositionX)?;
        let dy = target.diff_to(source, Feature::PositionY)?;
        let dz = target.diff_to(source, Feature::PositionZ)?;
        let dt = target.diff_to(source, Feature::PositionT)?;
        let displacement = (dx * dx + dy * dy + dz * dz).sqrt();
        Ok(Self {
            displacement,
            velocity: displacement / dt.abs(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAnalysis {
    /// One entry per input link, same order.
    pub features: Vec<EdgeFeatures>,
    pub stats: BuildStats,
}

/// Computes [`EdgeFeatures`] for a batch of links, one link per worker row.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeVelocityAnalyzer {
    scheduler: RowScheduler,
}

impl EdgeVelocityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_threads(self, num_threads: usize) -> Self {
        Self {
            scheduler: self.scheduler.with_num_threads(num_threads),
        }
    }

    pub fn process(&self, links: &[(&Spot, &Spot)]) -> Result<EdgeAnalysis> {
        let start = Instant::now();
        let features = self
            .scheduler
            .run_rows(links.len(), |i| {
                let (source, target) = links[i];
                EdgeFeatures::between(source, target)
            })?;
        let stats = BuildStats {
            elapsed: start.elapsed(),
            num_threads: self.scheduler.workers_for(links.len()),
        };
        debug!("analyzed {} edges in {:?}", links.len(), stats.elapsed);
        Ok(EdgeAnalysis { features, stats })
    }
}

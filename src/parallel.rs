use crate::error::{Result, TrackError};
use log::warn;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/* -----------------------------------------------------------------------------
 * RowScheduler
 * ----------------------------------------------------------------------------- */

/// Runs one closure per row on a fixed-size worker pool.
///
/// Workers share an atomic row cursor: each one claims the next free row,
/// computes it completely, then claims another. Every row result lands in its
/// own write-once slot, so the output does not depend on which worker
/// handled which row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowScheduler {
    num_threads: usize,
}

impl Default for RowScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl RowScheduler {
    /// One worker per available processing unit.
    pub fn new() -> Self {
        Self {
            num_threads: available_threads(),
        }
    }

    /// `0` restores the default.
    pub fn with_num_threads(self, num_threads: usize) -> Self {
        if num_threads == 0 {
            return Self::new();
        }
        Self { num_threads }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Workers actually started for `rows` rows; none for an empty batch.
    pub fn workers_for(&self, rows: usize) -> usize {
        self.num_threads.min(rows)
    }

    /// Computes `row(i)` for every `i < rows` and returns the results in row
    /// order. The first error stops all workers from claiming new rows and is
    /// returned in place of the results.
    pub fn run_rows<R, F>(&self, rows: usize, row: F) -> Result<Vec<R>>
    where
        R: Send + Sync,
        F: Fn(usize) -> Result<R> + Sync,
    {
        if rows == 0 {
            return Ok(Vec::new());
        }

        let workers = self.workers_for(rows);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("laptrack-row-worker-{}", i))
            .build()
            .map_err(|e| TrackError::ThreadPool(e.to_string()))?;

        let cursor = AtomicUsize::new(0);
        let failure: OnceLock<TrackError> = OnceLock::new();
        let slots: Vec<OnceLock<R>> = (0..rows).map(|_| OnceLock::new()).collect();

        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| loop {
                    if failure.get().is_some() {
                        break;
                    }
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    if i >= rows {
                        break;
                    }
                    match row(i) {
                        Ok(value) => {
                            let _ = slots[i].set(value);
                        }
                        Err(err) => {
                            warn!("row {} aborted: {}", i, err);
                            let _ = failure.set(err);
                            break;
                        }
                    }
                });
            }
        });

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }

        let mut results = Vec::with_capacity(rows);
        for (i, slot) in slots.into_iter().enumerate() {
            match slot.into_inner() {
                Some(value) => results.push(value),
                None => {
                    return Err(TrackError::ThreadPool(format!(
                        "row {} was never computed",
                        i
                    )))
                }
            }
        }
        Ok(results)
    }
}

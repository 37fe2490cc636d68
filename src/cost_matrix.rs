use crate::error::Result;
use crate::parallel::RowScheduler;
use nalgebra::DMatrix;
use std::time::Duration;

/* -----------------------------------------------------------------------------
 * BuildStats
 * ----------------------------------------------------------------------------- */

/// Diagnostics of the last build. Not part of the result's meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    pub elapsed: Duration,
    pub num_threads: usize,
}

/* -----------------------------------------------------------------------------
 * CostMatrix
 * ----------------------------------------------------------------------------- */

/// Dense cost matrix handed to the assignment solver.
///
/// Row and column indices follow the order of the input slices. Every cell is
/// either a finite cost or `blocking_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    matrix: DMatrix<f64>,
    blocking_value: f64,
    stats: BuildStats,
}

impl CostMatrix {
    pub(crate) fn new(
        matrix: DMatrix<f64>,
        blocking_value: f64,
        stats: BuildStats,
    ) -> Self {
        Self {
            matrix,
            blocking_value,
            stats,
        }
    }

    /// `rows x 0`: the event type is disabled and nothing can be assigned.
    pub(crate) fn without_columns(
        rows: usize,
        blocking_value: f64,
        stats: BuildStats,
    ) -> Self {
        Self::new(DMatrix::zeros(rows, 0), blocking_value, stats)
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.matrix[(row, col)] >= self.blocking_value
    }

    pub fn blocking_value(&self) -> f64 {
        self.blocking_value
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }

    /// Row-major copy, the layout most solvers take.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// Evaluates `cell(i, j)` for the whole `rows x cols` grid, row-parallel.
///
/// `cell` returns `None` for pairs that are not eligible; those are written
/// as `blocking_value`.
pub(crate) fn fill_matrix<F>(
    scheduler: &RowScheduler,
    rows: usize,
    cols: usize,
    blocking_value: f64,
    cell: F,
) -> Result<DMatrix<f64>>
where
    F: Fn(usize, usize) -> Result<Option<f64>> + Sync,
{
    let grid = scheduler.run_rows(rows, |i| {
        (0..cols)
            .map(|j| cell(i, j).map(|cost| cost.unwrap_or(blocking_value)))
            .collect::<Result<Vec<f64>>>()
    })?;
    let data: Vec<f64> = grid.into_iter().flatten().collect();
    Ok(DMatrix::from_row_slice(rows, cols, &data))
}

/*-----------------------------------------------------------------------------
Tests for the merging and splitting cost functions
-------------------------------------------------------------------------------*/
use crate::cost::CostCalculator;
use crate::error::{Result, TrackError};
use crate::feature::Feature;
use crate::merging::MergingCostFunction;
use crate::segment::TrackSegment;
use crate::settings::{FeaturePenalties, TrackerSettings};
use crate::splitting::SplittingCostFunction;
use crate::spot::{Spot, SpotIdAllocator};
use nearly_eq::assert_nearly_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};

const BLOCKING: f64 = 1e5;

fn settings() -> TrackerSettings {
    TrackerSettings::default()
        .with_merging(5.)
        .with_splitting(5.)
        .with_blocking_value(BLOCKING)
}

fn segment(ids: &SpotIdAllocator, x: f64, frames: std::ops::RangeInclusive<i64>) -> TrackSegment {
    TrackSegment::try_from_spots(frames.map(|t| Spot::new(ids, [x, 0., 0.], t))).unwrap()
}

/// Counts how often it is asked for a cost; always answers 1.
#[derive(Debug, Default)]
struct CountingCalculator {
    calls: AtomicUsize,
}

impl CostCalculator for CountingCalculator {
    fn linking_cost(
        &self,
        _a: &Spot,
        _b: &Spot,
        _max_distance: f64,
        _blocking_value: f64,
        _penalties: &FeaturePenalties,
    ) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(1.)
    }
}

#[test]
fn test_merging_frame_adjacency() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 3..=5)];
    let middle_points: Vec<Spot> = [7, 6, 5, 4]
        .iter()
        .map(|&t| Spot::new(&ids, [1., 0., 0.], t))
        .collect();

    let settings = settings();
    let matrix = MergingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();

    assert_eq!(matrix.shape(), (1, 4));
    assert_eq!(matrix.get(0, 0), BLOCKING);
    assert_nearly_eq!(matrix.get(0, 1), 1., 1e-12);
    assert_eq!(matrix.get(0, 2), BLOCKING);
    assert_eq!(matrix.get(0, 3), BLOCKING);
}

#[test]
fn test_merging_disabled_has_no_columns() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 0..=1), segment(&ids, 3., 0..=1)];
    let middle_points = vec![Spot::new(&ids, [0., 0., 0.], 2)];

    let settings = TrackerSettings::default().with_splitting(5.);
    let matrix = MergingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(matrix.shape(), (2, 0));
}

#[test]
fn test_merging_only_costs_eligible_cells() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 0..=2), segment(&ids, 0., 0..=4)];
    let middle_points: Vec<Spot> =
        (0..6).map(|t| Spot::new(&ids, [0., 0., 0.], t)).collect();

    let settings = settings();
    let calculator = CountingCalculator::default();
    let matrix = MergingCostFunction::new(&calculator, &settings, &segments, &middle_points)
        .with_num_threads(2)
        .build()
        .unwrap();

    assert_eq!(matrix.shape(), (2, 6));
    assert_eq!(calculator.calls.load(Ordering::Relaxed), 2);
    assert_eq!(matrix.get(0, 3), 1.);
    assert_eq!(matrix.get(1, 5), 1.);
    let blocked = (0..2)
        .flat_map(|i| (0..6).map(move |j| (i, j)))
        .filter(|&(i, j)| matrix.is_blocked(i, j))
        .count();
    assert_eq!(blocked, 10);
}

#[test]
fn test_empty_segment_row_is_blocked() {
    let ids = SpotIdAllocator::new();
    let segments = vec![TrackSegment::new()];
    let middle_points = vec![Spot::new(&ids, [0., 0., 0.], 1)];
    let settings = settings();

    let merging = MergingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(merging.to_rows(), vec![vec![BLOCKING]]);

    let splitting = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(splitting.to_rows(), vec![vec![BLOCKING]]);
}

#[test]
fn test_splitting_frame_adjacency() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 5..=8)];
    let middle_points: Vec<Spot> = [4, 5, 6, 3]
        .iter()
        .map(|&t| Spot::new(&ids, [0., 2., 0.], t))
        .collect();

    let settings = settings();
    let matrix = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();

    assert_eq!(matrix.shape(), (4, 1));
    assert_nearly_eq!(matrix.get(0, 0), 4., 1e-12);
    assert_eq!(matrix.get(1, 0), BLOCKING);
    assert_eq!(matrix.get(2, 0), BLOCKING);
    assert_eq!(matrix.get(3, 0), BLOCKING);
}

#[test]
fn test_splitting_blocks_own_members() {
    let ids = SpotIdAllocator::new();
    let member = Spot::new(&ids, [0., 0., 0.], 5);
    let segments = vec![TrackSegment::try_from_spots(vec![
        member.clone(),
        Spot::new(&ids, [0., 0., 0.], 6),
    ])
    .unwrap()];

    // Same spot, moved one frame before the segment start: frame adjacency
    // and distance both pass, membership must still block.
    let mut moved = member.clone();
    moved.set_frame(4);
    let stranger = Spot::new(&ids, [0., 0., 0.], 4);
    let middle_points = vec![moved, stranger];

    let settings = settings();
    let matrix = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(matrix.get(0, 0), BLOCKING);
    assert_eq!(matrix.get(1, 0), 0.);
}

#[test]
fn test_splitting_disabled_has_no_columns() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 1..=2)];
    let middle_points: Vec<Spot> =
        (0..3).map(|t| Spot::new(&ids, [0., 0., 0.], t)).collect();

    let settings = TrackerSettings::default().with_merging(5.);
    let matrix = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(matrix.shape(), (3, 0));
    assert_eq!(matrix.stats().num_threads, 0);
}

#[test]
fn test_splitting_uses_its_own_penalties() {
    let ids = SpotIdAllocator::new();
    let mut first = Spot::new(&ids, [1., 0., 0.], 1);
    first.put(Feature::Radius, 2.);
    let segments = vec![TrackSegment::try_from_spots(vec![first]).unwrap()];
    let mut middle = Spot::new(&ids, [0., 0., 0.], 0);
    middle.put(Feature::Radius, 6.);
    let middle_points = vec![middle];

    let settings = settings()
        .with_merging_penalty(Feature::Radius, 100.)
        .with_splitting_penalty(Feature::Radius, 2.);
    let matrix = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    // 1 * (1 + 2 * |2 - 6| / 4)
    assert_nearly_eq!(matrix.get(0, 0), 3., 1e-12);
}

#[test]
fn test_missing_feature_aborts_build() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 0..=1)];
    let middle_points = vec![Spot::new(&ids, [1., 0., 0.], 2)];

    let settings = settings().with_merging_penalty(Feature::MeanIntensity, 1.);
    let res = MergingCostFunction::with_defaults(&settings, &segments, &middle_points).build();
    assert!(matches!(
        res,
        Err(TrackError::MissingFeature {
            feature: Feature::MeanIntensity,
            ..
        })
    ));
}

#[test]
fn test_invalid_settings_fail_before_building() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., 0..=1)];
    let middle_points = vec![Spot::new(&ids, [1., 0., 0.], 2)];

    let settings = settings().with_merging(f64::NAN);
    let calculator = CountingCalculator::default();
    let res = MergingCostFunction::new(&calculator, &settings, &segments, &middle_points).build();
    assert!(matches!(res, Err(TrackError::Config(_))));
    assert_eq!(calculator.calls.load(Ordering::Relaxed), 0);

    let settings = settings.with_blocking_value(-1.);
    let res = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points).build();
    assert!(matches!(res, Err(TrackError::Config(_))));
}

#[test]
fn test_matrices_do_not_depend_on_thread_count() {
    let mut rng = StdRng::seed_from_u64(7);
    let ids = SpotIdAllocator::new();

    let random_spot = |rng: &mut StdRng, frame: i64| {
        let mut spot = Spot::new(
            &ids,
            [rng.gen_range(0.0..20.0), rng.gen_range(0.0..20.0), 0.],
            frame,
        );
        spot.put(Feature::MeanIntensity, rng.gen_range(10.0..100.0));
        spot.put(Feature::Quality, rng.gen_range(0.5..2.0));
        spot
    };

    let segments: Vec<TrackSegment> = (0..40)
        .map(|_| {
            let start = rng.gen_range(0..10);
            let len = rng.gen_range(1..5);
            let spots: Vec<Spot> =
                (start..start + len).map(|t| random_spot(&mut rng, t)).collect();
            TrackSegment::try_from_spots(spots).unwrap()
        })
        .collect();
    let middle_points: Vec<Spot> = (0..60)
        .map(|_| {
            let frame = rng.gen_range(0..14);
            random_spot(&mut rng, frame)
        })
        .collect();

    let settings = TrackerSettings::default()
        .with_merging(8.)
        .with_splitting(8.)
        .with_blocking_value(BLOCKING)
        .with_merging_penalty(Feature::MeanIntensity, 1.5)
        .with_splitting_penalty(Feature::Quality, 0.7);

    let merge = |threads| {
        MergingCostFunction::with_defaults(&settings, &segments, &middle_points)
            .with_num_threads(threads)
            .build()
            .unwrap()
            .into_matrix()
    };
    let split = |threads| {
        SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
            .with_num_threads(threads)
            .build()
            .unwrap()
            .into_matrix()
    };

    let merge_ref = merge(1);
    let split_ref = split(1);
    assert!(merge_ref.iter().any(|&c| c < BLOCKING));
    for threads in [2, 64] {
        let m = merge(threads);
        let s = split(threads);
        assert!(m
            .iter()
            .zip(merge_ref.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
        assert!(s
            .iter()
            .zip(split_ref.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }
}

#[test]
fn test_extreme_frames_are_blocked() {
    let ids = SpotIdAllocator::new();
    let settings = settings();
    let at = |frame: i64| Spot::new(&ids, [0., 0., 0.], frame);

    let segments = vec![
        segment(&ids, 0., 0..=1),
        TrackSegment::try_from_spots(vec![at(i64::MAX)]).unwrap(),
        TrackSegment::try_from_spots(vec![at(i64::MIN)]).unwrap(),
    ];
    let middle_points = vec![at(i64::MIN), at(i64::MAX)];

    let merging = MergingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(merging.shape(), (3, 2));
    assert!(merging.matrix().iter().all(|&c| c == BLOCKING));

    let splitting = SplittingCostFunction::with_defaults(&settings, &segments, &middle_points)
        .build()
        .unwrap();
    assert_eq!(splitting.shape(), (2, 3));
    assert!(splitting.matrix().iter().all(|&c| c == BLOCKING));
}

#[test]
fn test_non_finite_frame_aborts_build() {
    let ids = SpotIdAllocator::new();
    let segments = vec![segment(&ids, 0., -2..=-1)];
    let mut middle = Spot::new(&ids, [0., 0., 0.], 0);
    middle.put(Feature::PositionT, f64::NAN);
    let middle_id = middle.id();
    let middle_points = vec![middle];
    let settings = settings();

    let merging = MergingCostFunction::with_defaults(&settings, &segments, &middle_points).build();
    assert_eq!(
        merging.unwrap_err(),
        TrackError::InvalidFeature {
            spot: middle_id,
            feature: Feature::PositionT
        }
    );

    let splitting =
        SplittingCostFunction::with_defaults(&settings, &segments, &middle_points).build();
    assert_eq!(
        splitting.unwrap_err(),
        TrackError::InvalidFeature {
            spot: middle_id,
            feature: Feature::PositionT
        }
    );
}

#[test]
fn test_enabled_build_without_rows_starts_no_workers() {
    let ids = SpotIdAllocator::new();
    let middle_points = vec![Spot::new(&ids, [0., 0., 0.], 1)];
    let settings = settings();

    let matrix = MergingCostFunction::with_defaults(&settings, &[], &middle_points)
        .build()
        .unwrap();
    assert_eq!(matrix.shape(), (0, 1));
    assert_eq!(matrix.stats().num_threads, 0);
}

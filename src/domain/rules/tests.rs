// Unit tests for plan repair rules

use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bounds(plan: &NormalizedPlan) -> Vec<(f64, f64)> {
    plan.segments().iter().map(|s| (s.start_sec, s.end_sec)).collect()
}

fn normalize(segments: Vec<Segment>, duration: f64) -> NormalizedPlan {
    PlanRules::normalize(EditPlan::new(segments), duration)
}

#[test]
fn test_end_beyond_duration_is_clamped() {
    let plan = normalize(vec![Segment::keep(0.0, 35.0)], 30.0);
    assert_eq!(bounds(&plan), vec![(0.0, 30.0)]);
    assert!(plan.covers_duration(1e-9));
}

#[test]
fn test_unsorted_plan_is_sorted_and_closed() {
    let plan = normalize(
        vec![
            Segment::edit(10.0, 20.0, "zoom_in"),
            Segment::keep(0.0, 10.0),
            Segment::keep(20.0, 28.5),
        ],
        30.0,
    );
    assert_eq!(bounds(&plan), vec![(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
    assert_eq!(plan.segments()[1].effect(), Some("zoom_in"));
}

#[test]
fn test_gaps_and_late_start_are_closed() {
    let plan = normalize(vec![Segment::keep(2.0, 10.0), Segment::keep(12.0, 30.0)], 30.0);
    assert_eq!(bounds(&plan), vec![(0.0, 10.0), (10.0, 30.0)]);
    assert!(plan.covers_duration(1e-9));
}

#[test]
fn test_degenerate_segment_past_end_is_repaired() {
    let mut segment = Segment::edit(40.0, 45.0, "blur");
    PlanRules::clamp(&mut segment, 30.0);
    assert_eq!((segment.start_sec, segment.end_sec), (29.0, 30.0));

    let plan = normalize(vec![Segment::keep(0.0, 20.0), Segment::edit(40.0, 45.0, "blur")], 30.0);
    assert_eq!(bounds(&plan), vec![(0.0, 20.0), (20.0, 30.0)]);
    assert_eq!(plan.segments()[1].effect(), Some("blur"));
}

#[test]
fn test_inverted_segment_gets_one_second_window() {
    let mut segment = Segment::keep(12.0, 4.0);
    PlanRules::clamp(&mut segment, 30.0);
    assert_eq!((segment.start_sec, segment.end_sec), (12.0, 13.0));
}

#[test]
fn test_overlapping_segment_is_absorbed() {
    let plan = normalize(
        vec![
            Segment::keep(0.0, 20.0),
            Segment::keep(5.0, 10.0),
            Segment::keep(10.0, 30.0),
        ],
        30.0,
    );
    assert!(plan.covers_duration(1e-9));
    assert_eq!(bounds(&plan), vec![(0.0, 20.0), (20.0, 30.0)]);
}

#[test]
fn test_keep_segments_lose_effect_name() {
    let mut keep = Segment::keep(0.0, 5.0);
    keep.effect_name = Some("blur".to_string());
    let plan = normalize(vec![keep], 5.0);
    assert_eq!(plan.segments()[0].effect_name, None);
}

#[test]
fn test_short_media_single_segment() {
    let plan = normalize(vec![Segment::keep(3.0, 3.0)], 0.5);
    assert_eq!(bounds(&plan), vec![(0.0, 0.5)]);
}

#[test]
fn test_non_finite_bounds_are_treated_as_zero() {
    let plan = normalize(vec![Segment::keep(f64::NAN, f64::INFINITY)], 10.0);
    assert_eq!(bounds(&plan), vec![(0.0, 10.0)]);
}

#[test]
fn test_many_random_plans_tile_the_duration() {
    let mut rng = StdRng::seed_from_u64(0x2545_F491);

    for _ in 0..200 {
        let count = rng.gen_range(1..=6);
        let segments = (0..count)
            .map(|_| Segment::keep(rng.gen_range(-10.0..90.0), rng.gen_range(-10.0..90.0)))
            .collect();
        let plan = normalize(segments, 60.0);
        assert!(plan.covers_duration(1e-9), "not tiled: {:?}", bounds(&plan));
    }
}

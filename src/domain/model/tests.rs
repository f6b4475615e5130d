// Unit tests for domain models

use super::*;

#[test]
fn test_segment_deserializes_numbers_and_strings() {
    let json = r#"{"start_sec": 0, "end_sec": "00:10.5", "action": "EDIT", "effect_name": "zoom_in"}"#;
    let segment: Segment = serde_json::from_str(json).unwrap();
    assert_eq!(segment.start_sec, 0.0);
    assert_eq!(segment.end_sec, 10.5);
    assert_eq!(segment.action, SegmentAction::Edit);
    assert_eq!(segment.effect(), Some("zoom_in"));
}

#[test]
fn test_missing_or_unknown_action_means_keep() {
    let missing: Segment = serde_json::from_str(r#"{"start_sec": 1, "end_sec": 2}"#).unwrap();
    assert_eq!(missing.action, SegmentAction::Keep);

    let null: Segment =
        serde_json::from_str(r#"{"start_sec": 1, "end_sec": 2, "action": null}"#).unwrap();
    assert_eq!(null.action, SegmentAction::Keep);

    let odd: Segment =
        serde_json::from_str(r#"{"start_sec": 1, "end_sec": 2, "action": "remix"}"#).unwrap();
    assert_eq!(odd.action, SegmentAction::Keep);
}

#[test]
fn test_invalid_time_string_is_rejected() {
    let result: Result<Segment, _> =
        serde_json::from_str(r#"{"start_sec": "later", "end_sec": 2}"#);
    assert!(result.is_err());
}

#[test]
fn test_effect_only_for_edit_segments() {
    let mut keep = Segment::keep(0.0, 5.0);
    keep.effect_name = Some("blur".to_string());
    assert_eq!(keep.effect(), None);

    let blank = Segment::edit(0.0, 5.0, "   ");
    assert_eq!(blank.effect(), None);

    assert_eq!(Segment::edit(0.0, 5.0, " blur ").effect(), Some("blur"));
}

#[test]
fn test_plan_accepts_segments_alias() {
    let plan: EditPlan =
        serde_json::from_str(r#"{"segments": [{"start_sec": 0, "end_sec": 3}]}"#).unwrap();
    assert_eq!(plan.len(), 1);
}

#[test]
fn test_segment_display() {
    let segment = Segment::edit(10.0, 20.0, "sepia");
    assert_eq!(segment.to_string(), "[00:10.000 - 00:20.000] edit (sepia)");
}

#[test]
fn test_covers_duration() {
    let tiled = NormalizedPlan::probed(
        vec![Segment::keep(0.0, 10.0), Segment::keep(10.0, 30.0)],
        30.0,
    );
    assert!(tiled.covers_duration(1e-9));

    let gap = NormalizedPlan::probed(
        vec![Segment::keep(0.0, 10.0), Segment::keep(12.0, 30.0)],
        30.0,
    );
    assert!(!gap.covers_duration(1e-9));

    let unprobed = NormalizedPlan::unprobed(EditPlan::new(vec![Segment::keep(0.0, 1.0)]));
    assert!(!unprobed.covers_duration(1e-9));
}

#[test]
fn test_state_transitions() {
    use PipelineState::*;
    assert!(Extracting.can_transition_to(Normalizing));
    assert!(Cutting.can_transition_to(Failed));
    assert!(Cleanup.can_transition_to(Done));
    assert!(!Cutting.can_transition_to(Merging));
    assert!(!Done.can_transition_to(Failed));
    assert!(!Failed.can_transition_to(Cleanup));
    assert!(Done.is_terminal());
}

#[test]
fn test_failure_messages_never_empty() {
    let failure = PipelineFailure {
        state: PipelineState::Merging,
        errors: vec![],
    };
    assert_eq!(failure.messages(), vec!["Pipeline failed while merging".to_string()]);

    let failure = PipelineFailure::new(PipelineState::Extracting, DomainError::EmptyPlan);
    assert_eq!(failure.messages(), vec!["Empty plan: no parts to process".to_string()]);
    assert!(!failure.is_cancelled());
}

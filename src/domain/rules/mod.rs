// Domain rules - Plan repair policy

use tracing::{debug, warn};

use crate::domain::model::*;

/// Business rules that turn a raw plan into a gapless tiling of the media
pub struct PlanRules;

impl PlanRules {
    /// Normalize a plan against a known media duration
    ///
    /// Applied in order: sort by start, clamp into `[0, duration]`, repair
    /// degenerate ranges with a 1-second window, then make the segments
    /// contiguous from 0 and close the last one at `duration`. Keep
    /// segments lose any effect name.
    pub fn normalize(plan: EditPlan, duration: f64) -> NormalizedPlan {
        let mut segments: Vec<Segment> = plan
            .parts
            .into_iter()
            .map(|mut segment| {
                segment.start_sec = finite_or_zero(segment.start_sec);
                segment.end_sec = finite_or_zero(segment.end_sec);
                segment
            })
            .collect();
        segments.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

        for segment in &mut segments {
            Self::clamp(segment, duration);
            if segment.action == SegmentAction::Keep {
                segment.effect_name = None;
            }
        }
        // Repairs can move a start backwards.
        segments.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

        NormalizedPlan::probed(Self::stitch(segments, duration), duration)
    }

    /// Clamp a segment into `[0, duration]`, repairing empty ranges
    pub fn clamp(segment: &mut Segment, duration: f64) {
        segment.start_sec = segment.start_sec.clamp(0.0, duration);
        segment.end_sec = segment.end_sec.clamp(0.0, duration);

        if segment.start_sec >= segment.end_sec {
            if segment.start_sec >= duration {
                segment.start_sec = (duration - 1.0).max(0.0);
            }
            segment.end_sec = (segment.start_sec + 1.0).min(duration);
            debug!("Repaired degenerate segment to {}", segment);
        }
    }

    /// Make sorted segments contiguous from 0 and close the range at `duration`
    ///
    /// A segment swallowed entirely by its predecessor is dropped; the
    /// result always holds at least one segment when `duration > 0`.
    pub fn stitch(segments: Vec<Segment>, duration: f64) -> Vec<Segment> {
        let total = segments.len();
        let mut stitched: Vec<Segment> = Vec::with_capacity(total);
        let mut cursor = 0.0;

        for (i, mut segment) in segments.into_iter().enumerate() {
            segment.start_sec = cursor;
            if i + 1 == total {
                segment.end_sec = duration;
            }
            if segment.end_sec <= segment.start_sec {
                debug!("Dropping segment swallowed by its predecessor: {}", segment);
                continue;
            }
            cursor = segment.end_sec;
            stitched.push(segment);
        }

        if let Some(last) = stitched.last_mut() {
            last.end_sec = duration;
        } else if duration > 0.0 {
            stitched.push(Segment::keep(0.0, duration));
        }

        if stitched.len() < total {
            warn!(
                "Normalization merged {} overlapping segment(s)",
                total - stitched.len()
            );
        }
        stitched
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests;

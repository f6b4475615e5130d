//! Plan normalization against the probed media duration
//!
//! Repair, never rejection: any plan that reached this point comes out as a
//! sorted, gapless tiling of `[0, duration]`.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{EditPlan, NormalizedPlan};
use crate::domain::rules::PlanRules;
use crate::ports::DurationProbePort;

/// Result of normalizing a plan
#[derive(Debug, Clone)]
pub struct Normalization {
    pub plan: NormalizedPlan,
    /// Set when the probe failed and the raw plan was kept
    pub warning: Option<DomainError>,
}

/// Normalizes plans with an injected duration probe
pub struct PlanNormalizer {
    probe: Arc<dyn DurationProbePort>,
}

impl PlanNormalizer {
    pub fn new(probe: Arc<dyn DurationProbePort>) -> Self {
        Self { probe }
    }

    /// Probe `source` and normalize `plan` against its duration
    ///
    /// A probe failure is not fatal: the raw plan is returned untouched
    /// together with a `ProbeUnavailable` warning.
    pub async fn normalize(&self, source: &Path, plan: EditPlan) -> Normalization {
        match self.probe.probe_duration(source).await {
            Ok(duration) if duration.is_finite() && duration > 0.0 => {
                info!("Source duration: {:.3}s", duration);
                Normalization {
                    plan: Self::normalize_with_duration(plan, duration),
                    warning: None,
                }
            }
            Ok(duration) => Self::unprobed(
                plan,
                DomainError::ProbeUnavailable(format!("unusable duration {}", duration)),
            ),
            Err(DomainError::ProbeUnavailable(reason)) => {
                Self::unprobed(plan, DomainError::ProbeUnavailable(reason))
            }
            Err(other) => Self::unprobed(plan, DomainError::ProbeUnavailable(other.to_string())),
        }
    }

    fn unprobed(plan: EditPlan, warning: DomainError) -> Normalization {
        warn!("Skipping normalization: {}", warning);
        Normalization {
            plan: NormalizedPlan::unprobed(plan),
            warning: Some(warning),
        }
    }

    /// Normalize against a known duration
    pub fn normalize_with_duration(plan: EditPlan, duration: f64) -> NormalizedPlan {
        let normalized = PlanRules::normalize(plan, duration);
        debug!("Normalized plan: {} segment(s)", normalized.len());
        normalized
    }
}

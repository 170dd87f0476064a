//! Objective performance measures from trial logs
//!
//! Per participant × condition:
//! - collision rate: share of trials flagged as failures
//! - success rate: 1 − collision rate, cellwise
//! - median safe distance: median gap to the wall over successful trials
//! - precision@δ: share of all trials that succeeded with a gap ≤ δ
//!
//! Trials with an unknown outcome count in every denominator. They are not
//! collisions, so the success rate counts them. Safe distance and
//! precision@δ only credit trials explicitly marked as successful.

use crate::aggregate::{group_aggregate, Aggregation};
use crate::condition::{Condition, ConditionLabel, LabelNormalizer};
use crate::ingest::TrialRecord;
use crate::wide::{ReshapeError, WideMatrix};

/// Precision@δ matrix for one threshold
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionAt {
    /// Threshold in meters
    pub delta: f64,
    pub wide: WideMatrix,
}

impl PrecisionAt {
    /// Measure name, e.g. `precision_at_0.030m`
    pub fn name(&self) -> String {
        format!("precision_at_{:.3}m", self.delta)
    }

    /// Threshold rounded to whole centimeters
    pub fn centimeters(&self) -> i64 {
        (self.delta * 100.0).round() as i64
    }
}

/// All objective wide matrices for one trial log
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveMeasures {
    pub collision: WideMatrix,
    pub success: WideMatrix,
    pub safe_distance: WideMatrix,
    pub precision_at: Vec<PrecisionAt>,
    /// Cleaned mode labels that matched no condition
    pub unrecognized: Vec<String>,
}

fn indicator(flag: bool) -> Option<f64> {
    Some(if flag { 1.0 } else { 0.0 })
}

/// Compute every objective measure
///
/// # Example
/// ```
/// use feedback_stats::condition::Condition;
/// use feedback_stats::ingest::{parse_trials, TrialColumns};
/// use feedback_stats::objective::compute_measures;
///
/// let csv = "participant,mode,failure,gap_to_wall\n\
///            P1,No Feedback,yes,\n\
///            P1,No Feedback,no,0.05\n\
///            P1,vibration,no,0.02\n";
/// let trials = parse_trials(csv.as_bytes(), &TrialColumns::default()).unwrap();
/// let m = compute_measures(&trials, &Condition::ALL, &[0.03]).unwrap();
/// assert_eq!(m.collision.value("P1", &Condition::None.into()), Some(0.5));
/// assert_eq!(m.precision_at[0].wide.value("P1", &Condition::Gamepad.into()), Some(1.0));
/// ```
pub fn compute_measures(
    trials: &[TrialRecord],
    order: &[Condition],
    deltas: &[f64],
) -> Result<ObjectiveMeasures, ReshapeError> {
    let mut normalizer = LabelNormalizer::new();
    let labels: Vec<ConditionLabel> = trials.iter().map(|t| normalizer.normalize(&t.mode)).collect();
    let keyed = || trials.iter().zip(labels.iter());

    let collision_obs = group_aggregate(
        keyed().map(|(t, l)| (t.participant.as_str(), l, indicator(t.is_failure()))),
        Aggregation::Mean,
    );
    let collision = WideMatrix::from_observations(&collision_obs, order)?;
    let success = collision.map_values(|rate| 1.0 - rate);

    let safe_obs = group_aggregate(
        keyed()
            .filter(|(t, _)| t.is_success())
            .map(|(t, l)| (t.participant.as_str(), l, t.gap_to_wall)),
        Aggregation::Median,
    );
    let safe_distance = WideMatrix::from_observations(&safe_obs, order)?;

    let mut precision_at = Vec::with_capacity(deltas.len());
    for &delta in deltas {
        let obs = group_aggregate(
            keyed().map(|(t, l)| {
                let hit = t.is_success() && t.gap_to_wall.is_some_and(|g| g <= delta);
                (t.participant.as_str(), l, indicator(hit))
            }),
            Aggregation::Mean,
        );
        precision_at.push(PrecisionAt {
            delta,
            wide: WideMatrix::from_observations(&obs, order)?,
        });
    }

    tracing::info!(
        trials = trials.len(),
        participants = collision.n_rows(),
        conditions = collision.n_cols(),
        "computed objective measures"
    );

    Ok(ObjectiveMeasures {
        collision,
        success,
        safe_distance,
        precision_at,
        unrecognized: normalizer.unrecognized(),
    })
}

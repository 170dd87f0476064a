//! Grouped aggregation of long-format records
//!
//! Groups (participant, condition) keys in first-encounter order and reduces
//! each group's present values. A group whose values are all missing still
//! yields an observation, with a `None` value.

use crate::condition::ConditionLabel;
use crate::descriptive::{mean, median};
use crate::wide::Observation;
use std::collections::HashMap;

/// Reduction applied to each group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Median,
}

impl Aggregation {
    fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Mean => mean(values),
            Aggregation::Median => median(values),
        }
    }
}

/// Reduce long records to one observation per (participant, condition)
pub fn group_aggregate<'a, I>(records: I, how: Aggregation) -> Vec<Observation>
where
    I: IntoIterator<Item = (&'a str, &'a ConditionLabel, Option<f64>)>,
{
    let mut keys: Vec<(&'a str, &'a ConditionLabel)> = Vec::new();
    let mut groups: HashMap<(&'a str, &'a ConditionLabel), Vec<f64>> = HashMap::new();

    for (participant, condition, value) in records {
        let key = (participant, condition);
        let group = groups.entry(key).or_insert_with(|| {
            keys.push(key);
            Vec::new()
        });
        if let Some(v) = value.filter(|v| v.is_finite()) {
            group.push(v);
        }
    }

    keys.into_iter()
        .map(|key| {
            let value = groups.get(&key).and_then(|values| how.apply(values));
            Observation::new(key.0, key.1.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;

    #[test]
    fn test_mean_per_group() {
        let none: ConditionLabel = Condition::None.into();
        let color: ConditionLabel = Condition::Color.into();
        let records = vec![
            ("P1", &none, Some(1.0)),
            ("P1", &none, Some(0.0)),
            ("P1", &color, Some(0.0)),
            ("P2", &none, Some(0.0)),
        ];
        let out = group_aggregate(records, Aggregation::Mean);
        assert_eq!(
            out,
            vec![
                Observation::new("P1", Condition::None, Some(0.5)),
                Observation::new("P1", Condition::Color, Some(0.0)),
                Observation::new("P2", Condition::None, Some(0.0)),
            ]
        );
    }

    #[test]
    fn test_median_skips_missing() {
        let audio: ConditionLabel = Condition::Audio.into();
        let records = vec![
            ("P1", &audio, Some(0.05)),
            ("P1", &audio, None),
            ("P1", &audio, Some(0.01)),
            ("P1", &audio, Some(0.02)),
        ];
        let out = group_aggregate(records, Aggregation::Median);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, Some(0.02));
    }

    #[test]
    fn test_all_missing_group_kept_as_none() {
        let gamepad: ConditionLabel = Condition::Gamepad.into();
        let records = vec![("P3", &gamepad, None), ("P3", &gamepad, Some(f64::NAN))];
        let out = group_aggregate(records, Aggregation::Median);
        assert_eq!(out, vec![Observation::new("P3", Condition::Gamepad, None)]);
    }
}

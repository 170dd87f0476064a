//! Subjective questionnaire scores: NASA-TLX, SSQ and helpfulness ratings
//!
//! The questionnaire is a wide sheet with one row per participant. TLX and
//! SSQ questions repeat once per condition, distinguished by a header
//! suffix; helpfulness questions exist only for the three feedback modes.
//!
//! Aggregates skip missing items. A score whose items are all missing is
//! missing, never 0.

use crate::condition::Condition;
use crate::csv_output::{Cell, CsvTable};
use crate::descriptive::{mean, NamedMeasure};
use crate::ingest::{QuestionnaireSheet, DEFAULT_ID_COLUMNS};
use crate::wide::Observation;
use serde::{Deserialize, Serialize};

/// NASA-TLX dimensions, literal question texts
pub const TLX_ITEMS: [&str; 6] = [
    "Mental Demand: How mentally demanding was the task?",
    "Physical Demand: How physically demanding was the task?",
    "Temporal Demand: How hurried or rushed was the pace of the task?",
    "Performance: How successful were you in accomplishing what you were asked to do?",
    "Effort: How hard did you have to work to accomplish your level of performance?",
    "Frustration: How insecure, discouraged, irritated, stressed, and annoyed were you?",
];

/// Simulator sickness items
pub const SSQ_ITEMS: [&str; 7] = [
    "Nausea",
    "Eye strain",
    "Headache",
    "Dizziness (eyes open)",
    "Dizziness (eyes closed)",
    "Blurred vision",
    "Sweating",
];

/// Helpfulness questions for one feedback mode
#[derive(Debug, Clone, Copy)]
pub struct HelpItems {
    pub condition: Condition,
    pub distance: &'static str,
    pub collision: &'static str,
}

/// Helpfulness questions; the collision variants carry a non-breaking space
pub const HELP_ITEMS: [HelpItems; 3] = [
    HelpItems {
        condition: Condition::Color,
        distance: "COLOR FEEDBACK: How helpful was this feedback mode in perceiving the distance to the wall? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
        collision: "COLOR FEEDBACK:\u{a0}How helpful was this feedback mode in avoiding failure (collision)? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
    },
    HelpItems {
        condition: Condition::Audio,
        distance: "AUDITORY FEEDBACK: How helpful was this feedback mode in perceiving the distance to the wall? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
        collision: "AUDITORY FEEDBACK:\u{a0}How helpful was this feedback mode in avoiding failure (collision)? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
    },
    HelpItems {
        condition: Condition::Gamepad,
        distance: "HAPTIC FEEDBACK: How helpful was this feedback mode in perceiving the distance to the wall? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
        collision: "HAPTIC FEEDBACK:\u{a0}How helpful was this feedback mode in avoiding failure (collision)? (-7=Extremely worse, 1=Not helpful at all, 7=Extremely helpful)",
    },
];

/// Conditions that have helpfulness ratings
pub const HELP_CONDITIONS: [Condition; 3] = [Condition::Color, Condition::Audio, Condition::Gamepad];

/// Header suffix identifying one condition's copy of the TLX/SSQ block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixMapping {
    pub suffix: String,
    pub condition: Condition,
}

/// Unweighted SSQ subscale: sum of the listed items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsqSubscale {
    pub name: String,
    pub items: Vec<String>,
}

/// Where things live in the questionnaire sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireLayout {
    pub id_columns: Vec<String>,
    pub suffixes: Vec<SuffixMapping>,
    pub ssq_subscales: Vec<SsqSubscale>,
}

impl Default for QuestionnaireLayout {
    fn default() -> Self {
        let suffix = |s: &str, condition| SuffixMapping {
            suffix: s.to_string(),
            condition,
        };
        let subscale = |name: &str, items: &[&str]| SsqSubscale {
            name: name.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            id_columns: DEFAULT_ID_COLUMNS.iter().map(|s| s.to_string()).collect(),
            suffixes: vec![
                suffix("", Condition::None),
                suffix("2", Condition::Color),
                suffix("3", Condition::Audio),
                suffix("4", Condition::Gamepad),
            ],
            ssq_subscales: vec![
                subscale("Nausea_sub", &["Nausea", "Sweating"]),
                subscale("Oculomotor_sub", &["Eye strain", "Headache", "Blurred vision"]),
                subscale(
                    "Disorientation_sub",
                    &["Dizziness (eyes open)", "Dizziness (eyes closed)"],
                ),
            ],
        }
    }
}

impl QuestionnaireLayout {
    pub fn validate(&self) -> Result<(), String> {
        if self.suffixes.is_empty() {
            return Err("questionnaire.suffixes must not be empty".to_string());
        }
        for (i, a) in self.suffixes.iter().enumerate() {
            if self.suffixes[i + 1..].iter().any(|b| b.suffix == a.suffix) {
                return Err(format!("duplicate questionnaire suffix {:?}", a.suffix));
            }
            if self.suffixes[i + 1..].iter().any(|b| b.condition == a.condition) {
                return Err(format!("condition {} mapped to more than one suffix", a.condition));
            }
        }
        for subscale in &self.ssq_subscales {
            if subscale.items.is_empty() {
                return Err(format!("SSQ subscale {} has no items", subscale.name));
            }
            if let Some(item) = subscale.items.iter().find(|i| !SSQ_ITEMS.contains(&i.as_str())) {
                return Err(format!(
                    "SSQ subscale {} references unknown item {:?}",
                    subscale.name, item
                ));
            }
        }
        Ok(())
    }
}

/// Column name for a TLX dimension: `TLX_<text before ':'>`
pub fn tlx_column_name(item: &str) -> String {
    let prefix = item.split(':').next().unwrap_or(item);
    format!("TLX_{}", prefix)
}

/// Column name for an SSQ item or subscale
pub fn ssq_column_name(item: &str) -> String {
    format!("SSQ_{}", item)
}

/// Sum of the present values; `None` when all are missing
fn sum_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// TLX and SSQ scores for one participant under one condition
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectiveRow {
    pub participant: String,
    pub condition: Condition,
    /// One entry per [`TLX_ITEMS`] dimension
    pub tlx: Vec<Option<f64>>,
    pub tlx_overall: Option<f64>,
    /// One entry per [`SSQ_ITEMS`] item
    pub ssq: Vec<Option<f64>>,
    /// One entry per configured subscale
    pub ssq_subscales: Vec<Option<f64>>,
    pub ssq_total: Option<f64>,
}

/// Helpfulness ratings for one participant under one feedback mode
#[derive(Debug, Clone, PartialEq)]
pub struct HelpfulnessRow {
    pub participant: String,
    pub condition: Condition,
    pub help_distance: Option<f64>,
    pub help_collision: Option<f64>,
}

/// Long-format subjective scores
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectiveData {
    pub rows: Vec<SubjectiveRow>,
    pub helpfulness: Vec<HelpfulnessRow>,
    pub subscale_names: Vec<String>,
}

fn item_value(sheet: &QuestionnaireSheet, row: usize, item: &str, suffix: &str) -> Option<f64> {
    sheet.numeric(row, &format!("{}{}", item, suffix))
}

/// Extract long-format TLX/SSQ and helpfulness rows from a sheet
///
/// TLX/SSQ rows are grouped by condition (suffix order), participants in
/// sheet order within each group.
pub fn extract(sheet: &QuestionnaireSheet, layout: &QuestionnaireLayout) -> SubjectiveData {
    let participants = sheet.participant_ids(&layout.id_columns);

    for mapping in &layout.suffixes {
        let missing: Vec<&str> = TLX_ITEMS
            .iter()
            .chain(SSQ_ITEMS.iter())
            .copied()
            .filter(|item| sheet.find_column(&format!("{}{}", item, mapping.suffix)).is_none())
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                condition = %mapping.condition,
                missing = missing.len(),
                "questionnaire columns not found; treated as missing"
            );
        }
    }

    let mut rows = Vec::with_capacity(layout.suffixes.len() * participants.len());
    for mapping in &layout.suffixes {
        for (r, participant) in participants.iter().enumerate() {
            let tlx: Vec<Option<f64>> = TLX_ITEMS
                .iter()
                .map(|item| item_value(sheet, r, item, &mapping.suffix))
                .collect();
            let present: Vec<f64> = tlx.iter().flatten().copied().collect();
            let tlx_overall = mean(&present);

            let ssq: Vec<Option<f64>> = SSQ_ITEMS
                .iter()
                .map(|item| item_value(sheet, r, item, &mapping.suffix))
                .collect();
            let ssq_of = |name: &str| {
                SSQ_ITEMS
                    .iter()
                    .position(|item| *item == name)
                    .and_then(|i| ssq[i])
            };
            let ssq_subscales = layout
                .ssq_subscales
                .iter()
                .map(|s| sum_present(s.items.iter().map(|item| ssq_of(item.as_str()))))
                .collect();
            let ssq_total = sum_present(ssq.iter().copied());

            rows.push(SubjectiveRow {
                participant: participant.clone(),
                condition: mapping.condition,
                tlx,
                tlx_overall,
                ssq,
                ssq_subscales,
                ssq_total,
            });
        }
    }

    let mut helpfulness = Vec::with_capacity(participants.len() * HELP_ITEMS.len());
    for (r, participant) in participants.iter().enumerate() {
        for items in &HELP_ITEMS {
            helpfulness.push(HelpfulnessRow {
                participant: participant.clone(),
                condition: items.condition,
                help_distance: sheet.numeric(r, items.distance),
                help_collision: sheet.numeric(r, items.collision),
            });
        }
    }

    tracing::info!(
        participants = participants.len(),
        rows = rows.len(),
        helpfulness_rows = helpfulness.len(),
        "extracted subjective scores"
    );

    SubjectiveData {
        rows,
        helpfulness,
        subscale_names: layout.ssq_subscales.iter().map(|s| s.name.clone()).collect(),
    }
}

impl SubjectiveData {
    fn measure(&self, name: String, value: impl Fn(&SubjectiveRow) -> Option<f64>) -> NamedMeasure {
        let observations = self
            .rows
            .iter()
            .map(|row| Observation::new(row.participant.clone(), row.condition, value(row)))
            .collect();
        NamedMeasure::new(name, observations)
    }

    /// TLX_overall followed by the six dimensions
    pub fn tlx_measures(&self) -> Vec<NamedMeasure> {
        let mut measures = vec![self.measure("TLX_overall".to_string(), |r| r.tlx_overall)];
        for (i, item) in TLX_ITEMS.iter().enumerate() {
            measures.push(self.measure(tlx_column_name(item), move |r| r.tlx[i]));
        }
        measures
    }

    /// SSQ items, subscales, then total
    pub fn ssq_measures(&self) -> Vec<NamedMeasure> {
        let mut measures = Vec::new();
        for (i, item) in SSQ_ITEMS.iter().enumerate() {
            measures.push(self.measure(ssq_column_name(item), move |r| r.ssq[i]));
        }
        measures.extend(self.ssq_score_measures());
        measures
    }

    /// Subscales and total only
    pub fn ssq_score_measures(&self) -> Vec<NamedMeasure> {
        let mut measures = Vec::new();
        for (i, name) in self.subscale_names.iter().enumerate() {
            measures.push(self.measure(ssq_column_name(name), move |r| r.ssq_subscales[i]));
        }
        measures.push(self.measure("SSQ_total".to_string(), |r| r.ssq_total));
        measures
    }

    /// help_distance and help_collision
    pub fn help_measures(&self) -> Vec<NamedMeasure> {
        let build = |name: &str, value: fn(&HelpfulnessRow) -> Option<f64>| {
            let observations = self
                .helpfulness
                .iter()
                .map(|row| Observation::new(row.participant.clone(), row.condition, value(row)))
                .collect();
            NamedMeasure::new(name, observations)
        };
        vec![
            build("help_distance", |r: &HelpfulnessRow| r.help_distance),
            build("help_collision", |r: &HelpfulnessRow| r.help_collision),
        ]
    }

    /// Long TLX/SSQ table, one row per participant × condition
    pub fn long_table(&self) -> CsvTable {
        let mut header = vec!["participant".to_string(), "condition".to_string()];
        header.extend(TLX_ITEMS.iter().map(|item| tlx_column_name(item)));
        header.push("TLX_overall".to_string());
        header.extend(SSQ_ITEMS.iter().map(|item| ssq_column_name(item)));
        header.extend(self.subscale_names.iter().map(|name| ssq_column_name(name)));
        header.push("SSQ_total".to_string());

        let mut table = CsvTable::new(header);
        for row in &self.rows {
            let mut cells = vec![
                Cell::Text(row.participant.clone()),
                Cell::Text(row.condition.to_string()),
            ];
            cells.extend(row.tlx.iter().map(|v| Cell::Number(*v)));
            cells.push(Cell::Number(row.tlx_overall));
            cells.extend(row.ssq.iter().map(|v| Cell::Number(*v)));
            cells.extend(row.ssq_subscales.iter().map(|v| Cell::Number(*v)));
            cells.push(Cell::Number(row.ssq_total));
            table.add_row(cells);
        }
        table
    }

    /// Long helpfulness table
    pub fn helpfulness_table(&self) -> CsvTable {
        let header = ["participant", "condition", "help_distance", "help_collision"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut table = CsvTable::new(header);
        for row in &self.helpfulness {
            table.add_row(vec![
                Cell::Text(row.participant.clone()),
                Cell::Text(row.condition.to_string()),
                Cell::Number(row.help_distance),
                Cell::Number(row.help_collision),
            ]);
        }
        table
    }
}

// Exported matrices read back through the ingest layer
//
// Missing cells must come back as missing whatever the configured marker,
// and report-precision exports stay within half a unit of the last decimal.

use feedback_stats::condition::{Condition, ConditionLabel};
use feedback_stats::csv_output::{wide_matrix_table, CsvFormat, MissingStyle};
use feedback_stats::ingest::{parse_wide_matrix, read_wide_matrix};
use feedback_stats::wide::{Observation, WideMatrix};
use tempfile::TempDir;

fn safe_distance_matrix() -> WideMatrix {
    let obs = vec![
        Observation::new("P1", Condition::None, Some(0.0412)),
        Observation::new("P1", Condition::Color, Some(0.0)),
        Observation::new("P1", Condition::Audio, Some(0.02875)),
        Observation::new("P1", Condition::Gamepad, Some(0.0315)),
        // No successful trial without feedback
        Observation::new("P2", Condition::None, None),
        Observation::new("P2", Condition::Color, Some(0.0203)),
        Observation::new("P2", Condition::Audio, Some(0.0377)),
        Observation::new("P2", Condition::Gamepad, Some(0.0)),
        Observation::new("P3", Condition::None, Some(0.05)),
        Observation::new("P3", Condition::Color, Some(0.0251)),
        Observation::new("P3", Condition::Audio, None),
        Observation::new("P3", Condition::Gamepad, Some(0.0188)),
    ];
    WideMatrix::from_observations(&obs, &Condition::ALL).unwrap()
}

#[test]
fn test_raw_export_reads_back_identical() {
    let wide = safe_distance_matrix();
    let csv = wide_matrix_table(&wide).to_csv(&CsvFormat::raw());
    let back = parse_wide_matrix(csv.as_bytes()).unwrap();
    assert_eq!(back, wide);
}

#[test]
fn test_blank_missing_is_not_zero() {
    let wide = safe_distance_matrix();
    let csv = wide_matrix_table(&wide).to_csv(&CsvFormat::default());
    assert!(csv.contains("P2,,0.020,0.038,0.000\n"));

    let back = parse_wide_matrix(csv.as_bytes()).unwrap();
    assert_eq!(back.value("P2", &Condition::None.into()), None);
    assert_eq!(back.value("P2", &Condition::Gamepad.into()), Some(0.0));
    assert_eq!(back.value("P1", &Condition::Color.into()), Some(0.0));
}

#[test]
fn test_literal_missing_reads_back_missing() {
    let wide = safe_distance_matrix();
    let format = CsvFormat::report(4, MissingStyle::Literal, "N/A");
    let csv = wide_matrix_table(&wide).to_csv(&format);
    assert!(csv.contains("P3,0.0500,0.0251,N/A,0.0188\n"));

    let back = parse_wide_matrix(csv.as_bytes()).unwrap();
    assert_eq!(back.non_missing_counts(), wide.non_missing_counts());
    assert_eq!(back.complete_rows().participants(), &["P1".to_string()]);
}

#[test]
fn test_report_precision_within_half_unit() {
    let wide = safe_distance_matrix();
    let format = CsvFormat::report(3, MissingStyle::Blank, "N/A");
    let back = parse_wide_matrix(wide_matrix_table(&wide).to_csv(&format).as_bytes()).unwrap();

    for r in 0..wide.n_rows() {
        for c in 0..wide.n_cols() {
            match (wide.get(r, c), back.get(r, c)) {
                (Some(a), Some(b)) => assert!((a - b).abs() <= 0.0005 + 1e-12, "{} vs {}", a, b),
                (None, None) => {}
                other => panic!("presence changed at ({}, {}): {:?}", r, c, other),
            }
        }
    }
}

#[test]
fn test_unrecognized_column_survives_file_roundtrip() {
    let obs = vec![
        Observation::new("P1", Condition::None, Some(0.5)),
        Observation::new("P1", ConditionLabel::Unrecognized("thermal".to_string()), Some(0.25)),
        Observation::new("P2", Condition::None, Some(0.0)),
    ];
    let wide = WideMatrix::from_observations(&obs, &Condition::ALL).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("collision_rate_per_participant.csv");
    wide_matrix_table(&wide).write_to(&path, &CsvFormat::raw()).unwrap();

    let back = read_wide_matrix(&path).unwrap();
    assert_eq!(
        back.columns(),
        &[
            ConditionLabel::Canonical(Condition::None),
            ConditionLabel::Unrecognized("thermal".to_string()),
        ]
    );
    assert_eq!(back.value("P2", &ConditionLabel::Unrecognized("thermal".to_string())), None);
}

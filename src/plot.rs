//! SVG figures for the per-condition measures
//!
//! Every renderer only borrows its inputs and writes one file. Renderers
//! return an error instead of aborting; callers log it and move on.

use crate::bootstrap::BootstrapEstimate;
use crate::descriptive::{mean, quantile_sorted};
use crate::wide::WideMatrix;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::path::Path;

pub type PlotResult = Result<(), Box<dyn Error>>;

/// Horizontal spread of the individual points
pub const JITTER_WIDTH: f64 = 0.18;

const SIZE: (u32, u32) = (900, 560);
const POINT_GREY: RGBColor = RGBColor(128, 128, 128);
const MISSING_GREY: RGBColor = RGBColor(220, 220, 220);

/// Uniform offsets in [-width/2, width/2)
pub fn jitter_offsets(n: usize, width: f64, rng: &mut StdRng) -> Vec<f64> {
    (0..n).map(|_| (rng.gen::<f64>() - 0.5) * width).collect()
}

/// Five-number summary plus mean, whiskers at 1.5 IQR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub mean: f64,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mean = mean(&sorted)?;

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        // Whiskers reach the most extreme data inside the fences
        let whisker_low = sorted.iter().copied().find(|&v| v >= lo_fence).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|&v| v <= hi_fence).unwrap_or(q3);

        Some(Self {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
            mean,
        })
    }
}

/// Padded axis range covering `values`; 0..1 when empty
pub fn axis_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.08 } else { lo.abs().max(1.0) * 0.1 };
    (lo - pad, hi + pad)
}

/// Linear blend from dark purple (0) to pale yellow (1)
pub fn heat_color(value: f64) -> RGBColor {
    let t = value.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(20, 252), lerp(11, 253), lerp(52, 191))
}

fn label_at(labels: &[String], x: f64) -> String {
    if (x - x.round()).abs() > 0.25 || x < -0.5 {
        return String::new();
    }
    labels.get(x.round() as usize).cloned().unwrap_or_default()
}

/// Mean ± CI per condition over a jittered swarm of individual values
///
/// `estimates` is indexed like the matrix columns.
pub fn dot_ci_swarm(
    out_path: &Path,
    wide: &WideMatrix,
    estimates: &[BootstrapEstimate],
    caption: &str,
    y_desc: &str,
    seed: u64,
) -> PlotResult {
    let k = wide.n_cols();
    let labels: Vec<String> = wide.columns().iter().map(|c| c.to_string()).collect();
    let present: Vec<Vec<f64>> = (0..k).map(|c| wide.column_present(c)).collect();

    let bounds = present.iter().flatten().copied().chain(
        estimates
            .iter()
            .filter_map(BootstrapEstimate::interval)
            .flat_map(|(lo, hi)| [lo, hi]),
    );
    let (y_min, y_max) = axis_range(bounds);

    let root = SVGBackend::new(out_path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            -0.5f64..(k.max(1) as f64 - 0.5),
            y_min..y_max,
        )?;

    let x_fmt = |x: &f64| label_at(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k.max(1))
        .x_label_formatter(&x_fmt)
        .y_desc(y_desc)
        .draw()?;

    let mut rng = StdRng::seed_from_u64(seed);
    for (i, values) in present.iter().enumerate() {
        let offsets = jitter_offsets(values.len(), JITTER_WIDTH, &mut rng);
        chart.draw_series(
            values
                .iter()
                .zip(offsets)
                .map(|(&y, dx)| Circle::new((i as f64 + dx, y), 4, POINT_GREY.mix(0.45).filled())),
        )?;
    }

    for (i, estimate) in estimates.iter().enumerate().take(k) {
        if let BootstrapEstimate::Defined { mean, low, high } = *estimate {
            chart.draw_series(std::iter::once(ErrorBar::new_vertical(
                i as f64,
                low,
                mean,
                high,
                BLACK.stroke_width(2),
                14,
            )))?;
            chart.draw_series(std::iter::once(Circle::new((i as f64, mean), 6, BLACK.filled())))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Box plot with mean marker and jittered points; labels carry n
pub fn box_scatter(out_path: &Path, wide: &WideMatrix, caption: &str, y_desc: &str, seed: u64) -> PlotResult {
    let k = wide.n_cols();
    let present: Vec<Vec<f64>> = (0..k).map(|c| wide.column_present(c)).collect();
    let labels: Vec<String> = wide
        .columns()
        .iter()
        .zip(&present)
        .map(|(c, v)| format!("{} (n={})", c, v.len()))
        .collect();
    let (y_min, y_max) = axis_range(present.iter().flatten().copied());

    let root = SVGBackend::new(out_path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            -0.5f64..(k.max(1) as f64 - 0.5),
            y_min..y_max,
        )?;

    let x_fmt = |x: &f64| label_at(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k.max(1))
        .x_label_formatter(&x_fmt)
        .y_desc(y_desc)
        .draw()?;

    let half = 0.25;
    for (i, values) in present.iter().enumerate() {
        let Some(summary) = BoxSummary::from_values(values) else {
            continue;
        };
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, summary.q1), (x + half, summary.q3)],
            BLUE.mix(0.15).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, summary.q1), (x + half, summary.q3)],
            BLUE.stroke_width(1),
        )))?;
        let segments = [
            vec![(x - half, summary.median), (x + half, summary.median)],
            vec![(x, summary.q3), (x, summary.whisker_high)],
            vec![(x, summary.q1), (x, summary.whisker_low)],
            vec![(x - half / 2.0, summary.whisker_high), (x + half / 2.0, summary.whisker_high)],
            vec![(x - half / 2.0, summary.whisker_low), (x + half / 2.0, summary.whisker_low)],
        ];
        chart.draw_series(segments.into_iter().map(|s| PathElement::new(s, BLUE.stroke_width(2))))?;
        chart.draw_series(std::iter::once(TriangleMarker::new((x, summary.mean), 6, GREEN.filled())))?;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for (i, values) in present.iter().enumerate() {
        let offsets = jitter_offsets(values.len(), JITTER_WIDTH, &mut rng);
        chart.draw_series(
            values
                .iter()
                .zip(offsets)
                .map(|(&y, dx)| Circle::new((i as f64 + dx, y), 3, POINT_GREY.mix(0.55).filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Participant × condition heatmap of values in [0, 1]; missing cells grey
pub fn heatmap01(out_path: &Path, wide: &WideMatrix, caption: &str) -> PlotResult {
    let k = wide.n_cols();
    let n = wide.n_rows();
    let columns: Vec<String> = wide.columns().iter().map(|c| c.to_string()).collect();
    let participants = wide.participants().to_vec();

    let root = SVGBackend::new(out_path, (SIZE.0, SIZE.1.max(40 + 18 * n as u32))).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            -0.5f64..(k.max(1) as f64 - 0.5),
            -0.5f64..(n.max(1) as f64 - 0.5),
        )?;

    let x_fmt = |x: &f64| label_at(&columns, *x);
    let y_fmt = |y: &f64| label_at(&participants, *y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k.max(1))
        .y_labels(n.max(1))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    for r in 0..n {
        let y = r as f64;
        chart.draw_series(wide.row(r).iter().enumerate().map(|(c, value)| {
            let x = c as f64;
            let color = value.map(heat_color).unwrap_or(MISSING_GREY);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
        }))?;
    }

    root.present()?;
    Ok(())
}

/// Bars of the mean with ± SD error bars; missing means draw nothing
pub fn bar_mean_sd(
    out_path: &Path,
    labels: &[String],
    means: &[Option<f64>],
    sds: &[Option<f64>],
    caption: &str,
    y_desc: &str,
) -> PlotResult {
    let k = labels.len();
    let extents = means.iter().zip(sds).flat_map(|(m, s)| {
        let m = m.unwrap_or(0.0);
        let s = s.unwrap_or(0.0);
        [0.0, m - s, m + s]
    });
    let (y_min, y_max) = axis_range(extents);

    let root = SVGBackend::new(out_path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            -0.5f64..(k.max(1) as f64 - 0.5),
            y_min..y_max,
        )?;

    let x_fmt = |x: &f64| label_at(labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k.max(1))
        .x_label_formatter(&x_fmt)
        .y_desc(y_desc)
        .draw()?;

    for (i, m) in means.iter().enumerate().take(k) {
        let Some(m) = *m else { continue };
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.3, 0.0), (x + 0.3, m)],
            BLUE.mix(0.6).filled(),
        )))?;
        if let Some(s) = sds.get(i).copied().flatten() {
            chart.draw_series(std::iter::once(ErrorBar::new_vertical(
                x,
                m - s,
                m,
                m + s,
                BLACK.stroke_width(2),
                12,
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::wide::Observation;

    #[test]
    fn test_jitter_deterministic_and_bounded() {
        let a = jitter_offsets(50, JITTER_WIDTH, &mut StdRng::seed_from_u64(42));
        let b = jitter_offsets(50, JITTER_WIDTH, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.iter().all(|d| d.abs() <= JITTER_WIDTH / 2.0));
    }

    #[test]
    fn test_box_summary_with_outlier() {
        let s = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.whisker_low, 1.0);
        // 100 lies beyond q3 + 1.5 * IQR = 7
        assert_eq!(s.whisker_high, 4.0);
        assert_eq!(s.mean, 22.0);
        assert!(BoxSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range(Vec::new()), (0.0, 1.0));
        let (lo, hi) = axis_range(vec![0.0, 1.0]);
        assert!(lo < 0.0 && hi > 1.0);
        let (lo, hi) = axis_range(vec![0.5, 0.5]);
        assert!(lo < 0.5 && hi > 0.5);
    }

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(0.0), RGBColor(20, 11, 52));
        assert_eq!(heat_color(1.0), RGBColor(252, 253, 191));
        assert_eq!(heat_color(7.0), heat_color(1.0));
    }

    #[test]
    fn test_label_at_integer_positions_only() {
        let labels = vec!["None".to_string(), "Color".to_string()];
        assert_eq!(label_at(&labels, 1.0), "Color");
        assert_eq!(label_at(&labels, 1.0000001), "Color");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
    }

    #[test]
    fn test_render_figures_to_svg() {
        let obs = vec![
            Observation::new("P1", Condition::None, Some(0.5)),
            Observation::new("P1", Condition::Color, Some(0.0)),
            Observation::new("P2", Condition::None, Some(0.25)),
            Observation::new("P2", Condition::Color, None),
        ];
        let wide = WideMatrix::from_observations(&obs, &Condition::ALL).unwrap();
        let estimates = vec![
            BootstrapEstimate::Defined {
                mean: 0.375,
                low: 0.25,
                high: 0.5,
            },
            BootstrapEstimate::Defined {
                mean: 0.0,
                low: 0.0,
                high: 0.0,
            },
        ];
        let dir = tempfile::tempdir().unwrap();

        let swarm = dir.path().join("swarm.svg");
        dot_ci_swarm(&swarm, &wide, &estimates, "Collision rate", "rate", 42).unwrap();
        let boxes = dir.path().join("box.svg");
        box_scatter(&boxes, &wide, "Safe distance", "m", 42).unwrap();
        let heat = dir.path().join("heat.svg");
        heatmap01(&heat, &wide, "Collision rate").unwrap();
        let bars = dir.path().join("bars.svg");
        bar_mean_sd(
            &bars,
            &["Color".to_string(), "Audio".to_string()],
            &[Some(3.0), None],
            &[Some(1.0), None],
            "help_distance",
            "rating",
        )
        .unwrap();

        for path in [swarm, boxes, heat, bars] {
            let svg = std::fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"), "{} is not an SVG", path.display());
        }
    }

    #[test]
    fn test_category_axis_labels_drawn() {
        let obs = vec![
            Observation::new("P1", Condition::None, Some(1.0)),
            Observation::new("P1", Condition::Color, Some(2.0)),
            Observation::new("P1", Condition::Audio, Some(3.0)),
            Observation::new("P1", Condition::Gamepad, Some(4.0)),
            Observation::new("P2", Condition::None, Some(1.5)),
            Observation::new("P2", Condition::Color, Some(2.5)),
            Observation::new("P2", Condition::Audio, Some(3.5)),
            Observation::new("P2", Condition::Gamepad, Some(4.5)),
        ];
        let wide = WideMatrix::from_observations(&obs, &Condition::ALL).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let boxes = dir.path().join("box.svg");
        box_scatter(&boxes, &wide, "Safe distance", "m", 7).unwrap();
        let svg = std::fs::read_to_string(&boxes).unwrap();
        for label in ["None", "Color", "Audio", "Gamepad"] {
            assert!(svg.contains(label), "axis label {label} missing");
        }

        let heat = dir.path().join("heat.svg");
        heatmap01(&heat, &wide, "Rate").unwrap();
        let svg = std::fs::read_to_string(&heat).unwrap();
        assert!(svg.contains("P1") && svg.contains("P2"));
    }
}

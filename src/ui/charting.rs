use crate::record::SessionRecord;

/// (n-th intervention session at this level, accuracy) points, oldest first
pub fn accuracy_points(history: &[SessionRecord], level: u8) -> Vec<(f64, f64)> {
    history
        .iter()
        .filter(|s| s.level == level && s.is_intervention())
        .enumerate()
        .map(|(i, s)| ((i + 1) as f64, s.accuracy))
        .collect()
}

/// Compute X (sessions) and Y (accuracy) bounds for the progress chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let overall_sessions = points.last().map(|p| p.0).unwrap_or(1.0).max(2.0);
    let highest = points.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    // accuracy is a percentage
    let top = if highest > 0.0 { 100.0 } else { 1.0 };
    (overall_sessions, top)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Phase, SessionOutcome};

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_scales_to_percent() {
        let (x, y) = compute_chart_params(&[(1.0, 40.0), (2.0, 70.0), (3.0, 90.0)]);
        assert_eq!(x, 3.0);
        assert_eq!(y, 100.0);
    }

    #[test]
    fn test_accuracy_points_skip_other_levels_and_baseline() {
        let outcome = SessionOutcome {
            correct: 5,
            total: 10,
            ..Default::default()
        };
        let history = vec![
            SessionRecord::new(1, 1, Phase::Intervention, outcome.clone()),
            SessionRecord::new(1, 2, Phase::Intervention, outcome.clone()),
            SessionRecord::new(1, 1, Phase::Baseline, outcome.clone()),
            SessionRecord::new(2, 1, Phase::Intervention, outcome),
        ];
        assert_eq!(accuracy_points(&history, 1), vec![(1.0, 50.0), (2.0, 50.0)]);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}

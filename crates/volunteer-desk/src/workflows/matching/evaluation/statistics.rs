use super::super::domain::{AxisAverages, MatchResult, MatchStatistics};
use crate::workflows::volunteers::EvaluationAxis;

pub(crate) fn summarize(results: &[MatchResult]) -> MatchStatistics {
    let mut statistics = MatchStatistics {
        total: results.len(),
        ..MatchStatistics::default()
    };

    for result in results {
        match result.total_score {
            80..=100 => statistics.excellent += 1,
            60..=79 => statistics.good += 1,
            40..=59 => statistics.fair += 1,
            _ => {}
        }
    }

    statistics.average_score = average(results.iter().map(|result| result.total_score));

    let mut axis_averages = AxisAverages::default();
    for axis in EvaluationAxis::ordered() {
        let value = average(
            results
                .iter()
                .filter_map(|result| result.evaluations.get(axis)),
        );
        axis_averages.set(axis, value);
    }
    statistics.axis_averages = axis_averages;

    statistics
}

/// Mean rounded to one decimal; `None` for an empty input.
fn average(values: impl Iterator<Item = u8>) -> Option<f32> {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), value| {
        (sum + u64::from(value), count + 1)
    });
    if count == 0 {
        return None;
    }

    let mean = sum as f64 / count as f64;
    Some(((mean * 10.0).round() / 10.0) as f32)
}

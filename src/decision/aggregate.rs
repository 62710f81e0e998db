//! Combine several normalized analyzer results into one 0–100 score.

use crate::analysis::AnalysisResult;

/// Weight given to degraded results and the floor for explicit confidences.
///
/// Degraded results carry a neutral score of 0, so a small positive weight
/// lets them pull the aggregate toward neutral without dominating it.
pub const MIN_WEIGHT: f64 = 0.05;

/// Combined score for a set of results. Total: always yields a value.
///
/// - one result: its `risk_score` unchanged
/// - several: confidence-weighted mean; when no healthy result carries a
///   positive confidence, healthy results weigh `1.0` each. Degraded results
///   always weigh [`MIN_WEIGHT`].
/// - none: `0`
pub fn combine(results: &[AnalysisResult]) -> u8 {
    match results {
        [] => 0,
        [only] => only.risk_score,
        _ => {
            let unweighted = results
                .iter()
                .filter(|r| !r.is_degraded())
                .all(|r| r.confidence.map_or(true, |c| c <= 0.0));
            let (sum, total_weight) = results.iter().fold((0.0, 0.0), |(sum, total), r| {
                let w = weight(r, unweighted);
                (sum + w * f64::from(r.risk_score), total + w)
            });
            let mean = sum / total_weight;
            mean.round().clamp(0.0, 100.0) as u8
        }
    }
}

fn weight(result: &AnalysisResult, unweighted: bool) -> f64 {
    if result.is_degraded() {
        MIN_WEIGHT
    } else if unweighted {
        1.0
    } else {
        result.confidence.unwrap_or(1.0).max(MIN_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{normalize, InputKind};
    use crate::decision::classify::{classify, Action};
    use serde_json::json;

    fn scored(score: u8, confidence: Option<f64>) -> AnalysisResult {
        AnalysisResult {
            kind: InputKind::Text,
            risk_score: score,
            confidence,
            metadata: Default::default(),
        }
    }

    #[test]
    fn single_result_passes_through() {
        assert_eq!(combine(&[scored(85, Some(0.2))]), 85);
        assert_eq!(combine(&[scored(0, None)]), 0);
    }

    #[test]
    fn empty_input_is_neutral() {
        assert_eq!(combine(&[]), 0);
    }

    #[test]
    fn falls_back_to_plain_mean_without_confidence() {
        assert_eq!(combine(&[scored(20, None), scored(61, None)]), 41);
        assert_eq!(combine(&[scored(20, Some(0.0)), scored(60, None)]), 40);
    }

    #[test]
    fn weights_by_confidence() {
        // (90*0.9 + 10*0.1) / 1.0 = 82
        assert_eq!(combine(&[scored(90, Some(0.9)), scored(10, Some(0.1))]), 82);
    }

    #[test]
    fn degraded_input_pulls_toward_neutral() {
        let degraded = normalize(InputKind::Text, None);
        let combined = combine(&[scored(80, Some(1.0)), degraded]);
        // 80 * 1.0 / 1.05 = 76.19
        assert_eq!(combined, 76);
    }

    #[test]
    fn timed_out_analyzer_does_not_halve_a_healthy_score() {
        let healthy = normalize(InputKind::Url, Some(&json!({"risk_score": 90})));
        let missing = normalize(InputKind::Url, None);
        // 90 * 1.0 / 1.05 = 85.7
        let combined = combine(&[healthy, missing]);
        assert_eq!(combined, 86);
        assert_eq!(classify(combined), Action::Alert);
    }

    #[test]
    fn degraded_only_inputs_stay_neutral() {
        let a = normalize(InputKind::Text, Some(&json!({"label": "benign"})));
        let b = normalize(InputKind::Text, None);
        assert_eq!(combine(&[a, b]), 0);
    }
}

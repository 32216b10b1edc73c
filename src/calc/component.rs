use std::collections::HashMap;

use serde::Serialize;

use super::error::CalcError;
use super::model::{AssessmentComponent, Mark, SubjectInstance};
use super::policy::{round_half_up_2, AggregationPolicy, WeightingScheme};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentResult {
    pub component_id: String,
    pub score: Mark,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_instance_id: String,
    pub average: Mark,
    pub has_grades: bool,
    pub components: Vec<ComponentResult>,
}

fn graded_contribution(scheme: WeightingScheme, score: f64, weight: f64) -> f64 {
    match scheme {
        WeightingScheme::PointsCapped => score.min(weight),
        WeightingScheme::Percentage => score.min(100.0) / 100.0 * weight,
    }
}

/// Combine one student's component scores into a subject average (0-100).
///
/// `scores` maps component id to the student's recorded score; a missing key
/// means the component is ungraded. The subject only counts as graded when
/// some positive-weight component has a score.
pub fn aggregate_components(
    subject: &SubjectInstance,
    components: &[&AssessmentComponent],
    scores: &HashMap<&str, f64>,
    policy: &AggregationPolicy,
) -> Result<SubjectResult, CalcError> {
    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    let mut graded_weight = 0.0_f64;
    let mut breakdown = Vec::with_capacity(components.len());

    for c in components {
        let mark = scores
            .get(c.id.as_str())
            .copied()
            .map(Mark::Graded)
            .unwrap_or(Mark::Ungraded);
        breakdown.push(ComponentResult {
            component_id: c.id.clone(),
            score: mark,
            weight: c.weight,
        });

        match mark {
            Mark::Graded(score) => {
                if c.weight > 0.0 {
                    numerator += graded_contribution(policy.scheme, score, c.weight);
                    denominator += c.weight;
                    graded_weight += c.weight;
                }
            }
            Mark::Ungraded => {
                if policy.include_ungraded && c.weight > 0.0 {
                    denominator += c.weight;
                }
            }
        }
    }

    if !numerator.is_finite() || !denominator.is_finite() {
        return Err(CalcError::InvalidInput {
            entity: "subjectInstance",
            id: subject.id.clone(),
            message: "component weights sum past the representable range".to_string(),
        });
    }

    // numerator <= denominator under both schemes, so the ratio cannot overflow.
    let average = if graded_weight > 0.0 && denominator > 0.0 {
        Mark::Graded(round_half_up_2(100.0 * (numerator / denominator)))
    } else {
        Mark::Ungraded
    };

    Ok(SubjectResult {
        subject_instance_id: subject.id.clone(),
        average,
        has_grades: average.is_graded(),
        components: breakdown,
    })
}

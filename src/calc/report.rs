use std::collections::BTreeMap;

use serde::Serialize;

use super::engine::{SnapshotIndex, StudentTermResult};
use super::error::CalcError;
use super::model::{GradeSnapshot, Mark};
use super::policy::{round_half_up_2, AggregationPolicy};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_instance_id: String,
    pub subject_id: String,
    pub weight: f64,
    pub class_average: Mark,
    pub graded_students: usize,
    pub assessment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermReport {
    pub term_id: String,
    pub policy: AggregationPolicy,
    pub students: Vec<StudentTermResult>,
    pub subjects: Vec<SubjectSummary>,
    pub letter_distribution: BTreeMap<&'static str, usize>,
}

/// Every enrolled student's result for one term, plus per-subject class
/// averages over the students that have work recorded.
pub fn compute_term_report(
    snapshot: &GradeSnapshot,
    term_id: &str,
    policy: &AggregationPolicy,
) -> Result<TermReport, CalcError> {
    let index = SnapshotIndex::build(snapshot)?;

    let mut student_ids: Vec<&str> = snapshot.students.iter().map(|s| s.id.as_str()).collect();
    student_ids.sort_unstable();
    student_ids.dedup();

    let mut students = Vec::with_capacity(student_ids.len());
    for id in student_ids {
        students.push(index.student_term(id, term_id, policy)?);
    }

    let mut subjects = Vec::new();
    for (pos, si) in snapshot.subject_instances_for_term(term_id).enumerate() {
        let mut sum = 0.0_f64;
        let mut graded = 0_usize;
        for r in &students {
            // Every result lists the term's subjects in snapshot order.
            if let Some(Mark::Graded(avg)) = r.subjects.get(pos).map(|s| s.average) {
                sum += avg;
                graded += 1;
            }
        }
        let class_average = if graded > 0 {
            Mark::Graded(round_half_up_2(sum / graded as f64))
        } else {
            Mark::Ungraded
        };
        subjects.push(SubjectSummary {
            subject_instance_id: si.id.clone(),
            subject_id: si.subject_id.clone(),
            weight: si.weight,
            class_average,
            graded_students: graded,
            assessment_count: index.components_of(&si.id).len(),
        });
    }

    let mut letter_distribution = BTreeMap::new();
    for r in &students {
        *letter_distribution.entry(r.letter_grade.as_str()).or_insert(0) += 1;
    }

    tracing::debug!(
        term_id,
        students = students.len(),
        subjects = subjects.len(),
        "term report computed"
    );

    Ok(TermReport {
        term_id: term_id.to_string(),
        policy: *policy,
        students,
        subjects,
        letter_distribution,
    })
}

use std::collections::HashMap;

use serde::Serialize;

use super::component::{aggregate_components, SubjectResult};
use super::error::CalcError;
use super::letter::LetterGrade;
use super::model::{AssessmentComponent, ComponentGrade, GradeSnapshot, Mark, SubjectInstance};
use super::policy::AggregationPolicy;
use super::subject::aggregate_subjects;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTermResult {
    pub student_id: String,
    pub term_id: String,
    pub overall: Mark,
    pub letter_grade: LetterGrade,
    pub has_grades: bool,
    pub subjects: Vec<SubjectResult>,
}

impl StudentTermResult {
    fn assemble(student_id: &str, term_id: &str, subjects: Vec<SubjectResult>, overall: Mark) -> Self {
        Self {
            student_id: student_id.to_string(),
            term_id: term_id.to_string(),
            overall,
            letter_grade: LetterGrade::from_mark(overall),
            has_grades: overall.is_graded(),
            subjects,
        }
    }
}

fn check_weight(entity: &'static str, id: &str, weight: f64) -> Result<(), CalcError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(CalcError::InvalidInput {
            entity,
            id: id.to_string(),
            message: format!("weight must be a non-negative number (got {})", weight),
        });
    }
    Ok(())
}

const MAX_SUBJECT_WEIGHT: f64 = 100.0;

fn check_subject_weight(si: &SubjectInstance) -> Result<(), CalcError> {
    check_weight("subjectInstance", &si.id, si.weight)?;
    if si.weight > MAX_SUBJECT_WEIGHT {
        return Err(CalcError::InvalidInput {
            entity: "subjectInstance",
            id: si.id.clone(),
            message: format!("weight must be between 0 and 100 (got {})", si.weight),
        });
    }
    Ok(())
}

fn duplicate_id(entity: &'static str, id: &str) -> CalcError {
    CalcError::InvalidInput {
        entity,
        id: id.to_string(),
        message: "id appears more than once".to_string(),
    }
}

/// Lookup tables over a snapshot, built once and shared by every student
/// computed from it.
#[derive(Debug)]
pub struct SnapshotIndex<'a> {
    snapshot: &'a GradeSnapshot,
    subjects: HashMap<&'a str, &'a SubjectInstance>,
    components: HashMap<&'a str, &'a AssessmentComponent>,
    components_by_subject: HashMap<&'a str, Vec<&'a AssessmentComponent>>,
    grades_by_student: HashMap<&'a str, Vec<&'a ComponentGrade>>,
}

impl<'a> SnapshotIndex<'a> {
    pub fn build(snapshot: &'a GradeSnapshot) -> Result<Self, CalcError> {
        let mut subjects = HashMap::with_capacity(snapshot.subject_instances.len());
        for si in &snapshot.subject_instances {
            check_subject_weight(si)?;
            if subjects.insert(si.id.as_str(), si).is_some() {
                return Err(duplicate_id("subjectInstance", &si.id));
            }
        }

        let mut components = HashMap::with_capacity(snapshot.components.len());
        let mut components_by_subject: HashMap<&str, Vec<&AssessmentComponent>> = HashMap::new();
        for c in &snapshot.components {
            check_weight("component", &c.id, c.weight)?;
            if components.insert(c.id.as_str(), c).is_some() {
                return Err(duplicate_id("component", &c.id));
            }
            if !subjects.contains_key(c.subject_instance_id.as_str()) {
                tracing::debug!(
                    component_id = %c.id,
                    subject_instance_id = %c.subject_instance_id,
                    "component has no subject instance; it is never reached"
                );
            }
            components_by_subject
                .entry(c.subject_instance_id.as_str())
                .or_default()
                .push(c);
        }

        let mut grades_by_student: HashMap<&str, Vec<&ComponentGrade>> = HashMap::new();
        for g in &snapshot.component_grades {
            grades_by_student
                .entry(g.student_id.as_str())
                .or_default()
                .push(g);
        }

        Ok(Self {
            snapshot,
            subjects,
            components,
            components_by_subject,
            grades_by_student,
        })
    }

    pub fn snapshot(&self) -> &'a GradeSnapshot {
        self.snapshot
    }

    pub fn components_of(&self, subject_instance_id: &str) -> &[&'a AssessmentComponent] {
        self.components_by_subject
            .get(subject_instance_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The student's scores keyed by component id, after checking every grade
    /// record points at something that exists.
    fn student_scores(&self, student_id: &str) -> Result<HashMap<&'a str, f64>, CalcError> {
        let grades = self
            .grades_by_student
            .get(student_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        let mut scores = HashMap::with_capacity(grades.len());
        for g in grades {
            if !g.score.is_finite() || g.score < 0.0 {
                return Err(CalcError::InvalidInput {
                    entity: "componentGrade",
                    id: g.id.clone(),
                    message: format!("score must be a non-negative number (got {})", g.score),
                });
            }
            if !self.subjects.contains_key(g.subject_instance_id.as_str()) {
                return Err(CalcError::UnknownSubjectInstance {
                    grade_id: g.id.clone(),
                    subject_instance_id: g.subject_instance_id.clone(),
                });
            }
            let Some(component) = self.components.get(g.component_id.as_str()) else {
                return Err(CalcError::UnknownComponent {
                    grade_id: g.id.clone(),
                    component_id: g.component_id.clone(),
                });
            };
            if component.subject_instance_id != g.subject_instance_id {
                return Err(CalcError::MismatchedComponent {
                    grade_id: g.id.clone(),
                    subject_instance_id: g.subject_instance_id.clone(),
                    component_id: g.component_id.clone(),
                    component_subject_instance_id: component.subject_instance_id.clone(),
                });
            }
            if scores.insert(g.component_id.as_str(), g.score).is_some() {
                return Err(CalcError::DuplicateGrade {
                    student_id: student_id.to_string(),
                    component_id: g.component_id.clone(),
                });
            }
        }
        Ok(scores)
    }

    fn term_result(
        &self,
        student_id: &str,
        term_id: &str,
        scores: &HashMap<&'a str, f64>,
        policy: &AggregationPolicy,
    ) -> Result<StudentTermResult, CalcError> {
        let mut subjects: Vec<(SubjectResult, f64)> = Vec::new();
        for si in self.snapshot.subject_instances_for_term(term_id) {
            let r = aggregate_components(si, self.components_of(&si.id), scores, policy)?;
            subjects.push((r, si.weight));
        }

        let overall =
            aggregate_subjects(term_id, subjects.iter().map(|(r, w)| (r.average, *w)))?;
        let result = StudentTermResult::assemble(
            student_id,
            term_id,
            subjects.into_iter().map(|(r, _)| r).collect(),
            overall,
        );
        tracing::trace!(
            student_id,
            term_id,
            overall = ?result.overall.value(),
            letter = %result.letter_grade,
            "student term computed"
        );
        Ok(result)
    }

    pub fn student_term(
        &self,
        student_id: &str,
        term_id: &str,
        policy: &AggregationPolicy,
    ) -> Result<StudentTermResult, CalcError> {
        let scores = self.student_scores(student_id)?;
        self.term_result(student_id, term_id, &scores, policy)
    }

    pub fn student_all_terms(
        &self,
        student_id: &str,
        policy: &AggregationPolicy,
    ) -> Result<Vec<StudentTermResult>, CalcError> {
        let scores = self.student_scores(student_id)?;
        self.snapshot
            .referenced_term_ids()
            .iter()
            .map(|term_id| self.term_result(student_id, term_id, &scores, policy))
            .collect()
    }
}

/// Overall percentage, letter and per-subject breakdown for one student in one
/// term. The term must be named by the caller.
pub fn compute_student_term(
    snapshot: &GradeSnapshot,
    student_id: &str,
    term_id: &str,
    policy: &AggregationPolicy,
) -> Result<StudentTermResult, CalcError> {
    SnapshotIndex::build(snapshot)?.student_term(student_id, term_id, policy)
}

pub fn compute_student_all_terms(
    snapshot: &GradeSnapshot,
    student_id: &str,
    policy: &AggregationPolicy,
) -> Result<Vec<StudentTermResult>, CalcError> {
    SnapshotIndex::build(snapshot)?.student_all_terms(student_id, policy)
}

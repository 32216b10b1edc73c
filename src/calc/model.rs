use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub grade_level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
}

/// One subject as taught in one term. `weight` is its share of the overall
/// grade for that term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInstance {
    pub id: String,
    #[serde(default)]
    pub subject_id: String,
    pub term_id: String,
    pub weight: f64,
}

/// A gradable item within a subject instance. Under the points-capped scheme
/// `weight` is also the most a score can contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentComponent {
    pub id: String,
    pub subject_instance_id: String,
    #[serde(default)]
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentGrade {
    pub id: String,
    pub student_id: String,
    pub subject_instance_id: String,
    pub component_id: String,
    pub score: f64,
}

/// Read-only view of the gradebook handed to the engine by a gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSnapshot {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub subject_instances: Vec<SubjectInstance>,
    #[serde(default)]
    pub components: Vec<AssessmentComponent>,
    #[serde(default)]
    pub component_grades: Vec<ComponentGrade>,
}

impl GradeSnapshot {
    pub fn subject_instances_for_term<'a>(
        &'a self,
        term_id: &'a str,
    ) -> impl Iterator<Item = &'a SubjectInstance> + 'a {
        self.subject_instances
            .iter()
            .filter(move |si| si.term_id == term_id)
    }

    pub fn components_for<'a>(
        &'a self,
        subject_instance_id: &'a str,
    ) -> impl Iterator<Item = &'a AssessmentComponent> + 'a {
        self.components
            .iter()
            .filter(move |c| c.subject_instance_id == subject_instance_id)
    }

    /// Distinct term ids referenced by subject instances, sorted.
    pub fn referenced_term_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .subject_instances
            .iter()
            .map(|si| si.term_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// A score slot as the engine sees it. Absence of a grade record is
/// `Ungraded`, never a zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    Ungraded,
    Graded(f64),
}

impl Mark {
    pub fn value(self) -> Option<f64> {
        match self {
            Mark::Ungraded => None,
            Mark::Graded(v) => Some(v),
        }
    }

    pub fn is_graded(self) -> bool {
        matches!(self, Mark::Graded(_))
    }
}

impl Serialize for Mark {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

//! Where snapshots come from. The engine only ever sees a [`GradeSnapshot`];
//! a gateway is whatever produces one.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::calc::{
    AssessmentComponent, ComponentGrade, GradeSnapshot, Student, SubjectInstance, Term,
};

pub trait GradeDataGateway {
    fn load_snapshot(&self) -> anyhow::Result<GradeSnapshot>;
}

/// Inline snapshots, e.g. one posted with a request.
impl GradeDataGateway for GradeSnapshot {
    fn load_snapshot(&self) -> anyhow::Result<GradeSnapshot> {
        Ok(self.clone())
    }
}

/// Reads a workspace database. Read-only: nothing here writes grade data.
pub struct SqliteGateway<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteGateway<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn load_terms(&self) -> anyhow::Result<Vec<Term>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_active, starts_on, ends_on
             FROM terms
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut terms = Vec::with_capacity(rows.len());
        for (id, name, is_active, starts_on, ends_on) in rows {
            terms.push(Term {
                starts_on: parse_date(&id, starts_on.as_deref())?,
                ends_on: parse_date(&id, ends_on.as_deref())?,
                id,
                name,
                is_active: is_active != 0,
            });
        }
        Ok(terms)
    }

    fn load_students(&self) -> anyhow::Result<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, grade_level FROM students ORDER BY id")?;
        let students = stmt
            .query_map([], |r| {
                Ok(Student {
                    id: r.get(0)?,
                    grade_level: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn load_subject_instances(&self) -> anyhow::Result<Vec<SubjectInstance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_id, term_id, weight
             FROM subject_instances
             ORDER BY term_id, sort_order, id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(SubjectInstance {
                    id: r.get(0)?,
                    subject_id: r.get(1)?,
                    term_id: r.get(2)?,
                    weight: r.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn load_components(&self) -> anyhow::Result<Vec<AssessmentComponent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_instance_id, name, weight
             FROM assessment_components
             ORDER BY subject_instance_id, sort_order, id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(AssessmentComponent {
                    id: r.get(0)?,
                    subject_instance_id: r.get(1)?,
                    name: r.get(2)?,
                    weight: r.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn load_component_grades(&self) -> anyhow::Result<Vec<ComponentGrade>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, student_id, subject_instance_id, component_id, score
             FROM component_grades
             ORDER BY student_id, id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(ComponentGrade {
                    id: r.get(0)?,
                    student_id: r.get(1)?,
                    subject_instance_id: r.get(2)?,
                    component_id: r.get(3)?,
                    score: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn parse_date(term_id: &str, raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| anyhow::anyhow!("term {}: bad date {:?}: {}", term_id, s, e))
}

impl GradeDataGateway for SqliteGateway<'_> {
    fn load_snapshot(&self) -> anyhow::Result<GradeSnapshot> {
        let snapshot = GradeSnapshot {
            students: self.load_students()?,
            terms: self.load_terms()?,
            subject_instances: self.load_subject_instances()?,
            components: self.load_components()?,
            component_grades: self.load_component_grades()?,
        };
        tracing::debug!(
            students = snapshot.students.len(),
            subject_instances = snapshot.subject_instances.len(),
            components = snapshot.components.len(),
            grades = snapshot.component_grades.len(),
            "snapshot loaded from workspace"
        );
        Ok(snapshot)
    }
}

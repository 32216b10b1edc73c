//! Weighted grade aggregation.
//!
//! Component scores roll up into a subject average, subject averages roll up
//! into a term overall, and the overall maps to a letter band. Everything here
//! is a pure function of the snapshot and policy it is given.

mod component;
mod engine;
mod error;
mod letter;
mod model;
mod policy;
mod report;
mod subject;

pub use component::{aggregate_components, ComponentResult, SubjectResult};
pub use engine::{compute_student_all_terms, compute_student_term, SnapshotIndex, StudentTermResult};
pub use error::CalcError;
pub use letter::LetterGrade;
pub use model::{
    AssessmentComponent, ComponentGrade, GradeSnapshot, Mark, Student, SubjectInstance, Term,
};
pub use policy::{round_half_up_2, AggregationPolicy, WeightingScheme};
pub use report::{compute_term_report, SubjectSummary, TermReport};
pub use subject::aggregate_subjects;

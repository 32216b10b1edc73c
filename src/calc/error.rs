use thiserror::Error;

/// Contract violations in the input snapshot, plus term-resolution failures.
///
/// Ordinary absence of data is never an error; it degrades to an ungraded
/// result instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("grade {grade_id} references unknown subject instance {subject_instance_id}")]
    UnknownSubjectInstance {
        grade_id: String,
        subject_instance_id: String,
    },

    #[error("grade {grade_id} references unknown component {component_id}")]
    UnknownComponent {
        grade_id: String,
        component_id: String,
    },

    #[error(
        "grade {grade_id} is filed under {subject_instance_id} but component {component_id} belongs to {component_subject_instance_id}"
    )]
    MismatchedComponent {
        grade_id: String,
        subject_instance_id: String,
        component_id: String,
        component_subject_instance_id: String,
    },

    #[error("student {student_id} has more than one grade for component {component_id}")]
    DuplicateGrade {
        student_id: String,
        component_id: String,
    },

    #[error("{entity} {id}: {message}")]
    InvalidInput {
        entity: &'static str,
        id: String,
        message: String,
    },

    #[error("term not found: {0}")]
    UnknownTerm(String),

    #[error("cannot pick a term: {} candidate(s) match", .0.len())]
    AmbiguousActiveTerm(Vec<String>),
}

impl CalcError {
    pub fn code(&self) -> &'static str {
        match self {
            CalcError::UnknownSubjectInstance { .. }
            | CalcError::UnknownComponent { .. }
            | CalcError::MismatchedComponent { .. } => "referential_integrity",
            CalcError::DuplicateGrade { .. } => "duplicate_grade",
            CalcError::InvalidInput { .. } => "invalid_input",
            CalcError::UnknownTerm(_) => "unknown_term",
            CalcError::AmbiguousActiveTerm(_) => "ambiguous_active_term",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CalcError::AmbiguousActiveTerm(ids) => Some(serde_json::json!({ "candidates": ids })),
            CalcError::UnknownTerm(id) => Some(serde_json::json!({ "termId": id })),
            _ => None,
        }
    }
}

use serde_json::json;

use crate::calc::{self, GradeSnapshot};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{
    optional_str, request_policy, request_snapshot, request_today, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::term;

/// Explicit `termId`, else the snapshot's terms run through the default-term
/// policy.
fn request_term_id(req: &Request, snapshot: &GradeSnapshot) -> Result<String, serde_json::Value> {
    if let Some(id) = optional_str(req, "termId")? {
        return Ok(id);
    }
    let today = request_today(req)?;
    term::resolve_term(&snapshot.terms, None, today)
        .map(|t| t.id.clone())
        .map_err(|e| calc_err(&req.id, &e))
}

fn handle_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let policy = match request_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let snapshot = match request_snapshot(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let term_id = match request_term_id(req, &snapshot) {
        Ok(t) => t,
        Err(e) => return e,
    };

    match calc::compute_student_term(&snapshot, &student_id, &term_id, &policy) {
        Ok(result) => ok(&req.id, json!(result)),
        Err(e) => calc_err(&req.id, &e),
    }
}

fn handle_student_all_terms(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let policy = match request_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let snapshot = match request_snapshot(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };

    match calc::compute_student_all_terms(&snapshot, &student_id, &policy) {
        Ok(results) => ok(&req.id, json!({ "studentId": student_id, "terms": results })),
        Err(e) => calc_err(&req.id, &e),
    }
}

fn handle_term(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match request_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let snapshot = match request_snapshot(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let term_id = match request_term_id(req, &snapshot) {
        Ok(t) => t,
        Err(e) => return e,
    };

    match calc::compute_term_report(&snapshot, &term_id, &policy) {
        Ok(report) => ok(&req.id, json!(report)),
        Err(e) => calc_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.student" => Some(handle_student(state, req)),
        "grades.studentAllTerms" => Some(handle_student_all_terms(state, req)),
        "grades.term" => Some(handle_term(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: serde_json::Value) -> Request {
        Request {
            id: "t".to_string(),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn inline_snapshot_needs_no_workspace() {
        let mut state = AppState::default();
        let req = request(
            "grades.student",
            json!({
                "studentId": "s1",
                "termId": "t1",
                "snapshot": {
                    "subjectInstances": [{ "id": "si", "termId": "t1", "weight": 100 }],
                    "components": [{ "id": "c1", "subjectInstanceId": "si", "weight": 10 }],
                    "componentGrades": [{
                        "id": "g1", "studentId": "s1", "subjectInstanceId": "si",
                        "componentId": "c1", "score": 9
                    }]
                }
            }),
        );
        let resp = try_handle(&mut state, &req).expect("handled");
        assert_eq!(resp["ok"], true, "{}", resp);
        assert_eq!(resp["result"]["overall"], 90.0);
        assert_eq!(resp["result"]["letterGrade"], "A-");
    }

    #[test]
    fn missing_term_without_terms_is_ambiguous() {
        let mut state = AppState::default();
        let req = request("grades.student", json!({ "studentId": "s1", "snapshot": {} }));
        let resp = try_handle(&mut state, &req).expect("handled");
        assert_eq!(resp["ok"], false);
        assert_eq!(resp["error"]["code"], "ambiguous_active_term");
    }

    #[test]
    fn workspace_source_requires_selected_workspace() {
        let mut state = AppState::default();
        let req = request("grades.term", json!({ "termId": "t1" }));
        let resp = try_handle(&mut state, &req).expect("handled");
        assert_eq!(resp["error"]["code"], "no_workspace");
    }
}

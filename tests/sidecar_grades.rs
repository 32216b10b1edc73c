use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn snapshot() -> serde_json::Value {
    json!({
        "students": [{ "id": "s1", "gradeLevel": 9 }, { "id": "s2", "gradeLevel": 9 }],
        "terms": [
            { "id": "t1", "name": "Fall", "isActive": true },
            { "id": "t2", "name": "Spring", "isActive": false }
        ],
        "subjectInstances": [
            { "id": "math", "subjectId": "math", "termId": "t1", "weight": 70 },
            { "id": "art", "subjectId": "art", "termId": "t1", "weight": 30 }
        ],
        "components": [
            { "id": "m-test", "subjectInstanceId": "math", "name": "Test", "weight": 50 },
            { "id": "m-hw", "subjectInstanceId": "math", "name": "Homework", "weight": 50 },
            { "id": "a-proj", "subjectInstanceId": "art", "name": "Project", "weight": 100 }
        ],
        "componentGrades": [
            { "id": "g1", "studentId": "s1", "subjectInstanceId": "math", "componentId": "m-test", "score": 40 },
            { "id": "g2", "studentId": "s1", "subjectInstanceId": "math", "componentId": "m-hw", "score": 50 },
            { "id": "g3", "studentId": "s2", "subjectInstanceId": "math", "componentId": "m-test", "score": 40 }
        ]
    })
}

#[test]
fn health_reports_version_without_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(res["version"], env!("CARGO_PKG_VERSION"));
    assert!(res["workspacePath"].is_null());
    let _ = child.kill();
}

#[test]
fn student_grades_from_inline_snapshot() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let s1 = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.student",
        json!({ "studentId": "s1", "snapshot": snapshot() }),
    );
    // Active term resolved from the snapshot's terms.
    assert_eq!(s1["termId"], "t1");
    assert_eq!(s1["overall"], 90.0);
    assert_eq!(s1["letterGrade"], "A-");
    assert_eq!(s1["hasGrades"], true);
    assert_eq!(s1["subjects"][1]["subjectInstanceId"], "art");
    assert!(s1["subjects"][1]["average"].is_null());
    assert_eq!(s1["subjects"][1]["components"][0]["score"], serde_json::Value::Null);

    let s2 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.student",
        json!({ "studentId": "s2", "termId": "t1", "snapshot": snapshot() }),
    );
    assert_eq!(s2["overall"], 40.0);
    assert_eq!(s2["letterGrade"], "F");

    let s2_excluding = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.student",
        json!({
            "studentId": "s2",
            "termId": "t1",
            "policy": { "includeUngraded": false },
            "snapshot": snapshot()
        }),
    );
    assert_eq!(s2_excluding["overall"], 80.0);
    assert_eq!(s2_excluding["letterGrade"], "B-");

    let empty_term = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "grades.student",
        json!({ "studentId": "s1", "termId": "t2", "snapshot": snapshot() }),
    );
    assert!(empty_term["overall"].is_null());
    assert_eq!(empty_term["letterGrade"], "N/A");
    assert_eq!(empty_term["hasGrades"], false);

    let _ = child.kill();
}

#[test]
fn term_report_and_all_terms_views() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.term",
        json!({ "termId": "t1", "snapshot": snapshot() }),
    );
    let students = report["students"].as_array().expect("students");
    assert_eq!(students.len(), 2);
    assert_eq!(report["subjects"][0]["classAverage"], 65.0);
    assert_eq!(report["subjects"][0]["gradedStudents"], 2);
    assert!(report["subjects"][1]["classAverage"].is_null());
    assert_eq!(report["letterDistribution"]["A-"], 1);
    assert_eq!(report["letterDistribution"]["F"], 1);
    assert_eq!(report["policy"]["scheme"], "pointsCapped");

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.studentAllTerms",
        json!({ "studentId": "s1", "snapshot": snapshot() }),
    );
    let terms = all["terms"].as_array().expect("terms");
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0]["termId"], "t1");

    let _ = child.kill();
}

#[test]
fn contract_violations_and_bad_requests_are_reported_not_fatal() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let mut broken = snapshot();
    broken["componentGrades"]
        .as_array_mut()
        .expect("grades")
        .push(json!({
            "id": "g9", "studentId": "s1", "subjectInstanceId": "ghost",
            "componentId": "m-test", "score": 10
        }));
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.student",
        json!({ "studentId": "s1", "termId": "t1", "snapshot": broken }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "referential_integrity");

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.student",
        json!({ "termId": "t1", "snapshot": snapshot() }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.student",
        json!({ "studentId": "s1", "policy": { "scheme": "curve" }, "snapshot": snapshot() }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = request(&mut stdin, &mut reader, "4", "grades.explode", json!({}));
    assert_eq!(resp["error"]["code"], "not_implemented");

    // Still serving after all of the above.
    let _ = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));

    let _ = child.kill();
}

#[test]
fn unparseable_line_gets_bad_json_reply() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "{{not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("reply is json");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "bad_json");
    let _ = child.kill();
}

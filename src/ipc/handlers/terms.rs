use serde_json::json;

use crate::gateway::SqliteGateway;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{db_conn, optional_str, request_today};
use crate::ipc::types::{AppState, Request};
use crate::term;

fn handle_terms_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match SqliteGateway::new(conn).load_terms() {
        Ok(terms) => ok(&req.id, json!({ "terms": terms })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_terms_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let explicit = match optional_str(req, "termId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let today = match request_today(req) {
        Ok(d) => d,
        Err(e) => return e,
    };
    let terms = match SqliteGateway::new(conn).load_terms() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match term::resolve_term(&terms, explicit.as_deref(), today) {
        Ok(t) => ok(&req.id, json!({ "term": t })),
        Err(e) => calc_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "terms.list" => Some(handle_terms_list(state, req)),
        "terms.resolve" => Some(handle_terms_resolve(state, req)),
        _ => None,
    }
}

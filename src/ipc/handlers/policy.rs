use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, load_stored_policy, POLICY_SETTINGS_KEY};
use crate::ipc::types::{AppState, Request};

fn handle_policy_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match load_stored_policy(conn) {
        Ok(policy) => ok(&req.id, json!({ "policy": policy })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_policy_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut policy = match load_stored_policy(conn) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = policy.merge_patch(patch) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, POLICY_SETTINGS_KEY, &json!(policy)) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(
        scheme = policy.scheme.as_str(),
        include_ungraded = policy.include_ungraded,
        "calc policy updated"
    );
    ok(&req.id, json!({ "policy": policy }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.policy.get" => Some(handle_policy_get(state, req)),
        "calc.policy.update" => Some(handle_policy_update(state, req)),
        _ => None,
    }
}

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::calc::{AggregationPolicy, GradeSnapshot};
use crate::db;
use crate::gateway::{GradeDataGateway, SqliteGateway};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

pub const POLICY_SETTINGS_KEY: &str = "calc.policy";

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a string", key), None)),
    }
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Stored workspace policy. Malformed historical values fall back to the
/// default rather than blocking every grade request.
pub fn load_stored_policy(conn: &Connection) -> anyhow::Result<AggregationPolicy> {
    let mut policy = AggregationPolicy::default();
    if let Some(saved) = db::settings_get_json(conn, POLICY_SETTINGS_KEY)? {
        if let Some(obj) = saved.as_object() {
            let mut candidate = policy;
            match candidate.merge_patch(obj) {
                Ok(()) => policy = candidate,
                Err(msg) => tracing::warn!(%msg, "ignoring malformed stored calc policy"),
            }
        }
    }
    Ok(policy)
}

/// Workspace policy (or the default without a workspace), then the request's
/// `policy` object on top for this call only.
pub fn request_policy(state: &AppState, req: &Request) -> Result<AggregationPolicy, serde_json::Value> {
    let mut policy = match state.db.as_ref() {
        Some(conn) => load_stored_policy(conn)
            .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?,
        None => AggregationPolicy::default(),
    };
    match req.params.get("policy") {
        None => {}
        Some(v) if v.is_null() => {}
        Some(v) => {
            let Some(obj) = v.as_object() else {
                return Err(err(&req.id, "bad_params", "policy must be an object", None));
            };
            policy
                .merge_patch(obj)
                .map_err(|msg| err(&req.id, "bad_params", msg, None))?;
        }
    }
    Ok(policy)
}

/// The request's inline `snapshot` if present, else the open workspace.
pub fn request_snapshot(state: &AppState, req: &Request) -> Result<GradeSnapshot, serde_json::Value> {
    let inline = req.params.get("snapshot").filter(|v| !v.is_null());
    let loaded = match inline {
        Some(raw) => {
            let snapshot: GradeSnapshot = serde_json::from_value(raw.clone()).map_err(|e| {
                err(&req.id, "bad_params", format!("invalid snapshot: {}", e), None)
            })?;
            snapshot.load_snapshot()
        }
        None => SqliteGateway::new(db_conn(state, req)?).load_snapshot(),
    };
    loaded.map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))
}

pub fn request_today(req: &Request) -> Result<NaiveDate, serde_json::Value> {
    match optional_str(req, "today")? {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            err(
                &req.id,
                "bad_params",
                "today must be a YYYY-MM-DD date",
                Some(serde_json::json!({ "today": s })),
            )
        }),
    }
}

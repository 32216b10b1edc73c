use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::policy::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::terms::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::grades::try_handle(state, req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let span = tracing::debug_span!("request", id = %req.id, method = %req.method);
    let _enter = span.enter();

    let resp = dispatch(state, &req);
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        tracing::warn!(
            code = resp["error"]["code"].as_str().unwrap_or(""),
            message = resp["error"]["message"].as_str().unwrap_or(""),
            "request failed"
        );
    } else {
        tracing::debug!("request ok");
    }
    resp
}

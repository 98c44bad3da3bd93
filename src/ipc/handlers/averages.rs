use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ops;
use serde_json::json;

fn handle_averages_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject = req
        .params
        .get("subject")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    match ops::subject_average(&state.store, subject.as_deref()) {
        Ok(avg) => ok(&req.id, json!({ "value": avg.value, "status": avg.status })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_averages_global(state: &mut AppState, req: &Request) -> serde_json::Value {
    match ops::global_average(&state.store) {
        Ok(avg) => ok(&req.id, json!({ "value": avg.value, "status": avg.status })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "averages.subject" => Some(handle_averages_subject(state, req)),
        "averages.global" => Some(handle_averages_global(state, req)),
        _ => None,
    }
}

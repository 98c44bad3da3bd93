use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ops;
use serde_json::json;

fn param_subject(req: &Request) -> Option<String> {
    req.params
        .get("subject")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn handle_evaluations_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject = param_subject(req);
    match ops::get_evaluations(&state.store, subject.as_deref()) {
        Ok((name, evaluations)) => {
            let rows: Vec<serde_json::Value> = evaluations
                .iter()
                .map(|e| json!({ "score": e.score, "weight": e.weight }))
                .collect();
            ok(&req.id, json!({ "subject": name, "evaluations": rows }))
        }
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_evaluations_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "missing numeric params.score", None);
    };
    let weight = match req.params.get("weight") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => match v.as_f64() {
            Some(w) => Some(w),
            None => {
                return err(&req.id, "bad_params", "params.weight must be a number", None);
            }
        },
    };
    let subject = param_subject(req);

    match ops::add_evaluation(&state.store, score, weight, subject.as_deref()) {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_evaluations_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(
            &req.id,
            "bad_params",
            "params.index must be a non-negative integer",
            None,
        );
    };
    let subject = param_subject(req);

    match ops::delete_evaluation(&state.store, index as usize, subject.as_deref()) {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_evaluations_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject = param_subject(req);
    match ops::clear_evaluations(&state.store, subject.as_deref()) {
        Ok(()) => ok(&req.id, json!({ "count": 0 })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "evaluations.list" => Some(handle_evaluations_list(state, req)),
        "evaluations.add" => Some(handle_evaluations_add(state, req)),
        "evaluations.delete" => Some(handle_evaluations_delete(state, req)),
        "evaluations.clear" => Some(handle_evaluations_clear(state, req)),
        _ => None,
    }
}

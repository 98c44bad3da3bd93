use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ops;
use serde_json::json;

fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match ops::list_subjects(&state.store) {
        Ok((subjects, active)) => ok(
            &req.id,
            json!({ "subjects": subjects, "activeSubject": active }),
        ),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_subjects_set_active(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = param_str(req, "name") else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    match ops::set_active_subject(&state.store, name) {
        Ok(active) => ok(&req.id, json!({ "activeSubject": active })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_subjects_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = param_str(req, "name") else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    match ops::add_subject(&state.store, name) {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_subjects_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(from), Some(to)) = (param_str(req, "from"), param_str(req, "to")) else {
        return err(&req.id, "bad_params", "missing params.from/params.to", None);
    };
    match ops::rename_subject(&state.store, from, to) {
        Ok((subjects, active)) => ok(
            &req.id,
            json!({ "subjects": subjects, "activeSubject": active }),
        ),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = param_str(req, "name") else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    match ops::delete_subject(&state.store, name) {
        Ok((subjects, active)) => ok(
            &req.id,
            json!({ "subjects": subjects, "activeSubject": active }),
        ),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.setActive" => Some(handle_subjects_set_active(state, req)),
        "subjects.add" => Some(handle_subjects_add(state, req)),
        "subjects.rename" => Some(handle_subjects_rename(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ops;
use crate::store::Level;
use serde_json::json;

fn handle_profile_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match ops::get_profile(&state.store) {
        Ok(profile) => ok(
            &req.id,
            json!({
                "name": profile.name,
                "level": profile.level.as_str(),
                "weightingEnabled": profile.level.weighting_enabled()
            }),
        ),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_profile_set_level(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("level").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.level", None);
    };

    // Unrecognized levels are ignored, not errors; reply with whatever is
    // in effect afterwards.
    let outcome = match Level::parse(raw) {
        Some(level) => ops::set_level(&state.store, level),
        None => ops::get_profile(&state.store).map(|p| p.level),
    };
    match outcome {
        Ok(level) => ok(
            &req.id,
            json!({
                "level": level.as_str(),
                "weightingEnabled": level.weighting_enabled()
            }),
        ),
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(handle_profile_get(state, req)),
        "profile.setLevel" => Some(handle_profile_set_level(state, req)),
        _ => None,
    }
}

use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

// The view validates raw text fields through these before submitting an
// evaluation; a null value means the text was rejected.
fn handle_parse(req: &Request, parse: fn(&str) -> Option<f64>) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.text", None);
    };
    ok(&req.id, json!({ "value": parse(text) }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "input.parseScore" => Some(handle_parse(req, calc::parse_score)),
        "input.parseWeight" => Some(handle_parse(req, calc::parse_weight)),
        _ => None,
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde_json::json;
use std::path::Path;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataPath": state.store.path().to_string_lossy()
        }),
    )
}

// Re-points the store at another data directory. The view uses this for
// portable profiles; tests use it for isolation.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let store = Store::new(Path::new(path));
    // Load eagerly so a fresh directory is seeded and a broken one is
    // repaired before the next operation.
    match store.load() {
        Ok(_) => {
            log::info!("workspace selected: {}", store.path().display());
            state.store = store;
            ok(
                &req.id,
                json!({ "dataPath": state.store.path().to_string_lossy() }),
            )
        }
        Err(e) => err(&req.id, "store_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}

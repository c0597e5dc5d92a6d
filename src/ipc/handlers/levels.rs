use crate::calc::{LevelBand, LevelTable};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::collections::HashMap;

fn handle_levels_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "configured": !state.levels.is_empty(), "table": state.levels }),
    )
}

/// Installs the score classification table for this session. Items absent
/// from the table keep manual classification.
fn handle_levels_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("table") else {
        return err(&req.id, "bad_params", "missing table", None);
    };
    let bands: HashMap<String, Vec<LevelBand>> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("table must map testItemId to bands: {}", e),
                None,
            )
        }
    };
    let item_count = bands.len();
    state.levels = LevelTable::new(bands);
    ok(&req.id, json!({ "items": item_count }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "levels.get" => Some(handle_levels_get(state, req)),
        "levels.configure" => Some(handle_levels_configure(state, req)),
        _ => None,
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::TestItem;
use crate::store::Collection;
use serde_json::json;
use uuid::Uuid;

fn handle_tests_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "testItems": items }))
}

fn handle_tests_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let unit = match required_str(req, "unit") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() || unit.is_empty() {
        return err(&req.id, "bad_params", "name and unit are required", None);
    }

    let mut items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let item = TestItem {
        id: Uuid::new_v4().to_string(),
        name,
        unit,
        description: opt_str(req, "description").unwrap_or_default(),
    };
    items.push(item.clone());
    if let Err(resp) = write(store, Collection::TestItems, &items, req) {
        return resp;
    }
    ok(&req.id, json!({ "testItemId": item.id }))
}

fn handle_tests_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let item_id = match required_str(req, "testItemId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };

    let mut items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(item) = items.iter_mut().find(|i| i.id == item_id) else {
        return err(&req.id, "not_found", "test item not found", None);
    };
    if let Some(v) = patch.get("name").and_then(|v| v.as_str()) {
        item.name = v.to_string();
    }
    if let Some(v) = patch.get("unit").and_then(|v| v.as_str()) {
        item.unit = v.to_string();
    }
    if let Some(v) = patch.get("description").and_then(|v| v.as_str()) {
        item.description = v.to_string();
    }

    if let Err(resp) = write(store, Collection::TestItems, &items, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_tests_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let item_id = match required_str(req, "testItemId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let before = items.len();
    // Existing results that reference the deleted item stay in place;
    // reports drop them at join time.
    items.retain(|i| i.id != item_id);
    if items.len() == before {
        return err(&req.id, "not_found", "test item not found", None);
    }
    if let Err(resp) = write(store, Collection::TestItems, &items, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tests.list" => Some(handle_tests_list(state, req)),
        "tests.create" => Some(handle_tests_create(state, req)),
        "tests.update" => Some(handle_tests_update(state, req)),
        "tests.delete" => Some(handle_tests_delete(state, req)),
        _ => None,
    }
}

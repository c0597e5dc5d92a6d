use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, Class, TestItem};
use crate::store::Collection;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn handle_assignments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let assignments: Vec<Assignment> = match read(store, Collection::Assignments, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "assignments": assignments }))
}

fn handle_assignments_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let test_item_ids: Vec<String> = req
        .params
        .get("testItemIds")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    if test_item_ids.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "testItemIds must be a non-empty array",
            None,
        );
    }

    let mut assignments: Vec<Assignment> = match read(store, Collection::Assignments, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Duplicates for the same teacher/class pair are allowed; the data model
    // enforces no uniqueness here.
    let assignment = Assignment {
        id: Uuid::new_v4().to_string(),
        teacher_id,
        class_id,
        test_item_ids,
    };
    assignments.push(assignment.clone());
    if let Err(resp) = write(store, Collection::Assignments, &assignments, req) {
        return resp;
    }
    ok(&req.id, json!({ "assignmentId": assignment.id }))
}

fn handle_assignments_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut assignments: Vec<Assignment> = match read(store, Collection::Assignments, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let before = assignments.len();
    assignments.retain(|a| a.id != assignment_id);
    if assignments.len() == before {
        return err(&req.id, "not_found", "assignment not found", None);
    }
    if let Err(resp) = write(store, Collection::Assignments, &assignments, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

/// Resolves what a teacher is responsible for recording: one entry per
/// assigned class with the union of that class's assigned test items, in
/// canonical test-item order. Assignments pointing at deleted classes are
/// dropped silently.
fn handle_assignments_for_teacher(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignments: Vec<Assignment> = match read(store, Collection::Assignments, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let test_items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut by_class: HashMap<String, HashSet<String>> = HashMap::new();
    for a in assignments.iter().filter(|a| a.teacher_id == teacher_id) {
        by_class
            .entry(a.class_id.clone())
            .or_default()
            .extend(a.test_item_ids.iter().cloned());
    }

    let mut out = Vec::new();
    for class in &classes {
        let Some(item_ids) = by_class.get(&class.id) else {
            continue;
        };
        let ordered: Vec<&TestItem> = test_items
            .iter()
            .filter(|i| item_ids.contains(&i.id))
            .collect();
        out.push(json!({
            "classId": class.id,
            "className": class.name,
            "testItems": ordered
        }));
    }
    ok(&req.id, json!({ "classes": out }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.list" => Some(handle_assignments_list(state, req)),
        "assignments.create" => Some(handle_assignments_create(state, req)),
        "assignments.delete" => Some(handle_assignments_delete(state, req)),
        "assignments.forTeacher" => Some(handle_assignments_for_teacher(state, req)),
        _ => None,
    }
}

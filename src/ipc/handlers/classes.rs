use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, Student};
use crate::store::Collection;
use serde_json::json;
use uuid::Uuid;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Include enrollment counts so the UI can show a useful dashboard.
    let out: Vec<serde_json::Value> = classes
        .iter()
        .map(|c| {
            let student_count = students.iter().filter(|s| s.class_id == c.id).count();
            json!({
                "id": c.id,
                "name": c.name,
                "studentCount": student_count
            })
        })
        .collect();
    ok(&req.id, json!({ "classes": out }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    let mut classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class = Class {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
    };
    classes.push(class.clone());
    if let Err(resp) = write(store, Collection::Classes, &classes, req) {
        return resp;
    }
    ok(&req.id, json!({ "classId": class.id, "name": name }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let before = classes.len();
    // No cascade: enrolled students keep their classId and dangle, per the
    // data model. Reports skip references they cannot resolve.
    classes.retain(|c| c.id != class_id);
    if classes.len() == before {
        return err(&req.id, "not_found", "class not found", None);
    }
    if let Err(resp) = write(store, Collection::Classes, &classes, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}

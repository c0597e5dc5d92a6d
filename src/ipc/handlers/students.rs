use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{Gender, Student};
use crate::store::Collection;
use serde_json::json;
use uuid::Uuid;

fn parse_gender(value: Option<&serde_json::Value>) -> Option<Gender> {
    serde_json::from_value(value?.clone()).ok()
}

fn positive_num(value: Option<&serde_json::Value>) -> Option<f64> {
    let v = value?.as_f64()?;
    (v.is_finite() && v > 0.0).then_some(v)
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_filter = opt_str(req, "classId");
    let out: Vec<&Student> = students
        .iter()
        .filter(|s| class_filter.as_deref().map_or(true, |c| s.class_id == c))
        .collect();
    ok(&req.id, json!({ "students": out }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_no = match required_str(req, "studentId") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if student_no.is_empty() || name.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "studentId and name are required",
            None,
        );
    }
    let Some(gender) = parse_gender(req.params.get("gender")) else {
        return err(&req.id, "bad_params", "gender must be MALE or FEMALE", None);
    };

    let mut students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student = Student {
        id: Uuid::new_v4().to_string(),
        student_id: student_no,
        name,
        gender,
        birth_date: opt_str(req, "birthDate").unwrap_or_default(),
        class_id,
        weight: positive_num(req.params.get("weight")),
        height: positive_num(req.params.get("height")),
    };
    students.push(student.clone());
    if let Err(resp) = write(store, Collection::Students, &students, req) {
        return resp;
    }
    ok(&req.id, json!({ "studentId": student.id }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };

    let mut students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(student) = students.iter_mut().find(|s| s.id == student_id) else {
        return err(&req.id, "not_found", "student not found", None);
    };

    if let Some(v) = patch.get("studentId").and_then(|v| v.as_str()) {
        student.student_id = v.to_string();
    }
    if let Some(v) = patch.get("name").and_then(|v| v.as_str()) {
        student.name = v.to_string();
    }
    if let Some(gender) = parse_gender(patch.get("gender")) {
        student.gender = gender;
    }
    if let Some(v) = patch.get("birthDate").and_then(|v| v.as_str()) {
        student.birth_date = v.to_string();
    }
    if let Some(v) = patch.get("classId").and_then(|v| v.as_str()) {
        student.class_id = v.to_string();
    }
    if let Some(v) = positive_num(patch.get("weight")) {
        student.weight = Some(v);
    }
    if let Some(v) = positive_num(patch.get("height")) {
        student.height = Some(v);
    }

    if let Err(resp) = write(store, Collection::Students, &students, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let before = students.len();
    students.retain(|s| s.id != student_id);
    if students.len() == before {
        return err(&req.id, "not_found", "student not found", None);
    }
    if let Err(resp) = write(store, Collection::Students, &students, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

/// Bulk import, one student per line: `studentId,name,M|F,birthDate`.
/// Lines missing an id or name are skipped, not fatal.
fn handle_students_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lines = match required_str(req, "lines") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for line in lines.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        let student_no = parts.first().map(|p| p.trim()).unwrap_or_default();
        let name = parts.get(1).map(|p| p.trim()).unwrap_or_default();
        if student_no.is_empty() || name.is_empty() {
            skipped += 1;
            continue;
        }
        let gender = match parts
            .get(2)
            .map(|p| p.trim().to_ascii_uppercase())
            .as_deref()
        {
            Some("M") | Some("MALE") => Gender::Male,
            _ => Gender::Female,
        };
        students.push(Student {
            id: Uuid::new_v4().to_string(),
            student_id: student_no.to_string(),
            name: name.to_string(),
            gender,
            birth_date: parts.get(3).map(|p| p.trim().to_string()).unwrap_or_default(),
            class_id: class_id.clone(),
            weight: None,
            height: None,
        });
        imported += 1;
    }

    if let Err(resp) = write(store, Collection::Students, &students, req) {
        return resp;
    }
    log::info!("imported {} students into class {}", imported, class_id);
    ok(&req.id, json!({ "imported": imported, "skipped": skipped }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.import" => Some(handle_students_import(state, req)),
        _ => None,
    }
}

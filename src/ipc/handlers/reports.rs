use crate::csv::{
    class_rows, individual_rows, school_rows, write_export, CLASS_HEADERS, INDIVIDUAL_HEADERS,
    SCHOOL_HEADERS,
};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{read, required_str, store};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, FitnessRecord, Student, TestItem};
use crate::report::{summarize_class, summarize_individual, summarize_school};
use crate::store::Collection;
use serde_json::json;
use std::path::PathBuf;

fn handle_reports_individual(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let test_items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let report = summarize_individual(&student_id, &records, &test_items);
    ok(&req.id, json!({ "report": report }))
}

fn handle_reports_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(class) = classes.iter().find(|c| c.id == class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let summary = summarize_class(&class_id, &students, &records);
    ok(
        &req.id,
        json!({ "className": class.name, "summary": summary }),
    )
}

fn handle_reports_school(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({ "summary": summarize_school(&students, &records) }),
    )
}

fn out_dir(req: &Request) -> Result<PathBuf, serde_json::Value> {
    required_str(req, "outDir").map(PathBuf::from)
}

fn export_ok(req: &Request, written: anyhow::Result<PathBuf>, rows: usize) -> serde_json::Value {
    match written {
        Ok(path) => ok(&req.id, json!({ "path": path, "rows": rows })),
        Err(e) => err(&req.id, "io_failed", format!("{:?}", e), None),
    }
}

fn handle_export_individual(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let dir = match out_dir(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(student) = students.iter().find(|s| s.id == student_id) else {
        return err(&req.id, "not_found", "student not found", None);
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let test_items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = summarize_individual(&student_id, &records, &test_items) else {
        return err(&req.id, "not_found", "student has no records", None);
    };
    let rows = individual_rows(&report);
    let name = format!("fitness_report_{}", student.student_id);
    export_ok(
        req,
        write_export(&dir, &name, &INDIVIDUAL_HEADERS, &rows),
        rows.len(),
    )
}

fn handle_export_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let dir = match out_dir(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let classes: Vec<Class> = match read(store, Collection::Classes, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(class) = classes.iter().find(|c| c.id == class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let summary = summarize_class(&class_id, &students, &records);
    let rows = class_rows(&summary);
    let name = format!("class_fitness_report_{}", class.name);
    export_ok(
        req,
        write_export(&dir, &name, &CLASS_HEADERS, &rows),
        rows.len(),
    )
}

fn handle_export_school(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let dir = match out_dir(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let records: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let summary = summarize_school(&students, &records);
    let rows = school_rows(&summary);
    export_ok(
        req,
        write_export(&dir, "school_fitness_summary", &SCHOOL_HEADERS, &rows),
        rows.len(),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.individual" => Some(handle_reports_individual(state, req)),
        "reports.class" => Some(handle_reports_class(state, req)),
        "reports.school" => Some(handle_reports_school(state, req)),
        "reports.exportIndividualCsv" => Some(handle_export_individual(state, req)),
        "reports.exportClassCsv" => Some(handle_export_class(state, req)),
        "reports.exportSchoolCsv" => Some(handle_export_school(state, req)),
        _ => None,
    }
}

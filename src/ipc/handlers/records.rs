use crate::calc::{apply_level_table, compute_bmi};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{now_iso, read, required_str, sanitized_num, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{FitnessLevel, FitnessRecord, Student, TestItem, TestResult};
use crate::report::latest_record;
use crate::store::Collection;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// Opens a class for score entry: every enrolled student paired with a
/// prefill, either the latest saved record or a blank row (zeroed
/// measurements, FAIR defaults) when the student was never measured.
fn handle_records_class_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
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
    let test_items: Vec<TestItem> = match read(store, Collection::TestItems, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let entries: Vec<serde_json::Value> = students
        .iter()
        .filter(|s| s.class_id == class_id)
        .map(|student| {
            let latest = latest_record(&student.id, &records);
            let (record, saved) = match latest {
                Some(r) => (r.clone(), true),
                None => (
                    FitnessRecord {
                        id: String::new(),
                        student_id: student.id.clone(),
                        date: String::new(),
                        weight: 0.0,
                        height: 0.0,
                        bmi: 0.0,
                        results: test_items
                            .iter()
                            .map(|item| TestResult {
                                test_item_id: item.id.clone(),
                                score: 0.0,
                                level: FitnessLevel::Fair,
                            })
                            .collect(),
                    },
                    false,
                ),
            };
            json!({ "student": student, "record": record, "saved": saved })
        })
        .collect();

    ok(&req.id, json!({ "classId": class_id, "entries": entries }))
}

/// Saves one measurement batch for a class. Replacement is wholesale: every
/// prior record of a student appearing in the batch is dropped and the new
/// record takes its place with a fresh timestamp. BMI and (where the level
/// table has bands) result levels are recomputed before persisting so
/// edited scores never keep stale derived values.
fn handle_records_save_batch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(entries) = req.params.get("entries").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing entries array", None);
    };

    let date = now_iso();
    let mut batch: Vec<FitnessRecord> = Vec::with_capacity(entries.len());
    let mut batch_students: HashSet<String> = HashSet::new();

    for entry in entries {
        let Some(student_id) = entry.get("studentId").and_then(|v| v.as_str()) else {
            return err(&req.id, "bad_params", "entry missing studentId", None);
        };
        let weight = sanitized_num(entry, "weight");
        let height = sanitized_num(entry, "height");

        let mut results: Vec<TestResult> = Vec::new();
        if let Some(raw_results) = entry.get("results").and_then(|v| v.as_array()) {
            for raw in raw_results {
                let Some(test_item_id) = raw.get("testItemId").and_then(|v| v.as_str()) else {
                    continue;
                };
                let score = sanitized_num(raw, "score");
                let level: FitnessLevel = raw
                    .get("level")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or(FitnessLevel::Fair);
                results.push(TestResult {
                    test_item_id: test_item_id.to_string(),
                    score,
                    level,
                });
            }
        }

        // A re-save keeps the record id stable when the client sends it.
        let id = entry
            .get("recordId")
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut record = FitnessRecord {
            id,
            student_id: student_id.to_string(),
            date: date.clone(),
            weight,
            height,
            bmi: compute_bmi(weight, height),
            results,
        };
        apply_level_table(&mut record, &state.levels);
        batch_students.insert(record.student_id.clone());
        batch.push(record);
    }

    let stored: Vec<FitnessRecord> = match read(store, Collection::Records, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next: Vec<FitnessRecord> = stored
        .into_iter()
        .filter(|r| !batch_students.contains(&r.student_id))
        .collect();
    let saved = batch.len();
    next.extend(batch);

    if let Err(resp) = write(store, Collection::Records, &next, req) {
        return resp;
    }
    log::info!("saved batch of {} records", saved);
    ok(&req.id, json!({ "saved": saved }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.classOpen" => Some(handle_records_class_open(state, req)),
        "records.saveBatch" => Some(handle_records_save_batch(state, req)),
        _ => None,
    }
}

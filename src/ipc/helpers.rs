use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::{Collection, RecordStore};

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn opt_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn store<'a>(state: &'a AppState, req: &Request) -> Result<&'a RecordStore, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn read<T: DeserializeOwned>(
    store: &RecordStore,
    collection: Collection,
    req: &Request,
) -> Result<Vec<T>, serde_json::Value> {
    store
        .get(collection)
        .map_err(|e| err(&req.id, "store_read_failed", e.to_string(), None))
}

pub fn write<T: Serialize>(
    store: &RecordStore,
    collection: Collection,
    items: &[T],
    req: &Request,
) -> Result<(), serde_json::Value> {
    store
        .set(collection, items)
        .map_err(|e| err(&req.id, "store_write_failed", e.to_string(), None))
}

/// RFC 3339 UTC with millisecond precision; lexical order is chronological.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Numeric-input normalization: negative/NaN/absent all collapse to 0
/// rather than being rejected.
pub fn sanitized_num(params: &serde_json::Value, key: &str) -> f64 {
    let v = params.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

use std::path::PathBuf;

use serde::Deserialize;

use crate::calc::LevelTable;
use crate::store::RecordStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<RecordStore>,
    /// Active score classification table; empty until the client installs
    /// one, in which case entered levels are kept as-is.
    pub levels: LevelTable,
}

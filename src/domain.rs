use serde::Serialize;
use serde_json::{Map, Value};

/// One catalog entry per discovered notebook. Field order here is the field
/// order in the emitted JSON.
#[derive(Debug, Serialize, Clone)]
pub struct NotebookRecord {
    pub title: String,
    pub description: String,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub link: String,
    pub org: String,
    pub repo: String,
    pub source: String,
    pub path: String,
    pub gitpuller: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub org: String,
    pub repo: String,
    pub url: String,
}

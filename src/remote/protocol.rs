// src/remote/protocol.rs

//! Wire messages of the remote reload protocol.
//!
//! The remote process speaks a small JSON-RPC style protocol over its
//! WebSocket control endpoint: numbered requests, responses correlated by
//! id, and two methods we care about — `listTargets` and `reloadSources`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_LIST_TARGETS: &str = "listTargets";
pub const METHOD_RELOAD_SOURCES: &str = "reloadSources";

#[derive(Debug, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// An addressable unit inside the remote process capable of accepting a
/// reload request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `listTargets` result payload.
#[derive(Debug, Deserialize)]
pub struct TargetList {
    pub targets: Vec<TargetRef>,
}

/// `reloadSources` result payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadReport {
    pub success: bool,
    #[serde(default)]
    pub detail: String,
}

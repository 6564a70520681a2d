use thiserror::Error;

use crate::page::page_model::NodeId;

/// Failure raised by the page's introspection surface (a throwing renderer,
/// a lookup into a graph that is being torn down).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("renderer {0} rejected the root query: {1}")]
    RootQuery(u32, String),

    #[error("host lookup failed for renderer {renderer}: {reason}")]
    HostLookup { renderer: u32, reason: String },

    #[error("node {0} could not be read: {1}")]
    NodeRead(NodeId, String),
}

#[derive(Error, Debug)]
pub enum InspectorError {
    /// Traversal, classification or serialization failed for one scan cycle.
    #[error("Scan failed: {0}")]
    ScanFailure(String),

    /// The target channel is gone or rejected the message.
    #[error("Send failed on {role} port: {reason}")]
    SendFailure { role: &'static str, reason: String },

    /// Initial or reconnect attempt to the coordinator failed.
    #[error("Connect failed: {0}")]
    ConnectFailure(String),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The page already carries an inspector instance.
    #[error("Inspector already injected into this page")]
    AlreadyInjected,

    /// The page exposes no devtools hook to inspect.
    #[error("Devtools hook not found; page cannot be inspected")]
    HookMissing,

    #[error("Task failed: {0}")]
    Task(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, InspectorError>;

//! Dependency Graph - opaque input value
//!
//! Produced by an external analysis step. The pipeline never looks inside;
//! only the DOT template interprets it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph(Value);

impl DependencyGraph {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(std::io::Error::from)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for DependencyGraph {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

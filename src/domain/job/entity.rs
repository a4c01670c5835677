//! Job entity as delivered by the workflow engine

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of work activated for this worker.
///
/// Identifiers are passed through verbatim; only `custom_headers` carries a
/// contract with the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique key of the job
    pub key: i64,

    /// Task type the job was activated for
    #[serde(rename = "type")]
    pub task_type: String,

    pub process_instance_key: i64,

    /// BPMN process id of the definition the job belongs to
    pub bpmn_process_id: String,

    pub process_definition_version: i32,

    pub process_definition_key: i64,

    /// Id of the BPMN element (service task) that created the job
    pub element_id: String,

    pub element_instance_key: i64,

    /// Name of the worker that activated the job
    #[serde(default)]
    pub worker: String,

    /// Remaining retries
    #[serde(default)]
    pub retries: i32,

    /// Activation deadline as a unix epoch in milliseconds
    #[serde(default)]
    pub deadline: i64,

    /// Headers defined on the task during modelling
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// Process variables visible to the task
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl Job {
    pub fn new(key: i64, task_type: impl Into<String>) -> Self {
        Self {
            key,
            task_type: task_type.into(),
            process_instance_key: 0,
            bpmn_process_id: String::new(),
            process_definition_version: 0,
            process_definition_key: 0,
            element_id: String::new(),
            element_instance_key: 0,
            worker: String::new(),
            retries: 0,
            deadline: 0,
            custom_headers: HashMap::new(),
            variables: Map::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    pub fn with_process(
        mut self,
        bpmn_process_id: impl Into<String>,
        process_definition_key: i64,
        process_definition_version: i32,
        process_instance_key: i64,
    ) -> Self {
        self.bpmn_process_id = bpmn_process_id.into();
        self.process_definition_key = process_definition_key;
        self.process_definition_version = process_definition_version;
        self.process_instance_key = process_instance_key;
        self
    }

    pub fn with_element(
        mut self,
        element_id: impl Into<String>,
        element_instance_key: i64,
    ) -> Self {
        self.element_id = element_id.into();
        self.element_instance_key = element_instance_key;
        self
    }

    pub fn with_retries(mut self, retries: i32) -> Self {
        self.retries = retries;
        self
    }

    /// Retries to report when failing this job
    pub fn remaining_retries_after_failure(&self) -> i32 {
        (self.retries - 1).max(0)
    }
}

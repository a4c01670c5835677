//! Evaluation context for binding expressions
//!
//! Built once per job in two ordered steps:
//! 1. engine-derived identifiers under fixed `zeebe*` names
//! 2. every job variable, overwriting an identifier with the same name
//!
//! Caller variables therefore win on collision.

use serde_json::{Map, Value};

use super::entity::Job;

pub const KEY_FIELD: &str = "zeebeKey";
pub const TASK_TYPE_FIELD: &str = "zeebeTaskType";
pub const PROCESS_INSTANCE_KEY_FIELD: &str = "zeebeProcessInstanceKey";
pub const BPMN_PROCESS_ID_FIELD: &str = "zeebeBpmnProcessId";
pub const PROCESS_DEFINITION_VERSION_FIELD: &str = "zeebeProcessDefinitionVersion";
pub const PROCESS_KEY_FIELD: &str = "zeebeProcessKey";
pub const ELEMENT_ID_FIELD: &str = "zeebeElementId";
pub const ELEMENT_INSTANCE_KEY_FIELD: &str = "zeebeElementInstanceKey";

// Pre-1.0 engine naming, kept so older process models keep resolving
pub const WORKFLOW_INSTANCE_KEY_FIELD: &str = "zeebeWorkflowInstanceKey";
pub const WORKFLOW_DEFINITION_VERSION_FIELD: &str = "zeebeWorkflowDefinitionVersion";
pub const WORKFLOW_KEY_FIELD: &str = "zeebeWorkflowKey";

/// Named values visible to binding expressions of one job
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    values: Map<String, Value>,
}

impl EvaluationContext {
    pub fn for_job(job: &Job) -> Self {
        let mut values = engine_fields(job);

        for (key, value) in &job.variables {
            values.insert(key.clone(), value.clone());
        }

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn engine_fields(job: &Job) -> Map<String, Value> {
    let mut fields = Map::new();

    fields.insert(KEY_FIELD.to_string(), Value::from(job.key));
    fields.insert(TASK_TYPE_FIELD.to_string(), Value::from(job.task_type.clone()));
    fields.insert(
        PROCESS_INSTANCE_KEY_FIELD.to_string(),
        Value::from(job.process_instance_key),
    );
    fields.insert(
        WORKFLOW_INSTANCE_KEY_FIELD.to_string(),
        Value::from(job.process_instance_key),
    );
    fields.insert(
        BPMN_PROCESS_ID_FIELD.to_string(),
        Value::from(job.bpmn_process_id.clone()),
    );
    fields.insert(
        PROCESS_DEFINITION_VERSION_FIELD.to_string(),
        Value::from(job.process_definition_version),
    );
    fields.insert(
        WORKFLOW_DEFINITION_VERSION_FIELD.to_string(),
        Value::from(job.process_definition_version),
    );
    fields.insert(
        PROCESS_KEY_FIELD.to_string(),
        Value::from(job.process_definition_key),
    );
    fields.insert(
        WORKFLOW_KEY_FIELD.to_string(),
        Value::from(job.process_definition_key),
    );
    fields.insert(ELEMENT_ID_FIELD.to_string(), Value::from(job.element_id.clone()));
    fields.insert(
        ELEMENT_INSTANCE_KEY_FIELD.to_string(),
        Value::from(job.element_instance_key),
    );

    fields
}

//! Wire types for the Zeebe REST gateway

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::job::Job;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateJobsBody<'a> {
    #[serde(rename = "type")]
    pub task_type: &'a str,
    pub worker: &'a str,
    pub timeout: u64,
    pub max_jobs_to_activate: u32,
    pub request_timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct ActivateJobsResponse {
    /// Decoded one by one so a malformed entry does not drop the batch
    #[serde(default)]
    pub jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedJob {
    #[serde(deserialize_with = "deserialize_key")]
    pub job_key: i64,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_version: i32,
    #[serde(default, deserialize_with = "deserialize_key")]
    pub process_definition_key: i64,
    #[serde(default, deserialize_with = "deserialize_key")]
    pub process_instance_key: i64,
    #[serde(default)]
    pub element_id: String,
    #[serde(default, deserialize_with = "deserialize_key")]
    pub element_instance_key: i64,
    #[serde(default)]
    pub custom_headers: Map<String, Value>,
    #[serde(default)]
    pub worker: String,
    #[serde(default)]
    pub retries: i32,
    #[serde(default, deserialize_with = "deserialize_key")]
    pub deadline: i64,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl ActivatedJob {
    pub fn into_job(self) -> Job {
        // Header values are strings on the wire; anything else is kept as its JSON text
        let custom_headers: HashMap<String, String> = self
            .custom_headers
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect();

        Job {
            key: self.job_key,
            task_type: self.task_type,
            process_instance_key: self.process_instance_key,
            bpmn_process_id: self.process_definition_id,
            process_definition_version: self.process_definition_version,
            process_definition_key: self.process_definition_key,
            element_id: self.element_id,
            element_instance_key: self.element_instance_key,
            worker: self.worker,
            retries: self.retries,
            deadline: self.deadline,
            custom_headers,
            variables: self.variables,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteJobBody {
    pub variables: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailJobBody<'a> {
    pub retries: i32,
    pub error_message: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TokenRequestBody<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub audience: &'a str,
    pub grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Keys are 64-bit and may arrive as JSON strings to survive JavaScript clients
fn deserialize_key<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKey {
        Number(i64),
        Text(String),
    }

    match RawKey::deserialize(deserializer)? {
        RawKey::Number(key) => Ok(key),
        RawKey::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

//! Job domain module
//!
//! A job arrives from the workflow engine with custom headers that declare a
//! GraphQL document and how to bind its variables:
//! - `graphql_query` - the document source
//! - `graphql_data_key` - optional key to nest the response under
//! - `graphql_var_<name>` - a literal value, or an expression when prefixed with `=`

mod binding;
mod completion;
mod context;
mod entity;
mod headers;
mod source;

pub use binding::{Binding, VariableDirective, EXPRESSION_SENTINEL};
pub use completion::{nest_response, JobOutcome};
pub use context::{
    EvaluationContext, BPMN_PROCESS_ID_FIELD, ELEMENT_ID_FIELD, ELEMENT_INSTANCE_KEY_FIELD,
    KEY_FIELD, PROCESS_DEFINITION_VERSION_FIELD, PROCESS_INSTANCE_KEY_FIELD, PROCESS_KEY_FIELD,
    TASK_TYPE_FIELD, WORKFLOW_DEFINITION_VERSION_FIELD, WORKFLOW_INSTANCE_KEY_FIELD,
    WORKFLOW_KEY_FIELD,
};
pub use entity::Job;
pub use headers::{HeaderDirectives, DATA_KEY_HEADER, QUERY_HEADER, VARIABLE_HEADER_PREFIX};
#[cfg(test)]
pub use source::MockJobSource;
pub use source::{ActivateJobsRequest, JobSource, JobSourceError};

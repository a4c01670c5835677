//! Custom header conventions
//!
//! | Header | Meaning |
//! |---|---|
//! | `graphql_query` | GraphQL document source |
//! | `graphql_data_key` | optional key the response is nested under |
//! | `graphql_var_<name>` | binding directive for variable `<name>` |
//!
//! Any other header is ignored.

use std::collections::HashMap;

use super::binding::{Binding, VariableDirective};

pub const QUERY_HEADER: &str = "graphql_query";
pub const DATA_KEY_HEADER: &str = "graphql_data_key";
pub const VARIABLE_HEADER_PREFIX: &str = "graphql_var_";

/// Directives extracted from a job's custom headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderDirectives {
    query: Option<String>,
    data_key: Option<String>,
    variables: Vec<VariableDirective>,
}

impl HeaderDirectives {
    /// Classify every header. Variable directives are sorted by name.
    pub fn parse(headers: &HashMap<String, String>) -> Self {
        let mut directives = Self::default();

        for (key, value) in headers {
            match key.as_str() {
                QUERY_HEADER => directives.query = Some(value.clone()),
                DATA_KEY_HEADER => directives.data_key = Some(value.clone()),
                _ => {
                    if let Some(name) = variable_name(key) {
                        directives
                            .variables
                            .push(VariableDirective::new(name, Binding::parse(value)));
                    }
                }
            }
        }

        directives.variables.sort_by(|a, b| a.name.cmp(&b.name));
        directives
    }

    /// Query source, if one was declared and is not blank
    pub fn query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .filter(|query| !query.trim().is_empty())
    }

    /// Nesting key for the response, if declared and non-empty
    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn variables(&self) -> &[VariableDirective] {
        &self.variables
    }

    /// Number of directives that need the expression evaluator
    pub fn expression_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.binding.is_expression())
            .count()
    }
}

/// Variable name declared by a header key; empty suffixes declare nothing
fn variable_name(key: &str) -> Option<&str> {
    key.strip_prefix(VARIABLE_HEADER_PREFIX)
        .filter(|name| !name.is_empty())
}

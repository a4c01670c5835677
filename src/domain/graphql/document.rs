//! Parsed GraphQL documents

use graphql_parser::query::{parse_query, Definition, OperationDefinition};

use super::error::GraphqlError;

/// Kind of the operation(s) in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// A syntactically valid GraphQL document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDocument {
    source: String,
    operation_name: Option<String>,
    operations: Vec<OperationKind>,
}

impl QueryDocument {
    /// Parse and validate document source text
    pub fn parse(source: &str) -> Result<Self, GraphqlError> {
        let document = parse_query::<String>(source)
            .map_err(|e| GraphqlError::invalid_document(e.to_string()))?;

        let mut operations = Vec::new();
        let mut names = Vec::new();

        for definition in document.definitions {
            let (kind, name) = match definition {
                Definition::Operation(OperationDefinition::SelectionSet(_)) => {
                    (OperationKind::Query, None)
                }
                Definition::Operation(OperationDefinition::Query(q)) => {
                    (OperationKind::Query, q.name)
                }
                Definition::Operation(OperationDefinition::Mutation(m)) => {
                    (OperationKind::Mutation, m.name)
                }
                Definition::Operation(OperationDefinition::Subscription(s)) => {
                    (OperationKind::Subscription, s.name)
                }
                Definition::Fragment(_) => continue,
            };

            operations.push(kind);
            names.push(name);
        }

        if operations.is_empty() {
            return Err(GraphqlError::invalid_document(
                "document contains no operation",
            ));
        }

        // The name is only sent when it unambiguously identifies the operation
        let operation_name = match names.as_slice() {
            [Some(name)] => Some(name.clone()),
            _ => None,
        };

        Ok(Self {
            source: source.to_string(),
            operation_name,
            operations,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn operations(&self) -> &[OperationKind] {
        &self.operations
    }
}

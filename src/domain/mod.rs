//! Domain layer - Core business logic and entities

pub mod error;
pub mod expression;
pub mod graphql;
pub mod job;
pub mod translation;

pub use error::DomainError;
pub use expression::{Expression, ExpressionError, ExpressionEvaluator, FeelEvaluator};
pub use graphql::{GraphqlError, OperationKind, QueryDocument, QueryExecutor};
pub use job::{
    ActivateJobsRequest, Binding, EvaluationContext, HeaderDirectives, Job, JobOutcome, JobSource,
    JobSourceError, VariableDirective,
};
pub use translation::{JobStage, JobTranslator, OutboundRequest, TranslationError};

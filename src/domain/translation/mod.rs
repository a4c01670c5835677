//! Translation of jobs into GraphQL requests
//!
//! Per job: parse headers, parse the document, build the evaluation context,
//! resolve every variable binding, execute the request and shape the result.
//! Any error along the way fails the whole job.

mod error;
mod translator;

pub use error::TranslationError;
pub use translator::{JobStage, JobTranslator, OutboundRequest};

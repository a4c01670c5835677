//! CLI module for the Zeebe GraphQL worker
//!
//! Subcommands:
//! - `run`: poll the workflow engine and execute GraphQL jobs
//! - `eval`: evaluate a binding expression against a JSON context

pub mod eval;
pub mod run;

use clap::{Parser, Subcommand};

/// Zeebe GraphQL Worker - Executes GraphQL requests for workflow service tasks
#[derive(Parser)]
#[command(name = "zeebe-graphql-worker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the job worker
    Run,

    /// Evaluate an expression the way a `graphql_var_*` header would be
    Eval(eval::EvalArgs),
}

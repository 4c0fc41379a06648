//! Decision Workflow
//!
//! Runs one transaction through scoring, pattern retrieval and explanation,
//! in that order, and always hands back a `DecisionRecord`. A failure at any
//! stage ends the run with a `Failed` record that keeps the results produced
//! before it.

mod batch;
mod decision;
mod pipeline;

pub use batch::{run_batch, BatchSummary, HourlyBucket};
pub use decision::{
    Decision, DecisionRecord, FailedDecision, Stage, VerdictSource, FAILURE_EXPLANATION,
};
pub use pipeline::DecisionWorkflow;

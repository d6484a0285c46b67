//! ABOUTME: Agent Pipeline (C7) — Intent Gatherer, Intent Analyst, and
//! ABOUTME: Workflow Generator stages, each a single typed Agent Runtime call.

mod schemas;
mod stages;
mod types;

pub use stages::{run_intent_analyst, run_intent_gatherer, run_workflow_generator};
pub use types::{
    GeneratedWorkflow, IntentAnalystInput, IntentGathererInput, StructuredIntent, ValidatedIntent,
    WorkflowGeneratorInput,
};

//! ABOUTME: Command implementations — each is a thin wrapper over the same
//! ABOUTME: AgentManager/ExecutionEngine/WorkflowStorage calls the HTTP handlers make

use crate::cli::WorkflowAction;
use flowcraft_config::FlowcraftConfig;
use flowcraft_core::traits::{ExecutionEngine, TokenStore, WorkflowStorage};
use flowcraft_core::types::User;
use std::collections::HashMap;

pub async fn serve(config: &FlowcraftConfig) -> Result<(), Box<dyn std::error::Error>> {
    flowcraft_server::serve(config).await
}

pub async fn catalog_validate(config: &FlowcraftConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = flowcraft_server::build_state(config).await?;
    let catalog = state.agent_manager.get_catalog().await?;
    let action_count: usize = catalog.services.iter().map(|(_, schema)| schema.actions.len()).sum();
    println!(
        "catalog ok: {} service(s), {} action(s)",
        catalog.services.len(),
        action_count
    );
    Ok(())
}

pub async fn workflow(config: &FlowcraftConfig, action: WorkflowAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        WorkflowAction::List { user } => workflow_list(config, &user).await,
        WorkflowAction::Run { id, user, params, timezone } => {
            workflow_run(config, &id, &user, params, timezone).await
        }
    }
}

async fn workflow_list(config: &FlowcraftConfig, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let state = flowcraft_server::build_state(config).await?;
    let workflows = state.storage.list_user_workflows(user).await?;
    for workflow in &workflows {
        println!("{}\t{}", workflow.id, workflow.name);
    }
    if workflows.is_empty() {
        println!("(no workflows stored for user '{user}')");
    }
    Ok(())
}

async fn workflow_run(
    config: &FlowcraftConfig,
    id: &str,
    user_id: &str,
    params: Vec<(String, serde_json::Value)>,
    timezone: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = flowcraft_server::build_state(config).await?;
    let file = state.storage.get_workflow(user_id, id).await?;
    let token = state.tokens.get_google_token(user_id).await?;
    let user = User::new(user_id, format!("{user_id}@flowcraft.local"), user_id);
    let user_parameters: HashMap<String, serde_json::Value> = params.into_iter().collect();

    let plan = state
        .engine
        .prepare(&file.content, user_id, &user, &user_parameters, &token, timezone.as_deref())
        .await?;
    if !plan.is_valid() {
        for issue in &plan.validation_errors {
            eprintln!("validation error: {issue}");
        }
        return Err("workflow failed preparation".into());
    }

    let result = state.engine.execute(plan, &token).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

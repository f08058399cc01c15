//! Stack assembly — the application stack first, then one pipeline stack per
//! source repository, with the exported mapping threaded into the backend
//! pipeline only.

pub mod app;
pub mod pipeline;

use crate::core::config::DeployConfig;
use crate::core::context::NetworkContext;
use crate::core::template::Template;
use crate::core::types::EnvVarMap;

pub const BACKEND_REPO: &str = "task-list-api";
pub const FRONTEND_REPO: &str = "task-list-frontend";

/// One synthesized stack, ready to write out.
#[derive(Debug, Clone)]
pub struct SynthesizedStack {
    pub name: String,
    pub template: Template,
    pub fingerprint: String,
}

/// Construct and synthesize the full deployment plan. The application stack is
/// always built before either pipeline stack; its exported variables have no
/// consumer other than the backend deploy project.
pub fn assemble(config: &DeployConfig, context: &NetworkContext) -> Result<Vec<SynthesizedStack>, String> {
    let app = app::AppStack::new(config, context)?;
    let backend = pipeline::PipelineStack::new(
        config,
        context,
        "BackendPipeline",
        BACKEND_REPO,
        &app.deploy_variables,
    )?;
    let frontend = pipeline::PipelineStack::new(
        config,
        context,
        "FrontendPipeline",
        FRONTEND_REPO,
        &EnvVarMap::new(),
    )?;

    let mut stacks = Vec::new();
    for (name, template) in [
        (app::STACK_NAME.to_string(), app.synthesize()?),
        (backend.name.clone(), backend.synthesize()?),
        (frontend.name.clone(), frontend.synthesize()?),
    ] {
        let fingerprint = template.fingerprint()?;
        stacks.push(SynthesizedStack {
            name,
            template,
            fingerprint,
        });
    }
    Ok(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_plan() -> Vec<SynthesizedStack> {
        let config = DeployConfig::production();
        let context = NetworkContext::single(&config.vpc_lookup_tags, "vpc-0a1b2c3d4e5f67890");
        assemble(&config, &context).unwrap()
    }

    #[test]
    fn test_assemble_three_stacks_in_order() {
        let stacks = make_plan();
        let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["AppStack", "BackendPipeline", "FrontendPipeline"]);
    }

    #[test]
    fn test_assemble_deterministic() {
        let a: Vec<String> = make_plan().into_iter().map(|s| s.fingerprint).collect();
        let b: Vec<String> = make_plan().into_iter().map(|s| s.fingerprint).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pipelines_differ_only_by_repo_and_deploy_env() {
        let stacks = make_plan();
        let backend = stacks[1].template.to_yaml().unwrap();
        let frontend = stacks[2].template.to_yaml().unwrap();
        assert!(backend.contains("task-list-api"));
        assert!(!backend.contains("task-list-frontend"));
        assert!(frontend.contains("task-list-frontend"));
        // Only the backend deploy project carries the application mapping.
        assert!(backend.contains("ACCESS_TOKEN_SECRET"));
        assert!(!frontend.contains("ACCESS_TOKEN_SECRET"));
    }

    #[test]
    fn test_assemble_aborts_on_missing_vpc() {
        let config = DeployConfig::production();
        let result = assemble(&config, &NetworkContext::default());
        assert!(result.is_err());
    }
}

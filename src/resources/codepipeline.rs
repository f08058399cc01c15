//! CodePipeline descriptor — ordered, gated stages with one action each.
//!
//! A stage only starts after the previous stage's action succeeds; no retries
//! are configured, so a failed action terminates the run.

use serde::Serialize;

use crate::core::template::TemplateResource;

/// Named artifact handed between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact(pub String);

/// The single action inside a stage.
#[derive(Debug, Clone)]
pub enum Action {
    /// Pull a branch-pinned repository through a pre-authorized connection.
    CodeStarSource {
        action_name: String,
        connection_arn: String,
        owner: String,
        repo: String,
        branch: String,
        output: Artifact,
    },
    /// Run a build project against an input artifact.
    CodeBuild {
        action_name: String,
        project_name: String,
        input: Artifact,
    },
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::CodeStarSource { action_name, .. } => action_name,
            Action::CodeBuild { action_name, .. } => action_name,
        }
    }

    fn to_value(&self) -> serde_json::Value {
        match self {
            Action::CodeStarSource {
                action_name,
                connection_arn,
                owner,
                repo,
                branch,
                output,
            } => serde_json::json!({
                "Name": action_name,
                "ActionTypeId": {
                    "Category": "Source",
                    "Owner": "AWS",
                    "Provider": "CodeStarSourceConnection",
                    "Version": "1",
                },
                "Configuration": {
                    "ConnectionArn": connection_arn,
                    "FullRepositoryId": format!("{}/{}", owner, repo),
                    "BranchName": branch,
                },
                "OutputArtifacts": [{ "Name": output.0 }],
                "RunOrder": 1,
            }),
            Action::CodeBuild {
                action_name,
                project_name,
                input,
            } => serde_json::json!({
                "Name": action_name,
                "ActionTypeId": {
                    "Category": "Build",
                    "Owner": "AWS",
                    "Provider": "CodeBuild",
                    "Version": "1",
                },
                "Configuration": { "ProjectName": project_name },
                "InputArtifacts": [{ "Name": input.0 }],
                "RunOrder": 1,
            }),
        }
    }
}

/// One pipeline stage holding exactly one action.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub action: Action,
}

/// A three-stage pipeline: Source → Build → Deploy.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: String,
    pub role_arn: String,
    pub cross_account_keys: bool,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Construct and check the fixed stage contract.
    pub fn new(
        name: &str,
        role_arn: &str,
        stages: Vec<Stage>,
    ) -> Result<Self, String> {
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        if names != ["Source", "Build", "Deploy"] {
            return Err(format!(
                "pipeline '{}' must have stages Source, Build, Deploy; got [{}]",
                name,
                names.join(", ")
            ));
        }
        Ok(Self {
            name: name.to_string(),
            role_arn: role_arn.to_string(),
            cross_account_keys: false,
            stages,
        })
    }

    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct PipelineProperties {
            name: String,
            role_arn: String,
            stages: Vec<serde_json::Value>,
        }

        let stages = self
            .stages
            .iter()
            .map(|stage| {
                serde_json::json!({
                    "Name": stage.name,
                    "Actions": [stage.action.to_value()],
                })
            })
            .collect();

        let properties = PipelineProperties {
            name: self.name.clone(),
            role_arn: self.role_arn.clone(),
            stages,
        };
        Ok(TemplateResource {
            resource_type: "AWS::CodePipeline::Pipeline".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

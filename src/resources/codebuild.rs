//! CodeBuild descriptor — pipeline-attached build projects.

use serde::Serialize;

use crate::core::template::TemplateResource;
use crate::core::types::{EnvVarMap, EnvVarType};
use crate::resources::ec2::VpcRef;

pub const STANDARD_7_0_IMAGE: &str = "aws/codebuild/standard:7.0";
pub const COMPUTE_SMALL: &str = "BUILD_GENERAL1_SMALL";

/// A build project fed by a pipeline artifact. Commands live in an external
/// buildspec file within the source artifact; this descriptor only wires the
/// environment around them.
#[derive(Debug, Clone)]
pub struct BuildProject {
    pub name: String,
    /// Buildspec path, relative to the source repository root.
    pub buildspec: String,
    /// Elevated-privilege build environment (required for container builds).
    pub privileged: bool,
    pub build_image: String,
    pub compute_type: String,
    pub environment_variables: EnvVarMap,
    /// Run inside the looked-up network (deploy projects only).
    pub vpc: Option<VpcRef>,
    /// Service role handle attached to the project.
    pub role_arn: String,
}

impl BuildProject {
    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct EnvironmentVariable {
            name: String,
            #[serde(rename = "Type")]
            var_type: String,
            value: String,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Environment {
            compute_type: String,
            image: String,
            #[serde(rename = "Type")]
            environment_type: String,
            privileged_mode: bool,
            environment_variables: Vec<EnvironmentVariable>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Source {
            #[serde(rename = "Type")]
            source_type: String,
            build_spec: String,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Artifacts {
            #[serde(rename = "Type")]
            artifacts_type: String,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct VpcConfig {
            vpc_id: String,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct ProjectProperties {
            name: String,
            service_role: String,
            source: Source,
            artifacts: Artifacts,
            environment: Environment,
            #[serde(skip_serializing_if = "Option::is_none")]
            vpc_config: Option<VpcConfig>,
        }

        let environment_variables = self
            .environment_variables
            .iter()
            .map(|(name, var)| EnvironmentVariable {
                name: name.clone(),
                var_type: match var.var_type {
                    EnvVarType::Plaintext => "PLAINTEXT".to_string(),
                    EnvVarType::SecretsManager => "SECRETS_MANAGER".to_string(),
                },
                value: var.value.clone(),
            })
            .collect();

        let properties = ProjectProperties {
            name: self.name.clone(),
            service_role: self.role_arn.clone(),
            source: Source {
                source_type: "CODEPIPELINE".to_string(),
                build_spec: self.buildspec.clone(),
            },
            artifacts: Artifacts {
                artifacts_type: "CODEPIPELINE".to_string(),
            },
            environment: Environment {
                compute_type: self.compute_type.clone(),
                image: self.build_image.clone(),
                environment_type: "LINUX_CONTAINER".to_string(),
                privileged_mode: self.privileged,
                environment_variables,
            },
            vpc_config: self.vpc.as_ref().map(|vpc| VpcConfig {
                vpc_id: vpc.vpc_id.clone(),
            }),
        };
        Ok(TemplateResource {
            resource_type: "AWS::CodeBuild::Project".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

//! Pipeline stack — container registry plus a three-stage CI/CD pipeline,
//! instantiated once per source repository.

use indexmap::IndexMap;

use crate::core::config::DeployConfig;
use crate::core::context::NetworkContext;
use crate::core::template::Template;
use crate::core::types::{merge_variables, BuildEnvironmentVariable, EnvVarMap};
use crate::resources::codebuild::{BuildProject, COMPUTE_SMALL, STANDARD_7_0_IMAGE};
use crate::resources::codepipeline::{Action, Artifact, Pipeline, Stage};
use crate::resources::ecr::{split_repository_uri, Repository};
use crate::resources::iam::{PolicyDocument, PolicyStatement, Role, RolePrincipal};

/// Registry actions granted to build projects. Applies to all registries; the
/// policy is deliberately unscoped.
const ECR_ACCESS_ACTIONS: [&str; 9] = [
    "ecr:GetAuthorizationToken",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchCheckLayerAvailability",
    "ecr:BatchGetImage",
    "ecr:BatchDeleteImage",
    "ecr:PutImage",
    "ecr:InitiateLayerUpload",
    "ecr:UploadLayerPart",
    "ecr:CompleteLayerUpload",
];

/// Pipeline resource group for one source repository.
#[derive(Debug, Clone)]
pub struct PipelineStack {
    pub name: String,
    pub repository: Repository,
    pub build_role: Role,
    pub build_project: BuildProject,
    pub deploy_role: Role,
    pub deploy_project: BuildProject,
    pub pipeline_role: Role,
    pub pipeline: Pipeline,
}

impl PipelineStack {
    /// `deploy_variables` is merged into the deploy project's environment after
    /// the fixed keys; only the backend invocation passes a non-empty set.
    pub fn new(
        config: &DeployConfig,
        context: &NetworkContext,
        stack_name: &str,
        source_repo: &str,
        deploy_variables: &EnvVarMap,
    ) -> Result<Self, String> {
        let vpc = context.lookup_vpc(&config.vpc_lookup_tags)?;
        let repository = Repository::new(config, source_repo);

        let build_role = service_role(
            config,
            &format!("{}-build", source_repo),
            "codebuild.amazonaws.com",
            IndexMap::from([(
                "ecrAccessPolicy".to_string(),
                PolicyDocument::new(vec![PolicyStatement::allow(&ECR_ACCESS_ACTIONS, &["*"])]),
            )]),
        );

        let (registry, repo_path) = split_repository_uri(&repository.uri);
        let build_project = BuildProject {
            name: format!("{}-build", source_repo),
            buildspec: "files/build.yaml".to_string(),
            privileged: true,
            build_image: STANDARD_7_0_IMAGE.to_string(),
            compute_type: COMPUTE_SMALL.to_string(),
            environment_variables: IndexMap::from([
                (
                    "ECR_REPOSITORY_URI".to_string(),
                    BuildEnvironmentVariable::plaintext(repository.uri.clone()),
                ),
                (
                    "ECR_REGISTRY".to_string(),
                    BuildEnvironmentVariable::plaintext(registry),
                ),
                (
                    "ECR_REPOSITORY".to_string(),
                    BuildEnvironmentVariable::plaintext(repo_path),
                ),
            ]),
            vpc: None,
            role_arn: build_role.arn.clone(),
        };

        let deploy_role = service_role(
            config,
            &format!("{}-deploy", source_repo),
            "codebuild.amazonaws.com",
            IndexMap::from([(
                "eksDeployPolicy".to_string(),
                PolicyDocument::new(vec![PolicyStatement::allow(
                    &["eks:DescribeCluster"],
                    &[config.eks_cluster_arn.as_str()],
                )]),
            )]),
        );

        let fixed_deploy_variables: EnvVarMap = IndexMap::from([
            (
                "ECR_REPOSITORY_URI".to_string(),
                BuildEnvironmentVariable::plaintext(repository.uri.clone()),
            ),
            (
                "EKS_CLUSTER_NAME".to_string(),
                BuildEnvironmentVariable::plaintext(config.eks_cluster_name.clone()),
            ),
        ]);
        let deploy_project = BuildProject {
            name: format!("{}-deploy", source_repo),
            buildspec: "files/deploy.yaml".to_string(),
            privileged: true,
            build_image: STANDARD_7_0_IMAGE.to_string(),
            compute_type: COMPUTE_SMALL.to_string(),
            environment_variables: merge_variables(&fixed_deploy_variables, deploy_variables),
            vpc: Some(vpc),
            role_arn: deploy_role.arn.clone(),
        };

        let pipeline_role = service_role(
            config,
            &format!("{}-pipeline", source_repo),
            "codepipeline.amazonaws.com",
            IndexMap::from([(
                "pipelinePolicy".to_string(),
                PolicyDocument::new(vec![
                    PolicyStatement::allow(
                        &["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                        &["*"],
                    ),
                    PolicyStatement::allow(
                        &["codestar-connections:UseConnection"],
                        &[config.codestar_connection_arn.as_str()],
                    ),
                ]),
            )]),
        );

        let artifact = Artifact("SourceArtifact".to_string());
        let pipeline = Pipeline::new(
            &format!("{}-pipeline", source_repo),
            &pipeline_role.arn,
            vec![
                Stage {
                    name: "Source".to_string(),
                    action: Action::CodeStarSource {
                        action_name: "Source".to_string(),
                        connection_arn: config.codestar_connection_arn.clone(),
                        owner: config.source_repo_owner.clone(),
                        repo: source_repo.to_string(),
                        branch: config.source_repo_branch.clone(),
                        output: artifact.clone(),
                    },
                },
                Stage {
                    name: "Build".to_string(),
                    action: Action::CodeBuild {
                        action_name: "Build".to_string(),
                        project_name: build_project.name.clone(),
                        input: artifact.clone(),
                    },
                },
                Stage {
                    name: "Deploy".to_string(),
                    action: Action::CodeBuild {
                        action_name: "Deploy".to_string(),
                        project_name: deploy_project.name.clone(),
                        input: artifact,
                    },
                },
            ],
        )?;

        Ok(Self {
            name: stack_name.to_string(),
            repository,
            build_role,
            build_project,
            deploy_role,
            deploy_project,
            pipeline_role,
            pipeline,
        })
    }

    pub fn synthesize(&self) -> Result<Template, String> {
        let mut template = Template::new(format!(
            "CI/CD pipeline for {}",
            self.repository.name
        ));
        template.add_resource("ECRRepository", self.repository.to_resource()?)?;
        template.add_resource("ECRBuildRole", self.build_role.to_resource()?)?;
        template.add_resource("ECRBuild", self.build_project.to_resource()?)?;
        template.add_resource("EKSDeployRole", self.deploy_role.to_resource()?)?;
        template.add_resource("EKSDeploy", self.deploy_project.to_resource()?)?;
        template.add_resource("PipelineRole", self.pipeline_role.to_resource()?)?;
        template.add_resource("Pipeline", self.pipeline.to_resource()?)?;
        Ok(template)
    }
}

fn service_role(
    config: &DeployConfig,
    name: &str,
    service: &str,
    inline_policies: IndexMap<String, PolicyDocument>,
) -> Role {
    Role {
        name: name.to_string(),
        arn: config.role_arn(name),
        principal: RolePrincipal::Service(service.to_string()),
        inline_policies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::app::AppStack;

    fn prod_context(config: &DeployConfig) -> NetworkContext {
        NetworkContext::single(&config.vpc_lookup_tags, "vpc-0a1b2c3d4e5f67890")
    }

    fn make_frontend() -> PipelineStack {
        let config = DeployConfig::production();
        let context = prod_context(&config);
        PipelineStack::new(
            &config,
            &context,
            "FrontendPipeline",
            "task-list-frontend",
            &EnvVarMap::new(),
        )
        .unwrap()
    }

    fn make_backend() -> PipelineStack {
        let config = DeployConfig::production();
        let context = prod_context(&config);
        let app = AppStack::new(&config, &context).unwrap();
        PipelineStack::new(
            &config,
            &context,
            "BackendPipeline",
            "task-list-api",
            &app.deploy_variables,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_named_after_repo() {
        let stack = make_frontend();
        assert_eq!(stack.repository.name, "task-list-frontend");
        assert_eq!(
            stack.repository.uri,
            "436501147244.dkr.ecr.ap-southeast-2.amazonaws.com/task-list-frontend"
        );
    }

    #[test]
    fn test_build_env_derived_from_registry_address() {
        let stack = make_frontend();
        let vars = &stack.build_project.environment_variables;
        assert_eq!(vars.len(), 3);
        assert_eq!(
            vars["ECR_REPOSITORY_URI"].value,
            "436501147244.dkr.ecr.ap-southeast-2.amazonaws.com/task-list-frontend"
        );
        assert_eq!(
            vars["ECR_REGISTRY"].value,
            "436501147244.dkr.ecr.ap-southeast-2.amazonaws.com"
        );
        assert_eq!(vars["ECR_REPOSITORY"].value, "task-list-frontend");
    }

    #[test]
    fn test_build_project_environment() {
        let stack = make_frontend();
        assert!(stack.build_project.privileged);
        assert_eq!(stack.build_project.buildspec, "files/build.yaml");
        assert!(stack.build_project.vpc.is_none());
    }

    #[test]
    fn test_build_role_grants_all_registry_actions() {
        let stack = make_frontend();
        let doc = &stack.build_role.inline_policies["ecrAccessPolicy"];
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].actions.len(), 9);
        assert_eq!(doc.statements[0].resources, vec!["*"]);
        assert!(doc.statements[0]
            .actions
            .contains(&"ecr:CompleteLayerUpload".to_string()));
    }

    #[test]
    fn test_deploy_role_scoped_to_one_cluster() {
        let stack = make_frontend();
        let doc = &stack.deploy_role.inline_policies["eksDeployPolicy"];
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].actions, vec!["eks:DescribeCluster"]);
        assert_eq!(
            doc.statements[0].resources,
            vec!["arn:aws:eks:ap-southeast-2:436501147244:cluster/prod"]
        );
    }

    #[test]
    fn test_deploy_project_runs_in_vpc() {
        let stack = make_frontend();
        assert_eq!(
            stack.deploy_project.vpc.as_ref().unwrap().vpc_id,
            "vpc-0a1b2c3d4e5f67890"
        );
        assert_eq!(stack.deploy_project.buildspec, "files/deploy.yaml");
    }

    #[test]
    fn test_frontend_deploy_env_has_only_fixed_keys() {
        let stack = make_frontend();
        let keys: Vec<&str> = stack
            .deploy_project
            .environment_variables
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["ECR_REPOSITORY_URI", "EKS_CLUSTER_NAME"]);
        assert_eq!(
            stack.deploy_project.environment_variables["EKS_CLUSTER_NAME"].value,
            "prod"
        );
    }

    #[test]
    fn test_backend_deploy_env_superset() {
        let stack = make_backend();
        let vars = &stack.deploy_project.environment_variables;
        assert_eq!(vars.len(), 14);
        for key in [
            "ECR_REPOSITORY_URI",
            "EKS_CLUSTER_NAME",
            "NODE_ENV",
            "PORT",
            "DB_ADMIN_USER",
            "DB_ADMIN_PASSWORD",
            "DB_USER",
            "DB_PASSWORD",
            "DB_NAME",
            "DB_HOST",
            "DB_PORT",
            "ACCESS_TOKEN_SECRET",
            "REFRESH_TOKEN_SECRET",
            "APP_IAM_ROLE_ARN",
        ] {
            assert!(vars.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_pipeline_three_stages_one_action_each() {
        let stack = make_backend();
        let names: Vec<&str> = stack.pipeline.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Source", "Build", "Deploy"]);
        for stage in &stack.pipeline.stages {
            assert_eq!(stage.action.name(), stage.name);
        }
    }

    #[test]
    fn test_source_stage_wiring() {
        let stack = make_backend();
        match &stack.pipeline.stages[0].action {
            Action::CodeStarSource {
                connection_arn,
                owner,
                repo,
                branch,
                output,
                ..
            } => {
                assert!(connection_arn.starts_with("arn:aws:codestar-connections:"));
                assert_eq!(owner, "kevinchanaka");
                assert_eq!(repo, "task-list-api");
                assert_eq!(branch, "main");
                assert_eq!(output.0, "SourceArtifact");
            }
            other => panic!("expected source action, got {:?}", other),
        }
    }

    #[test]
    fn test_template_resource_set() {
        let template = make_backend().synthesize().unwrap();
        let ids: Vec<&str> = template.resources.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ECRRepository",
                "ECRBuildRole",
                "ECRBuild",
                "EKSDeployRole",
                "EKSDeploy",
                "PipelineRole",
                "Pipeline",
            ]
        );
    }

    #[test]
    fn test_construction_is_deterministic() {
        let a = make_backend().synthesize().unwrap().fingerprint().unwrap();
        let b = make_backend().synthesize().unwrap().fingerprint().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_failure_aborts_construction() {
        let config = DeployConfig::production();
        let result = PipelineStack::new(
            &config,
            &NetworkContext::default(),
            "FrontendPipeline",
            "task-list-frontend",
            &EnvVarMap::new(),
        );
        assert!(result.is_err());
    }
}

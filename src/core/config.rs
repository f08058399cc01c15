//! Deployment configuration — static, environment-specific identifiers.
//!
//! `DeployConfig` is constructed once (compiled-in production values, or loaded
//! from a YAML file) and passed explicitly into each stack constructor. There is
//! no ambient global lookup.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static deployment configuration for one target environment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeployConfig {
    /// AWS account id
    pub account: String,

    /// AWS region
    pub region: String,

    /// CodeStar connection ARN used by pipeline source stages
    pub codestar_connection_arn: String,

    /// Owner of the source repositories
    pub source_repo_owner: String,

    /// Branch tracked by pipeline source stages
    pub source_repo_branch: String,

    /// Logical database name
    pub database_name: String,

    /// Application database user (credential secret template key)
    pub database_user: String,

    /// Port the application listens on
    pub app_port: u16,

    /// Tag selector used to locate the existing VPC
    pub vpc_lookup_tags: IndexMap<String, String>,

    /// EKS cluster name
    pub eks_cluster_name: String,

    /// EKS cluster ARN (deploy policy scope)
    pub eks_cluster_arn: String,

    /// OIDC provider ARN for workload identity federation
    pub eks_oidc_provider_arn: String,
}

impl DeployConfig {
    /// The production environment this repository manages.
    pub fn production() -> Self {
        Self {
            account: "436501147244".to_string(),
            region: "ap-southeast-2".to_string(),
            codestar_connection_arn: "arn:aws:codestar-connections:ap-southeast-2:436501147244:connection/0e367578-3062-48ba-9a9a-b1ce675b7720".to_string(),
            source_repo_owner: "kevinchanaka".to_string(),
            source_repo_branch: "main".to_string(),
            database_name: "tasklist".to_string(),
            database_user: "task-list-user".to_string(),
            app_port: 3000,
            vpc_lookup_tags: IndexMap::from([(
                "aws:cloudformation:stack-name".to_string(),
                "eksctl-prod-cluster".to_string(),
            )]),
            eks_cluster_name: "prod".to_string(),
            eks_cluster_arn: "arn:aws:eks:ap-southeast-2:436501147244:cluster/prod".to_string(),
            eks_oidc_provider_arn: "arn:aws:iam::436501147244:oidc-provider/oidc.eks.ap-southeast-2.amazonaws.com/id/5B2AE7525B2B4B5835ACE1A1F9BD8EAF".to_string(),
        }
    }

    /// Load a configuration override from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| format!("invalid config {}: {}", path.display(), e))
    }

    /// Deterministic secret locator for a named secret within a stack.
    pub fn secret_arn(&self, stack: &str, name: &str) -> String {
        format!(
            "arn:aws:secretsmanager:{}:{}:secret:{}/{}",
            self.region, self.account, stack, name
        )
    }

    /// Deterministic role locator for a named IAM role.
    pub fn role_arn(&self, name: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account, name)
    }

    /// Full address of a container registry named after a source repository.
    pub fn repository_uri(&self, repo: &str) -> String {
        format!("{}.dkr.ecr.{}.amazonaws.com/{}", self.account, self.region, repo)
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn require(errors: &mut Vec<ValidationError>, ok: bool, message: &str) {
    if !ok {
        errors.push(ValidationError {
            message: message.to_string(),
        });
    }
}

/// Validate structural constraints on a config. Returns a list of errors
/// (empty = valid).
pub fn validate_config(config: &DeployConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    require(
        &mut errors,
        config.account.len() == 12 && config.account.chars().all(|c| c.is_ascii_digit()),
        "account must be a 12-digit AWS account id",
    );
    require(&mut errors, !config.region.is_empty(), "region must not be empty");
    require(
        &mut errors,
        config.codestar_connection_arn.starts_with("arn:"),
        "codestar_connection_arn must be an ARN",
    );
    require(
        &mut errors,
        !config.source_repo_owner.is_empty(),
        "source_repo_owner must not be empty",
    );
    require(
        &mut errors,
        !config.source_repo_branch.is_empty(),
        "source_repo_branch must not be empty",
    );
    require(
        &mut errors,
        !config.database_name.is_empty(),
        "database_name must not be empty",
    );
    require(
        &mut errors,
        !config.database_user.is_empty(),
        "database_user must not be empty",
    );
    require(&mut errors, config.app_port != 0, "app_port must be non-zero");
    require(
        &mut errors,
        !config.vpc_lookup_tags.is_empty(),
        "vpc_lookup_tags must name at least one tag",
    );
    require(
        &mut errors,
        config.eks_cluster_arn.starts_with("arn:"),
        "eks_cluster_arn must be an ARN",
    );
    // A provider ARN without a '/' still synthesizes (the suffix parse degrades
    // to the whole string) but the resulting trust condition keys are wrong.
    require(
        &mut errors,
        config.eks_oidc_provider_arn.contains('/'),
        "eks_oidc_provider_arn has no '/' separator; trust condition keys would be malformed",
    );

    errors
}

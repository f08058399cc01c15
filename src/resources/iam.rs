//! IAM descriptors — policy statements, policy documents, and roles.
//!
//! Roles are either service roles (assumed by an AWS service principal) or
//! federated roles trusting an OIDC provider with claim-match conditions.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::template::TemplateResource;

/// Statement effect. Everything this repository declares is an allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// One policy statement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|s| s.to_string()).collect(),
            resources: resources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A versioned policy document.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: "2012-10-17".to_string(),
            statements,
        }
    }
}

/// Who may assume a role.
#[derive(Debug, Clone)]
pub enum RolePrincipal {
    /// An AWS service, e.g. `codebuild.amazonaws.com`.
    Service(String),
    /// An OIDC identity provider, gated on exact claim matches.
    Federated {
        provider_arn: String,
        /// Claim-match key → required value (`StringEquals` condition).
        conditions: IndexMap<String, String>,
    },
}

/// An IAM role with inline policies. The handle (`arn`) is what dependents hold.
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub arn: String,
    pub principal: RolePrincipal,
    pub inline_policies: IndexMap<String, PolicyDocument>,
}

/// Derive the provider string from an OIDC provider locator: everything after
/// its first `/`. A locator without a `/` degrades to the whole string, which
/// produces wrong claim keys downstream; intent for that input is unspecified
/// and the behavior is kept as-is.
pub fn oidc_provider_suffix(provider_arn: &str) -> &str {
    match provider_arn.find('/') {
        Some(i) => &provider_arn[i + 1..],
        None => provider_arn,
    }
}

impl Role {
    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        let assume_statement = match &self.principal {
            RolePrincipal::Service(service) => serde_json::json!({
                "Effect": "Allow",
                "Principal": { "Service": service },
                "Action": "sts:AssumeRole",
            }),
            RolePrincipal::Federated {
                provider_arn,
                conditions,
            } => serde_json::json!({
                "Effect": "Allow",
                "Principal": { "Federated": provider_arn },
                "Action": "sts:AssumeRoleWithWebIdentity",
                "Condition": { "StringEquals": conditions },
            }),
        };

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct InlinePolicy {
            policy_name: String,
            policy_document: serde_json::Value,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct RoleProperties {
            role_name: String,
            assume_role_policy_document: serde_json::Value,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            policies: Vec<InlinePolicy>,
        }

        let policies = self
            .inline_policies
            .iter()
            .map(|(name, doc)| {
                Ok(InlinePolicy {
                    policy_name: name.clone(),
                    policy_document: serde_json::to_value(doc)
                        .map_err(|e| format!("serialize error: {}", e))?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        let properties = RoleProperties {
            role_name: self.name.clone(),
            assume_role_policy_document: serde_json::json!({
                "Version": "2012-10-17",
                "Statement": [assume_statement],
            }),
            policies,
        };
        Ok(TemplateResource {
            resource_type: "AWS::IAM::Role".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

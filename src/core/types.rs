//! Build-time environment variables — the mapping handed from the application
//! stack to the pipeline stacks.
//!
//! A variable is either a literal value or a reference into a secret, resolved
//! by the build engine at execution time. Secret values are always carried by
//! locator, never inlined.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the build engine resolves a variable's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvVarType {
    /// Value is used verbatim.
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
    /// Value is a secret locator, optionally suffixed with `:json-key`.
    #[serde(rename = "SECRETS_MANAGER")]
    SecretsManager,
}

/// One build-time environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironmentVariable {
    #[serde(rename = "type")]
    pub var_type: EnvVarType,
    pub value: String,
}

impl BuildEnvironmentVariable {
    /// A literal value.
    pub fn plaintext(value: impl Into<String>) -> Self {
        Self {
            var_type: EnvVarType::Plaintext,
            value: value.into(),
        }
    }

    /// A reference to a whole secret.
    pub fn secret(arn: impl Into<String>) -> Self {
        Self {
            var_type: EnvVarType::SecretsManager,
            value: arn.into(),
        }
    }

    /// A reference to one JSON field of a secret.
    pub fn secret_field(arn: &str, field: &str) -> Self {
        Self {
            var_type: EnvVarType::SecretsManager,
            value: format!("{}:{}", arn, field),
        }
    }
}

/// Ordered variable-name → value mapping.
pub type EnvVarMap = IndexMap<String, BuildEnvironmentVariable>;

/// Merge two variable mappings. Entries from `extra` are applied after `base`,
/// so on key collision the `extra` value wins.
pub fn merge_variables(base: &EnvVarMap, extra: &EnvVarMap) -> EnvVarMap {
    let mut merged = base.clone();
    for (name, var) in extra {
        merged.insert(name.clone(), var.clone());
    }
    merged
}

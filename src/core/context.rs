//! Network lookup context — resolves VPC tag selectors without calling AWS.
//!
//! Mirrors a cached-lookup context file: a mapping from `key=value` tag
//! selectors to VPC ids, maintained alongside the repository. A selector with
//! no entry is fatal; synthesis aborts before any template is produced.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::resources::ec2::VpcRef;

/// Cached VPC lookup results keyed by tag selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkContext {
    /// `"key=value,key2=value2"` selector → VPC id
    #[serde(default)]
    pub vpcs: IndexMap<String, String>,
}

impl NetworkContext {
    /// Load a context file from disk.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| format!("invalid context {}: {}", path.display(), e))
    }

    /// Context with a single cached lookup result.
    pub fn single(tags: &IndexMap<String, String>, vpc_id: &str) -> Self {
        Self {
            vpcs: IndexMap::from([(selector_key(tags), vpc_id.to_string())]),
        }
    }

    /// Resolve a tag selector to a VPC handle.
    pub fn lookup_vpc(&self, tags: &IndexMap<String, String>) -> Result<VpcRef, String> {
        let key = selector_key(tags);
        self.vpcs
            .get(&key)
            .map(|id| VpcRef { vpc_id: id.clone() })
            .ok_or_else(|| format!("no VPC matches tags [{}]; refresh the lookup context", key))
    }
}

/// Canonical selector key for a tag set: `key=value` pairs joined with `,`,
/// sorted for stability across config orderings.
pub fn selector_key(tags: &IndexMap<String, String>) -> String {
    let mut pairs: Vec<String> = tags.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    pairs.join(",")
}

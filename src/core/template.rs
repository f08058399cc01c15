//! Template synthesis — deterministic CloudFormation output with BLAKE3
//! fingerprints and atomic writes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One declared resource inside a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties")]
    pub properties: serde_yaml_ng::Value,
}

/// A synthesized CloudFormation template for one stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description")]
    pub description: String,

    /// Logical id → resource, in declaration order.
    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, TemplateResource>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: "2010-09-09".to_string(),
            description: description.into(),
            resources: IndexMap::new(),
        }
    }

    /// Declare a resource under a logical id. Duplicate ids are a construction
    /// bug, not a provider-side concern.
    pub fn add_resource(
        &mut self,
        logical_id: &str,
        resource: TemplateResource,
    ) -> Result<(), String> {
        if self.resources.contains_key(logical_id) {
            return Err(format!("duplicate logical id '{}'", logical_id));
        }
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    /// Render to YAML. Resource order is declaration order, so output is
    /// byte-stable across runs.
    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml_ng::to_string(self).map_err(|e| format!("serialize error: {}", e))
    }

    /// BLAKE3 fingerprint of the rendered template.
    pub fn fingerprint(&self) -> Result<String, String> {
        Ok(hash_string(&self.to_yaml()?))
    }
}

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Output path for a stack's template within the output directory.
pub fn template_path(out_dir: &Path, stack: &str) -> PathBuf {
    out_dir.join(format!("{}.template.yaml", stack))
}

/// Write a template atomically (write to temp, then rename).
pub fn write_template(out_dir: &Path, stack: &str, template: &Template) -> Result<PathBuf, String> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("cannot create dir {}: {}", out_dir.display(), e))?;

    let yaml = template.to_yaml()?;
    let path = template_path(out_dir, stack);
    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, &yaml)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, &path)
        .map_err(|e| format!("cannot rename {} → {}: {}", tmp_path.display(), path.display(), e))?;

    Ok(path)
}

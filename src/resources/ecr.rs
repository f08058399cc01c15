//! ECR descriptor — one container registry per source repository.

use serde::Serialize;

use crate::core::config::DeployConfig;
use crate::core::template::TemplateResource;

/// A container registry named after its source repository. The handle (`uri`)
/// is what dependents hold.
#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub uri: String,
}

impl Repository {
    pub fn new(config: &DeployConfig, name: &str) -> Self {
        Self {
            name: name.to_string(),
            uri: config.repository_uri(name),
        }
    }

    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct RepositoryProperties {
            repository_name: String,
        }

        Ok(TemplateResource {
            resource_type: "AWS::ECR::Repository".to_string(),
            properties: serde_yaml_ng::to_value(RepositoryProperties {
                repository_name: self.name.clone(),
            })
            .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

/// Split a registry address once on its first `/`: the portion before is the
/// registry host, the portion after is the repository path.
pub fn split_repository_uri(uri: &str) -> (&str, &str) {
    match uri.split_once('/') {
        Some((registry, repository)) => (registry, repository),
        None => (uri, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_uri() {
        let repo = Repository::new(&DeployConfig::production(), "task-list-api");
        assert_eq!(
            repo.uri,
            "436501147244.dkr.ecr.ap-southeast-2.amazonaws.com/task-list-api"
        );
    }

    #[test]
    fn test_split_uri() {
        let (registry, repository) =
            split_repository_uri("436501147244.dkr.ecr.ap-southeast-2.amazonaws.com/task-list-api");
        assert_eq!(registry, "436501147244.dkr.ecr.ap-southeast-2.amazonaws.com");
        assert_eq!(repository, "task-list-api");
    }

    #[test]
    fn test_split_uri_first_slash_only() {
        let (registry, repository) = split_repository_uri("host/a/b");
        assert_eq!(registry, "host");
        assert_eq!(repository, "a/b");
    }

    #[test]
    fn test_split_uri_without_slash() {
        let (registry, repository) = split_repository_uri("host");
        assert_eq!(registry, "host");
        assert_eq!(repository, "");
    }

    proptest::proptest! {
        #[test]
        fn prop_split_rejoins_to_input(host in "[a-z0-9.]{1,20}", path in "[a-z0-9/-]{0,20}") {
            let uri = format!("{}/{}", host, path);
            let (registry, repository) = split_repository_uri(&uri);
            proptest::prop_assert_eq!(registry, host.as_str());
            proptest::prop_assert_eq!(repository, path.as_str());
            proptest::prop_assert_eq!(format!("{}/{}", registry, repository), uri);
        }
    }

    #[test]
    fn test_repository_resource_shape() {
        let resource = Repository::new(&DeployConfig::production(), "task-list-frontend")
            .to_resource()
            .unwrap();
        assert_eq!(resource.resource_type, "AWS::ECR::Repository");
        let yaml = serde_yaml_ng::to_string(&resource.properties).unwrap();
        assert!(yaml.contains("RepositoryName: task-list-frontend"));
    }
}

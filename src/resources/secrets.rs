//! Secrets Manager descriptors — generated credential material, consumed by
//! locator only.

use serde::Serialize;

use crate::core::config::DeployConfig;
use crate::core::template::TemplateResource;

/// Generation policy for a secret's value.
#[derive(Debug, Clone)]
pub struct GenerateStringOptions {
    pub exclude_punctuation: bool,
    pub password_length: u32,
    /// JSON key to receive the generated value (template-shaped secrets only).
    pub generate_string_key: Option<String>,
    /// Fixed JSON template the generated key is merged into.
    pub secret_string_template: Option<String>,
}

/// A provider-managed secret. The handle (`arn`) is what dependents hold.
#[derive(Debug, Clone)]
pub struct Secret {
    pub name: String,
    pub arn: String,
    pub generate: GenerateStringOptions,
}

impl Secret {
    /// A standalone token secret: 50 generated characters, no punctuation.
    pub fn token(config: &DeployConfig, stack: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            arn: config.secret_arn(stack, name),
            generate: GenerateStringOptions {
                exclude_punctuation: true,
                password_length: 50,
                generate_string_key: None,
                secret_string_template: None,
            },
        }
    }

    /// A credential-shaped secret: fixed `username`, generated `password`.
    pub fn credentials(
        config: &DeployConfig,
        stack: &str,
        name: &str,
        username: &str,
    ) -> Result<Self, String> {
        let template = serde_json::to_string(&serde_json::json!({ "username": username }))
            .map_err(|e| format!("serialize error: {}", e))?;
        Ok(Self {
            name: name.to_string(),
            arn: config.secret_arn(stack, name),
            generate: GenerateStringOptions {
                exclude_punctuation: true,
                password_length: 50,
                generate_string_key: Some("password".to_string()),
                secret_string_template: Some(template),
            },
        })
    }

    /// Locator for one JSON field of this secret, in `arn:field` form.
    pub fn field(&self, name: &str) -> String {
        format!("{}:{}", self.arn, name)
    }

    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct GenerateSecretString {
            exclude_punctuation: bool,
            password_length: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            generate_string_key: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            secret_string_template: Option<String>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct SecretProperties {
            name: String,
            generate_secret_string: GenerateSecretString,
        }

        let properties = SecretProperties {
            name: self.name.clone(),
            generate_secret_string: GenerateSecretString {
                exclude_punctuation: self.generate.exclude_punctuation,
                password_length: self.generate.password_length,
                generate_string_key: self.generate.generate_string_key.clone(),
                secret_string_template: self.generate.secret_string_template.clone(),
            },
        };
        Ok(TemplateResource {
            resource_type: "AWS::SecretsManager::Secret".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

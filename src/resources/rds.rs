//! RDS descriptor — the managed relational database instance.

use serde::Serialize;

use crate::core::template::TemplateResource;
use crate::resources::ec2::VpcRef;

/// A managed database instance. Created once, long-lived; this code only reads
/// its credential secret after creation.
#[derive(Debug, Clone)]
pub struct DatabaseInstance {
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    /// Allocated storage in GiB.
    pub allocated_storage: u32,
    pub vpc: VpcRef,
    /// Locator of the admin credential secret attached to the instance.
    pub admin_secret_arn: String,
    /// Logical id of the security group guarding the instance.
    pub security_group_id: String,
}

impl DatabaseInstance {
    /// The task-list database: MySQL 8.0.35 on a burstable micro instance.
    pub fn mysql_micro(vpc: VpcRef, security_group_id: &str, admin_secret_arn: &str) -> Self {
        Self {
            engine: "mysql".to_string(),
            engine_version: "8.0.35".to_string(),
            instance_class: "db.t3.micro".to_string(),
            allocated_storage: 5,
            vpc,
            admin_secret_arn: admin_secret_arn.to_string(),
            security_group_id: security_group_id.to_string(),
        }
    }

    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct InstanceProperties {
            engine: String,
            engine_version: String,
            #[serde(rename = "DBInstanceClass")]
            db_instance_class: String,
            allocated_storage: String,
            #[serde(rename = "VPCSecurityGroups")]
            vpc_security_groups: Vec<serde_json::Value>,
            publicly_accessible: bool,
            master_username: String,
            master_user_password: String,
        }

        // Credentials come from the admin secret via dynamic references; the
        // template never carries plaintext values.
        let properties = InstanceProperties {
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            db_instance_class: self.instance_class.clone(),
            allocated_storage: self.allocated_storage.to_string(),
            vpc_security_groups: vec![serde_json::json!({
                "Fn::GetAtt": [self.security_group_id, "GroupId"],
            })],
            publicly_accessible: false,
            master_username: format!(
                "{{{{resolve:secretsmanager:{}:SecretString:username}}}}",
                self.admin_secret_arn
            ),
            master_user_password: format!(
                "{{{{resolve:secretsmanager:{}:SecretString:password}}}}",
                self.admin_secret_arn
            ),
        };
        Ok(TemplateResource {
            resource_type: "AWS::RDS::DBInstance".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_instance() -> DatabaseInstance {
        DatabaseInstance::mysql_micro(
            VpcRef {
                vpc_id: "vpc-123".to_string(),
            },
            "DatabaseSecurityGroup",
            "arn:aws:secretsmanager:ap-southeast-2:436501147244:secret:AppStack/DatabaseAdminCredentials",
        )
    }

    #[test]
    fn test_engine_and_sizing() {
        let db = make_instance();
        assert_eq!(db.engine, "mysql");
        assert_eq!(db.engine_version, "8.0.35");
        assert_eq!(db.instance_class, "db.t3.micro");
        assert_eq!(db.allocated_storage, 5);
    }

    #[test]
    fn test_instance_resource_shape() {
        let resource = make_instance().to_resource().unwrap();
        assert_eq!(resource.resource_type, "AWS::RDS::DBInstance");
        let yaml = serde_yaml_ng::to_string(&resource.properties).unwrap();
        assert!(yaml.contains("Engine: mysql"));
        assert!(yaml.contains("EngineVersion: 8.0.35"));
        assert!(yaml.contains("DBInstanceClass: db.t3.micro"));
        assert!(yaml.contains("AllocatedStorage: '5'"));
        assert!(yaml.contains("PubliclyAccessible: false"));
        assert!(yaml.contains("DatabaseSecurityGroup"));
    }

    #[test]
    fn test_credentials_are_dynamic_references() {
        let resource = make_instance().to_resource().unwrap();
        let yaml = serde_yaml_ng::to_string(&resource.properties).unwrap();
        assert!(yaml.contains("{{resolve:secretsmanager:"));
        assert!(yaml.contains(":SecretString:username}}"));
        assert!(yaml.contains(":SecretString:password}}"));
    }
}

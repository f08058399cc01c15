//! Application stack — database, secrets, federated role, and the exported
//! deploy-variable mapping.

use indexmap::IndexMap;

use crate::core::config::DeployConfig;
use crate::core::context::NetworkContext;
use crate::core::template::Template;
use crate::core::types::{BuildEnvironmentVariable, EnvVarMap};
use crate::resources::ec2::{IngressRule, SecurityGroup};
use crate::resources::iam::{
    oidc_provider_suffix, PolicyDocument, PolicyStatement, Role, RolePrincipal,
};
use crate::resources::rds::DatabaseInstance;
use crate::resources::secrets::Secret;

pub const STACK_NAME: &str = "AppStack";

/// Address range allowed to reach the database, and nothing else. Fixed by
/// policy, not configurable.
const DATABASE_INGRESS_CIDR: &str = "192.168.0.0/16";
const DATABASE_PORT: u16 = 3306;

const API_SERVICE_ACCOUNT: &str = "system:serviceaccount:task-list:task-list-api";
const STS_AUDIENCE: &str = "sts.amazonaws.com";

/// Application resource group. Constructed before any pipeline stack; its
/// `deploy_variables` mapping is the only value handed onward.
#[derive(Debug, Clone)]
pub struct AppStack {
    pub security_group: SecurityGroup,
    pub database: DatabaseInstance,
    pub access_token_secret: Secret,
    pub refresh_token_secret: Secret,
    pub database_user_credentials: Secret,
    pub database_admin_credentials: Secret,
    pub api_role: Role,
    /// Exported deploy-time environment variables, keyed by fixed names.
    pub deploy_variables: EnvVarMap,
}

impl AppStack {
    pub fn new(config: &DeployConfig, context: &NetworkContext) -> Result<Self, String> {
        let vpc = context.lookup_vpc(&config.vpc_lookup_tags)?;

        let security_group = SecurityGroup {
            description: "task-list database ingress".to_string(),
            vpc: vpc.clone(),
            ingress: vec![IngressRule {
                cidr: DATABASE_INGRESS_CIDR.to_string(),
                port: DATABASE_PORT,
            }],
            allow_all_outbound: true,
        };

        let access_token_secret = Secret::token(config, STACK_NAME, "AccessTokenSecret");
        let refresh_token_secret = Secret::token(config, STACK_NAME, "RefreshTokenSecret");
        let database_user_credentials = Secret::credentials(
            config,
            STACK_NAME,
            "DatabaseUserCredentials",
            &config.database_user,
        )?;
        // Admin credentials attached to the instance; host and port fields are
        // filled in by the provider on attachment.
        let database_admin_credentials =
            Secret::credentials(config, STACK_NAME, "DatabaseAdminCredentials", "admin")?;

        let database = DatabaseInstance::mysql_micro(
            vpc,
            "DatabaseSecurityGroup",
            &database_admin_credentials.arn,
        );

        let provider = oidc_provider_suffix(&config.eks_oidc_provider_arn);
        let api_role = Role {
            name: "task-list-api".to_string(),
            arn: config.role_arn("task-list-api"),
            principal: RolePrincipal::Federated {
                provider_arn: config.eks_oidc_provider_arn.clone(),
                conditions: IndexMap::from([
                    (format!("{}:sub", provider), API_SERVICE_ACCOUNT.to_string()),
                    (format!("{}:aud", provider), STS_AUDIENCE.to_string()),
                ]),
            },
            inline_policies: IndexMap::from([(
                "taskListApiPolicy".to_string(),
                PolicyDocument::new(vec![PolicyStatement::allow(
                    &["cognito-idp:AdminInitiateAuth", "cognito-idp:AdminGetUser"],
                    &["*"],
                )]),
            )]),
        };

        let deploy_variables = export_variables(
            config,
            &database_admin_credentials,
            &database_user_credentials,
            &access_token_secret,
            &refresh_token_secret,
            &api_role,
        );

        Ok(Self {
            security_group,
            database,
            access_token_secret,
            refresh_token_secret,
            database_user_credentials,
            database_admin_credentials,
            api_role,
            deploy_variables,
        })
    }

    /// Render the stack's template. Logical id order is declaration order.
    pub fn synthesize(&self) -> Result<Template, String> {
        let mut template = Template::new("task-list application resources");
        template.add_resource("DatabaseSecurityGroup", self.security_group.to_resource()?)?;
        template.add_resource(
            "DatabaseAdminCredentials",
            self.database_admin_credentials.to_resource()?,
        )?;
        template.add_resource("Database", self.database.to_resource()?)?;
        template.add_resource("AccessTokenSecret", self.access_token_secret.to_resource()?)?;
        template.add_resource(
            "RefreshTokenSecret",
            self.refresh_token_secret.to_resource()?,
        )?;
        template.add_resource(
            "DatabaseUserCredentials",
            self.database_user_credentials.to_resource()?,
        )?;
        template.add_resource("TaskListApiRole", self.api_role.to_resource()?)?;
        Ok(template)
    }
}

/// Build the twelve-key exported mapping.
fn export_variables(
    config: &DeployConfig,
    admin: &Secret,
    user: &Secret,
    access_token: &Secret,
    refresh_token: &Secret,
    api_role: &Role,
) -> EnvVarMap {
    IndexMap::from([
        (
            "NODE_ENV".to_string(),
            BuildEnvironmentVariable::plaintext("production"),
        ),
        (
            "PORT".to_string(),
            BuildEnvironmentVariable::plaintext(config.app_port.to_string()),
        ),
        (
            "DB_ADMIN_USER".to_string(),
            BuildEnvironmentVariable::secret(admin.field("username")),
        ),
        (
            "DB_ADMIN_PASSWORD".to_string(),
            BuildEnvironmentVariable::secret(admin.field("password")),
        ),
        (
            "DB_USER".to_string(),
            BuildEnvironmentVariable::secret(user.field("username")),
        ),
        (
            "DB_PASSWORD".to_string(),
            BuildEnvironmentVariable::secret(user.field("password")),
        ),
        (
            "DB_NAME".to_string(),
            BuildEnvironmentVariable::plaintext(config.database_name.clone()),
        ),
        (
            "DB_HOST".to_string(),
            BuildEnvironmentVariable::secret(admin.field("host")),
        ),
        (
            "DB_PORT".to_string(),
            BuildEnvironmentVariable::secret(admin.field("port")),
        ),
        (
            "ACCESS_TOKEN_SECRET".to_string(),
            BuildEnvironmentVariable::secret(access_token.arn.clone()),
        ),
        (
            "REFRESH_TOKEN_SECRET".to_string(),
            BuildEnvironmentVariable::secret(refresh_token.arn.clone()),
        ),
        (
            "APP_IAM_ROLE_ARN".to_string(),
            BuildEnvironmentVariable::plaintext(api_role.arn.clone()),
        ),
    ])
}

//! EC2 networking descriptors — VPC handles and security groups.

use serde::Serialize;

use crate::core::template::TemplateResource;

/// Opaque handle to an externally existing VPC, obtained by tag lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcRef {
    pub vpc_id: String,
}

/// One inbound rule: a single address range on a single TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub cidr: String,
    pub port: u16,
}

/// A security group attached to a looked-up VPC.
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    pub description: String,
    pub vpc: VpcRef,
    pub ingress: Vec<IngressRule>,
    pub allow_all_outbound: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IngressProperties {
    ip_protocol: String,
    cidr_ip: String,
    from_port: u16,
    to_port: u16,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EgressProperties {
    ip_protocol: String,
    cidr_ip: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupProperties {
    group_description: String,
    vpc_id: String,
    security_group_ingress: Vec<IngressProperties>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    security_group_egress: Vec<EgressProperties>,
}

impl SecurityGroup {
    pub fn to_resource(&self) -> Result<TemplateResource, String> {
        let properties = SecurityGroupProperties {
            group_description: self.description.clone(),
            vpc_id: self.vpc.vpc_id.clone(),
            security_group_ingress: self
                .ingress
                .iter()
                .map(|r| IngressProperties {
                    ip_protocol: "tcp".to_string(),
                    cidr_ip: r.cidr.clone(),
                    from_port: r.port,
                    to_port: r.port,
                })
                .collect(),
            security_group_egress: if self.allow_all_outbound {
                vec![EgressProperties {
                    ip_protocol: "-1".to_string(),
                    cidr_ip: "0.0.0.0/0".to_string(),
                }]
            } else {
                Vec::new()
            },
        };
        Ok(TemplateResource {
            resource_type: "AWS::EC2::SecurityGroup".to_string(),
            properties: serde_yaml_ng::to_value(properties)
                .map_err(|e| format!("serialize error: {}", e))?,
        })
    }
}

//! Resource descriptors — value-like declarations of the AWS resources the
//! stacks compose. Each descriptor renders its CloudFormation form.

pub mod codebuild;
pub mod codepipeline;
pub mod ec2;
pub mod ecr;
pub mod iam;
pub mod rds;
pub mod secrets;

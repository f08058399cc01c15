//! tasklist-infra — declarative AWS infrastructure for the task-list platform.
//!
//! Evaluates a fixed resource graph (database, secrets, federated IAM role,
//! container registries, CI/CD pipelines) and synthesizes one deterministic
//! CloudFormation template per stack. Construction is offline; applying the
//! templates belongs to the deployment engine.

pub mod cli;
pub mod core;
pub mod resources;
pub mod stacks;

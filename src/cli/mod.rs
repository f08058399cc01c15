//! CLI subcommands — synth, validate, list, schema.

use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::core::{config, context, template};
use crate::stacks;

/// Buildspec files the pipelines reference. Owned by the source repositories'
/// build engine; this tool only checks they exist.
const BUILDSPEC_FILES: [&str; 2] = ["files/build.yaml", "files/deploy.yaml"];

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize all stack templates into the output directory
    Synth {
        /// Optional config override file (defaults to the production config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// VPC lookup context file
        #[arg(long, default_value = "context.yaml")]
        context: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Validate the configuration, lookup context, and buildspec files
    Validate {
        /// Optional config override file (defaults to the production config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// VPC lookup context file
        #[arg(long, default_value = "context.yaml")]
        context: PathBuf,
    },

    /// List stacks and the resources each declares
    List {
        /// Optional config override file (defaults to the production config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// VPC lookup context file
        #[arg(long, default_value = "context.yaml")]
        context: PathBuf,
    },

    /// Print the JSON schema for the configuration file
    Schema,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Synth {
            config,
            context,
            out_dir,
        } => cmd_synth(config.as_deref(), &context, &out_dir),
        Commands::Validate { config, context } => cmd_validate(config.as_deref(), &context),
        Commands::List { config, context } => cmd_list(config.as_deref(), &context),
        Commands::Schema => cmd_schema(),
    }
}

/// Load the deployment config: file override if given, production otherwise.
fn load_config(path: Option<&Path>) -> Result<config::DeployConfig, String> {
    let cfg = match path {
        Some(p) => config::DeployConfig::from_file(p)?,
        None => config::DeployConfig::production(),
    };
    let errors = config::validate_config(&cfg);
    if errors.is_empty() {
        return Ok(cfg);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn cmd_synth(config: Option<&Path>, context_file: &Path, out_dir: &Path) -> Result<(), String> {
    let cfg = load_config(config)?;
    let ctx = context::NetworkContext::from_file(context_file)?;

    let plan = stacks::assemble(&cfg, &ctx)?;
    println!("Synthesizing {} stacks", plan.len());
    for stack in &plan {
        let path = template::write_template(out_dir, &stack.name, &stack.template)?;
        println!(
            "  {} → {} ({} resources, {})",
            stack.name,
            path.display(),
            stack.template.resources.len(),
            stack.fingerprint
        );
    }
    Ok(())
}

fn cmd_validate(config: Option<&Path>, context_file: &Path) -> Result<(), String> {
    let cfg = load_config(config)?;
    let ctx = context::NetworkContext::from_file(context_file)?;

    // Lookup must resolve before anything is declared.
    ctx.lookup_vpc(&cfg.vpc_lookup_tags)?;

    for file in BUILDSPEC_FILES {
        if !Path::new(file).exists() {
            return Err(format!("missing buildspec {}", file));
        }
    }

    let plan = stacks::assemble(&cfg, &ctx)?;
    println!(
        "OK: {} stacks, {} resources",
        plan.len(),
        plan.iter().map(|s| s.template.resources.len()).sum::<usize>()
    );
    Ok(())
}

fn cmd_list(config: Option<&Path>, context_file: &Path) -> Result<(), String> {
    let cfg = load_config(config)?;
    let ctx = context::NetworkContext::from_file(context_file)?;

    for stack in stacks::assemble(&cfg, &ctx)? {
        println!("{} ({})", stack.name, stack.fingerprint);
        for (logical_id, resource) in &stack.template.resources {
            println!("  {} [{}]", logical_id, resource.resource_type);
        }
    }
    Ok(())
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(config::DeployConfig);
    let json =
        serde_json::to_string_pretty(&schema).map_err(|e| format!("serialize error: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DeployConfig;
    use crate::core::context::NetworkContext;

    fn write_context(dir: &Path) -> PathBuf {
        let cfg = DeployConfig::production();
        let ctx = NetworkContext::single(&cfg.vpc_lookup_tags, "vpc-0a1b2c3d4e5f67890");
        let path = dir.join("context.yaml");
        std::fs::write(&path, serde_yaml_ng::to_string(&ctx).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_synth_writes_all_templates() {
        let dir = tempfile::tempdir().unwrap();
        let context_path = write_context(dir.path());
        let out_dir = dir.path().join("out");

        cmd_synth(None, &context_path, &out_dir).unwrap();

        for stack in ["AppStack", "BackendPipeline", "FrontendPipeline"] {
            let path = template::template_path(&out_dir, stack);
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    #[test]
    fn test_synth_missing_context_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_synth(None, &dir.path().join("absent.yaml"), &dir.path().join("out"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("infra.yaml");
        let mut cfg = DeployConfig::production();
        cfg.account = "bad".to_string();
        std::fs::write(&path, serde_yaml_ng::to_string(&cfg).unwrap()).unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_load_config_defaults_to_production() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.eks_cluster_name, "prod");
    }

    #[test]
    fn test_schema_command() {
        cmd_schema().unwrap();
    }
}

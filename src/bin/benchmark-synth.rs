// Copyright (c) 2025 - Cowboy AI, Inc.
//! Benchmark Stack Synthesizer
//!
//! Evaluates the EC2 network benchmark topology for the environment named by
//! `CDK_DEPLOY_ACCOUNT` / `CDK_DEPLOY_REGION` and writes the cloud assembly.
//!
//! Run with: cargo run --bin benchmark-synth -- --output cdk.out
//!
//! Prerequisites:
//! 1. `CDK_DEPLOY_ACCOUNT` and `CDK_DEPLOY_REGION` set
//! 2. A context file holding the region's availability zones and the
//!    latest Ubuntu image id (default: cdk.context.json)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ec2_benchmark_topology::{
    assembly::write_assembly, benchmark_stack, ContextStore, DeployEnvironment, SynthConfig,
    TopologyEvaluator,
};

#[derive(Debug, Parser)]
#[clap(about, version)]
/// Synthesize the EC2 network benchmark stack
struct Opt {
    /// Cloud assembly output directory
    #[clap(short, long, default_value = SynthConfig::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Context file with cached lookups
    #[clap(short, long, default_value = SynthConfig::DEFAULT_CONTEXT_FILE)]
    context: PathBuf,

    /// Also print the template to stdout
    #[clap(long, action)]
    print: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::parse();
    let config = SynthConfig::new()
        .with_output_dir(&opt.output)
        .with_context_file(&opt.context);

    let env = DeployEnvironment::from_env().context("Failed to read deploy environment")?;
    info!("Synthesizing for {}", env);

    let context = ContextStore::load(&config.context_file)
        .with_context(|| format!("Failed to load context from {}", config.context_file.display()))?;

    let definition = benchmark_stack(&env).context("Failed to build stack definition")?;
    let stack = TopologyEvaluator::new(&context)
        .evaluate(&env, &definition)
        .context("Failed to evaluate topology")?;

    let written = write_assembly(&stack, &config.output_dir).context("Failed to write cloud assembly")?;
    info!("Template: {}", written.template.display());
    for output in stack.outputs() {
        info!("  - output {} -> {}", output.name, output.logical_id);
    }

    if opt.print {
        println!("{}", serde_json::to_string_pretty(&stack.template())?);
    }

    Ok(())
}

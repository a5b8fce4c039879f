//! Topology compiler for the EC2 network benchmark stack
//!
//! Evaluates a static declaration of a VPC (subnet tiers across availability
//! zones), one security group and a handful of bootstrapped instances into a
//! CloudFormation resource graph with named output bindings.
//!
//! ```rust,no_run
//! use ec2_benchmark_topology::{benchmark_stack, ContextStore, DeployEnvironment, TopologyEvaluator};
//!
//! let env = DeployEnvironment::from_env()?;
//! let context = ContextStore::load("cdk.context.json")?;
//! let stack = TopologyEvaluator::new(&context).evaluate(&env, &benchmark_stack(&env)?)?;
//! println!("{}", serde_json::to_string_pretty(&stack.template()).unwrap());
//! # Ok::<(), ec2_benchmark_topology::TopologyError>(())
//! ```

pub mod assembly;
pub mod config;
pub mod domain;
pub mod errors;
pub mod evaluator;
pub mod graph;
pub mod lookup;
pub mod provision;
pub mod stack;

// Re-export commonly used types
pub use config::{DeployEnvironment, SynthConfig};
pub use errors::{TopologyError, TopologyResult};
pub use evaluator::{SynthesizedStack, TopologyEvaluator};
pub use graph::ResourceGraph;
pub use lookup::{ContextStore, LookupService};
pub use provision::{deploy_stack, resolve_outputs, LiveStack, ProvisioningEngine};
pub use stack::{benchmark_stack, StackDefinition};

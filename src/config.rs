// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment environment and synthesis configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{TopologyError, TopologyResult};

/// Environment variable holding the target account id
pub const ACCOUNT_VAR: &str = "CDK_DEPLOY_ACCOUNT";

/// Environment variable holding the target region
pub const REGION_VAR: &str = "CDK_DEPLOY_REGION";

/// Account and region a stack is synthesized for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeployEnvironment {
    pub account: String,
    pub region: String,
}

impl DeployEnvironment {
    /// Create an environment, rejecting empty identifiers
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> TopologyResult<Self> {
        let account = account.into().trim().to_string();
        let region = region.into().trim().to_string();

        if account.is_empty() {
            return Err(TopologyError::MissingConfiguration(format!(
                "{} is empty",
                ACCOUNT_VAR
            )));
        }
        if region.is_empty() {
            return Err(TopologyError::MissingConfiguration(format!(
                "{} is empty",
                REGION_VAR
            )));
        }

        Ok(Self { account, region })
    }

    /// Load from `CDK_DEPLOY_ACCOUNT` / `CDK_DEPLOY_REGION`
    pub fn from_env() -> TopologyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> TopologyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account = lookup(ACCOUNT_VAR)
            .ok_or_else(|| TopologyError::MissingConfiguration(format!("{} not set", ACCOUNT_VAR)))?;
        let region = lookup(REGION_VAR)
            .ok_or_else(|| TopologyError::MissingConfiguration(format!("{} not set", REGION_VAR)))?;

        let env = Self::new(account, region)?;
        debug!("Deploy environment resolved: {}", env);
        Ok(env)
    }
}

impl fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws://{}/{}", self.account, self.region)
    }
}

/// Where synthesis reads cached lookups from and writes its assembly to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Cloud assembly output directory
    pub output_dir: PathBuf,

    /// JSON file with cached lookup values
    pub context_file: PathBuf,
}

impl SynthConfig {
    pub const DEFAULT_OUTPUT_DIR: &'static str = "cdk.out";
    pub const DEFAULT_CONTEXT_FILE: &'static str = "cdk.context.json";

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the context file
    pub fn with_context_file(mut self, file: impl AsRef<Path>) -> Self {
        self.context_file = file.as_ref().to_path_buf();
        self
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
            context_file: PathBuf::from(Self::DEFAULT_CONTEXT_FILE),
        }
    }
}

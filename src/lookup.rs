// Copyright (c) 2025 - Cowboy AI, Inc.
//! External Lookups
//!
//! Synthesis needs two facts it cannot derive itself: the availability zones
//! of the target region and the current value of a parameter (the latest
//! machine image id for a channel). Both go through [`LookupService`].
//!
//! [`ContextStore`] answers lookups from a JSON context file keyed the way
//! the deployment toolchain caches them:
//!
//! ```text
//! availability-zones:account=123456789012:region=us-east-1
//! ssm:account=123456789012:parameterName=/aws/service/...:region=us-east-1
//! ```
//!
//! A key missing from the store is a lookup failure, never a placeholder.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DeployEnvironment;
use crate::errors::{TopologyError, TopologyResult};

/// Synchronous lookup service consulted during evaluation
pub trait LookupService {
    /// Availability zone names of the environment's region, in order
    fn availability_zones(&self, env: &DeployEnvironment) -> TopologyResult<Vec<String>>;

    /// Current value of a string parameter in the environment's region
    fn string_parameter(&self, env: &DeployEnvironment, name: &str) -> TopologyResult<String>;
}

/// Context key for an availability zone lookup
pub fn availability_zones_key(env: &DeployEnvironment) -> String {
    format!(
        "availability-zones:account={}:region={}",
        env.account, env.region
    )
}

/// Context key for a string parameter lookup
pub fn string_parameter_key(env: &DeployEnvironment, name: &str) -> String {
    format!(
        "ssm:account={}:parameterName={}:region={}",
        env.account, name, env.region
    )
}

/// Cached lookup values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStore {
    values: BTreeMap<String, Value>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a context file; a missing file yields an empty store
    pub fn load(path: impl AsRef<Path>) -> TopologyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Context file {} not found, starting empty", path.display());
            return Ok(Self::new());
        }

        let raw = fs::read_to_string(path)?;
        let values: BTreeMap<String, Value> = serde_json::from_str(&raw)?;
        info!("Loaded {} context values from {}", values.len(), path.display());
        Ok(Self { values })
    }

    /// Write the store back as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> TopologyResult<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Record the zones of an environment
    pub fn set_availability_zones<I, S>(&mut self, env: &DeployEnvironment, zones: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let zones = zones.into_iter().map(|z| Value::String(z.into())).collect();
        self.values
            .insert(availability_zones_key(env), Value::Array(zones));
    }

    /// Record a parameter value of an environment
    pub fn set_string_parameter(
        &mut self,
        env: &DeployEnvironment,
        name: &str,
        value: impl Into<String>,
    ) {
        self.values
            .insert(string_parameter_key(env, name), Value::String(value.into()));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, key: &str) -> TopologyResult<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| TopologyError::lookup(key, "no cached value in context"))
    }
}

impl LookupService for ContextStore {
    fn availability_zones(&self, env: &DeployEnvironment) -> TopologyResult<Vec<String>> {
        let key = availability_zones_key(env);
        let zones = match self.get(&key)? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| TopologyError::lookup(&key, "zone name is not a string"))
                })
                .collect::<TopologyResult<Vec<_>>>()?,
            _ => return Err(TopologyError::lookup(&key, "expected an array of zone names")),
        };

        if zones.is_empty() {
            return Err(TopologyError::lookup(&key, "region reports no availability zones"));
        }

        debug!("Resolved {} availability zones for {}", zones.len(), env);
        Ok(zones)
    }

    fn string_parameter(&self, env: &DeployEnvironment, name: &str) -> TopologyResult<String> {
        let key = string_parameter_key(env, name);
        match self.get(&key)? {
            Value::String(value) if !value.is_empty() => {
                debug!("Resolved parameter {} = {}", name, value);
                Ok(value.clone())
            }
            Value::String(_) => Err(TopologyError::lookup(&key, "parameter value is empty")),
            _ => Err(TopologyError::lookup(&key, "parameter value is not a string")),
        }
    }
}

impl From<Map<String, Value>> for ContextStore {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

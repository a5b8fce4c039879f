// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Engine Seam
//!
//! Creating resources is the provider's job. This module only fixes the
//! contract: a synthesized stack goes in, a [`LiveStack`] (physical ids and
//! attributes per logical id) comes out, and output bindings are resolved
//! against it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::domain::{AttributeRef, OutputBinding};
use crate::errors::{TopologyError, TopologyResult};
use crate::evaluator::SynthesizedStack;

/// Live state of one provisioned resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveResource {
    pub physical_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl LiveResource {
    pub fn new(physical_id: impl Into<String>) -> Self {
        Self {
            physical_id: physical_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Provisioned stack as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStack {
    pub stack_name: String,
    pub resources: BTreeMap<String, LiveResource>,
}

impl LiveStack {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            resources: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, logical_id: impl Into<String>, resource: LiveResource) -> Self {
        self.resources.insert(logical_id.into(), resource);
        self
    }

    /// Resolve one attribute reference
    pub fn resolve(&self, target: &AttributeRef) -> TopologyResult<String> {
        let resource = self.resources.get(&target.resource).ok_or_else(|| {
            TopologyError::Provisioning(format!(
                "stack {} has no resource '{}'",
                self.stack_name, target.resource
            ))
        })?;

        match &target.attribute {
            None => Ok(resource.physical_id.clone()),
            Some(attribute) => resource.attributes.get(attribute).cloned().ok_or_else(|| {
                TopologyError::Provisioning(format!(
                    "resource '{}' of stack {} has no attribute '{}'",
                    target.resource, self.stack_name, attribute
                ))
            }),
        }
    }
}

/// Engine that turns a template into live resources
pub trait ProvisioningEngine {
    /// Create or converge the stack and report its live state
    fn deploy(&self, stack_name: &str, template: &Value) -> TopologyResult<LiveStack>;
}

/// Resolve every output binding; any unresolved binding fails the whole set
pub fn resolve_outputs(
    bindings: &[OutputBinding],
    live: &LiveStack,
) -> TopologyResult<BTreeMap<String, String>> {
    bindings
        .iter()
        .map(|binding| {
            live.resolve(&binding.target)
                .map(|value| (binding.name.clone(), value))
                .inspect_err(|e| warn!("Output {} unresolved: {}", binding.name, e))
        })
        .collect()
}

/// Submit a synthesized stack and resolve its outputs
pub fn deploy_stack<E: ProvisioningEngine + ?Sized>(
    engine: &E,
    stack: &SynthesizedStack,
) -> TopologyResult<BTreeMap<String, String>> {
    info!("Submitting stack {} to provisioning engine", stack.stack_name);
    let live = engine.deploy(&stack.stack_name, &stack.template())?;
    let outputs = resolve_outputs(stack.outputs(), &live)?;
    info!("Stack {} provisioned with {} outputs", stack.stack_name, outputs.len());
    Ok(outputs)
}

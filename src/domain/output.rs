// Copyright (c) 2025 - Cowboy AI, Inc.
//! Output Bindings
//!
//! An output is declared against the topology (an instance's public address,
//! the n-th subnet of a tier) and bound, during evaluation, to an attribute of
//! a concrete resource in the graph. Its value only exists once the stack has
//! been provisioned.

use serde::{Deserialize, Serialize};

use super::SubnetType;

/// What an output exposes, in topology terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputValue {
    /// Public IPv4 address of the named instance
    InstancePublicIp { instance: String },

    /// Id of the subnet at `index` (0-based) among all subnets of
    /// `subnet_type`, in tier order then zone order
    SubnetId { subnet_type: SubnetType, index: usize },
}

/// Declared output, before binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDeclaration {
    pub name: String,
    pub value: OutputValue,
}

impl OutputDeclaration {
    pub fn new(name: impl Into<String>, value: OutputValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn instance_public_ip(name: impl Into<String>, instance: impl Into<String>) -> Self {
        Self::new(
            name,
            OutputValue::InstancePublicIp {
                instance: instance.into(),
            },
        )
    }

    pub fn subnet_id(name: impl Into<String>, subnet_type: SubnetType, index: usize) -> Self {
        Self::new(name, OutputValue::SubnetId { subnet_type, index })
    }
}

/// Reference to a live attribute of a resource in the graph
///
/// `attribute == None` refers to the resource's physical id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeRef {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl AttributeRef {
    pub fn physical_id(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: None,
        }
    }

    pub fn attribute(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: Some(attribute.into()),
        }
    }
}

/// Output bound to a concrete resource attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
    /// Declared name, e.g. `public-ip-instance-a`
    pub name: String,

    /// Template-safe id derived from the name
    pub logical_id: String,

    pub target: AttributeRef,
}

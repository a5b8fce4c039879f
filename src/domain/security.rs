// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Group Rules

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Ipv4Cidr;

/// Transport protocol of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Protocol name as the provider spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingress rule: (protocol, port, source block)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityRule {
    pub protocol: Protocol,
    pub port: u16,
    pub source: Ipv4Cidr,
}

impl SecurityRule {
    /// TCP rule for a single port
    pub fn tcp(source: Ipv4Cidr, port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            port,
            source,
        }
    }

    /// UDP rule for a single port
    pub fn udp(source: Ipv4Cidr, port: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            port,
            source,
        }
    }

    /// Human readable description, e.g. `from 0.0.0.0/0:22`
    pub fn description(&self) -> String {
        match self.protocol {
            Protocol::Tcp => format!("from {}:{}", self.source, self.port),
            Protocol::Udp => format!("from {}:UDP {}", self.source, self.port),
        }
    }
}

/// The one security group attached to every instance of a topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: String,
    pub description: String,
    ingress: Vec<SecurityRule>,
    pub allow_all_outbound: bool,
}

impl SecurityGroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("{} security group", name),
            name,
            ingress: Vec::new(),
            allow_all_outbound: true,
        }
    }

    /// Add an ingress rule
    ///
    /// Adding an identical rule twice keeps a single copy. Returns whether
    /// the rule was new.
    pub fn add_ingress_rule(&mut self, rule: SecurityRule) -> bool {
        if self.ingress.contains(&rule) {
            return false;
        }
        self.ingress.push(rule);
        true
    }

    /// Ingress rules in insertion order
    pub fn ingress_rules(&self) -> &[SecurityRule] {
        &self.ingress
    }
}

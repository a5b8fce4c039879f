// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for ec2-benchmark-topology
//!
//! Deterministic environments, cached lookups and a fake provisioning engine.
//! No fixture reads the process environment or the network.
#![allow(dead_code)]

use serde_json::Value;
use std::cell::{Cell, RefCell};

use ec2_benchmark_topology::domain::MachineImage;
use ec2_benchmark_topology::lookup::LookupService;
use ec2_benchmark_topology::provision::{LiveResource, LiveStack, ProvisioningEngine};
use ec2_benchmark_topology::{ContextStore, DeployEnvironment, TopologyError, TopologyResult};

pub const ACCOUNT: &str = "123456789012";
pub const REGION: &str = "us-east-1";
pub const UBUNTU_AMI: &str = "ami-0a1b2c3d4e5f60718";

pub const THREE_ZONES: [&str; 3] = ["us-east-1a", "us-east-1b", "us-east-1c"];

/// Fixed deploy environment
pub fn environment() -> DeployEnvironment {
    DeployEnvironment::new(ACCOUNT, REGION).expect("Invalid fixture environment")
}

/// Zone names `<region>a`, `<region>b`, ... for `count` zones
pub fn zones_for(region: &str, count: usize) -> Vec<String> {
    "abcdefgh"
        .chars()
        .take(count)
        .map(|suffix| format!("{}{}", region, suffix))
        .collect()
}

/// Context holding zones and the Ubuntu image for `env`
pub fn context_for(env: &DeployEnvironment, zones: &[String]) -> ContextStore {
    let mut store = ContextStore::new();
    store.set_availability_zones(env, zones.iter().cloned());
    store.set_string_parameter(env, MachineImage::UBUNTU_20_04_PARAMETER, UBUNTU_AMI);
    store
}

/// Context for the fixed environment with three zones
pub fn three_zone_context() -> ContextStore {
    context_for(&environment(), &zones_for(REGION, 3))
}

/// Lookup service whose image lookups always fail
pub struct ImageLookupDown {
    pub zones: Vec<String>,
    pub image_calls: Cell<usize>,
}

impl ImageLookupDown {
    pub fn new(zones: Vec<String>) -> Self {
        Self {
            zones,
            image_calls: Cell::new(0),
        }
    }
}

impl LookupService for ImageLookupDown {
    fn availability_zones(&self, _env: &DeployEnvironment) -> TopologyResult<Vec<String>> {
        Ok(self.zones.clone())
    }

    fn string_parameter(&self, _env: &DeployEnvironment, name: &str) -> TopologyResult<String> {
        self.image_calls.set(self.image_calls.get() + 1);
        Err(TopologyError::lookup(name, "parameter store unavailable"))
    }
}

/// Engine that "provisions" every resource with a synthetic id and address
#[derive(Default)]
pub struct FakeEngine {
    pub submitted: RefCell<Vec<String>>,
}

impl ProvisioningEngine for FakeEngine {
    fn deploy(&self, stack_name: &str, template: &Value) -> TopologyResult<LiveStack> {
        self.submitted.borrow_mut().push(stack_name.to_string());

        let resources = template["Resources"]
            .as_object()
            .ok_or_else(|| TopologyError::Provisioning("template has no resources".into()))?;

        let mut live = LiveStack::new(stack_name);
        for (n, (logical_id, body)) in resources.iter().enumerate() {
            let mut resource = LiveResource::new(format!("phys-{}", logical_id.to_lowercase()));
            if body["Type"] == "AWS::EC2::Instance" {
                resource = resource.with_attribute("PublicIp", format!("198.51.100.{}", n));
            }
            live = live.with_resource(logical_id.clone(), resource);
        }
        Ok(live)
    }
}

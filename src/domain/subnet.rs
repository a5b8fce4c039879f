// Copyright (c) 2025 - Cowboy AI, Inc.
//! VPC Network Topology
//!
//! A topology is one VPC block carved into subnet tiers, one subnet per tier
//! per availability zone. Allocation walks the tiers in declaration order and,
//! inside each tier, the availability zones in order, handing out consecutive
//! blocks of the tier's mask from the VPC base address.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Ipv4Cidr;
use crate::errors::{TopologyError, TopologyResult};

/// Subnet tier kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Outbound internet through a NAT gateway in a public subnet
    Private,
    /// Routed to the internet gateway
    Public,
    /// No route out of the VPC
    Isolated,
}

impl SubnetType {
    /// Label used in logical ids and tags
    pub fn label(&self) -> &'static str {
        match self {
            SubnetType::Private => "Private",
            SubnetType::Public => "Public",
            SubnetType::Isolated => "Isolated",
        }
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One subnet tier of the VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetConfiguration {
    pub name: String,
    pub subnet_type: SubnetType,
    pub cidr_mask: u8,
}

impl SubnetConfiguration {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            name: name.into(),
            subnet_type,
            cidr_mask,
        }
    }
}

/// Declared VPC layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    /// VPC address block
    pub cidr: Ipv4Cidr,

    /// Subnet tiers, in allocation order
    pub subnets: Vec<SubnetConfiguration>,

    /// Upper bound on availability zones spanned; `None` spans every zone
    /// the region reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_azs: Option<usize>,
}

/// A concrete subnet produced by allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetAllocation {
    /// Tier name
    pub tier: String,
    pub subnet_type: SubnetType,
    pub availability_zone: String,
    pub cidr: Ipv4Cidr,
    /// 1-based position inside the tier, one per availability zone
    pub position: usize,
}

impl NetworkTopology {
    /// Smallest VPC/subnet prefix the provider accepts
    pub const MIN_PREFIX: u8 = 16;

    /// Largest VPC/subnet prefix the provider accepts
    pub const MAX_PREFIX: u8 = 28;

    pub fn new(cidr: Ipv4Cidr, subnets: Vec<SubnetConfiguration>) -> Self {
        Self {
            cidr,
            subnets,
            max_azs: None,
        }
    }

    /// Limit the number of availability zones spanned
    pub fn with_max_azs(mut self, max_azs: usize) -> Self {
        self.max_azs = Some(max_azs);
        self
    }

    /// Availability zones actually used, given what the region offers
    pub fn select_zones<'a>(&self, available: &'a [String]) -> &'a [String] {
        match self.max_azs {
            Some(max) => &available[..max.min(available.len())],
            None => available,
        }
    }

    /// Validate the layout against the number of availability zones
    ///
    /// # Invariants
    /// - VPC prefix within /16 - /28
    /// - At least one tier, unique tier names
    /// - Every tier mask within /16 - /28 and not shorter than the VPC prefix
    /// - Private tiers require a public tier to host NAT gateways
    /// - All tiers × zones blocks, aligned on their own size, fit in the VPC block
    pub fn validate(&self, az_count: usize) -> TopologyResult<()> {
        let prefix = self.cidr.prefix_length();
        if !(Self::MIN_PREFIX..=Self::MAX_PREFIX).contains(&prefix) {
            return Err(TopologyError::ConstraintViolation(format!(
                "VPC block {} must have a prefix between /{} and /{}",
                self.cidr,
                Self::MIN_PREFIX,
                Self::MAX_PREFIX
            )));
        }

        if az_count == 0 {
            return Err(TopologyError::ConstraintViolation(
                "topology must span at least one availability zone".to_string(),
            ));
        }

        if self.subnets.is_empty() {
            return Err(TopologyError::ConstraintViolation(
                "topology declares no subnet tiers".to_string(),
            ));
        }

        let mut seen = Vec::with_capacity(self.subnets.len());
        for tier in &self.subnets {
            if seen.contains(&tier.name.as_str()) {
                return Err(TopologyError::ConstraintViolation(format!(
                    "duplicate subnet tier name '{}'",
                    tier.name
                )));
            }
            seen.push(tier.name.as_str());

            if !(Self::MIN_PREFIX..=Self::MAX_PREFIX).contains(&tier.cidr_mask) {
                return Err(TopologyError::ConstraintViolation(format!(
                    "subnet tier '{}' mask /{} must be between /{} and /{}",
                    tier.name,
                    tier.cidr_mask,
                    Self::MIN_PREFIX,
                    Self::MAX_PREFIX
                )));
            }
            if tier.cidr_mask < prefix {
                return Err(TopologyError::ConstraintViolation(format!(
                    "subnet tier '{}' mask /{} is larger than the VPC block {}",
                    tier.name, tier.cidr_mask, self.cidr
                )));
            }
        }

        let has_private = self.tiers_of(SubnetType::Private).next().is_some();
        let has_public = self.tiers_of(SubnetType::Public).next().is_some();
        if has_private && !has_public {
            return Err(TopologyError::ConstraintViolation(
                "private subnet tiers require a public tier for NAT gateways".to_string(),
            ));
        }

        let (_, end) = self.block_offsets(az_count);
        if end > self.cidr.size() {
            return Err(TopologyError::ConstraintViolation(format!(
                "{} subnet tiers across {} availability zones need {} addresses, VPC block {} has {}",
                self.subnets.len(),
                az_count,
                end,
                self.cidr,
                self.cidr.size()
            )));
        }

        Ok(())
    }

    /// Carve the VPC block into subnets, tier by tier, zone by zone
    pub fn allocate(&self, zones: &[String]) -> TopologyResult<Vec<SubnetAllocation>> {
        self.validate(zones.len())?;

        let (offsets, _) = self.block_offsets(zones.len());
        let mut offsets = offsets.into_iter();
        let mut allocations = Vec::with_capacity(self.subnets.len() * zones.len());

        for tier in &self.subnets {
            let block = self.addresses_of(tier.cidr_mask);
            for (i, zone) in zones.iter().enumerate() {
                let offset = offsets.next().ok_or_else(|| {
                    TopologyError::ConstraintViolation(format!(
                        "no block laid out for tier '{}' in {}",
                        tier.name, zone
                    ))
                })?;
                let cidr = self.cidr.nth_block(tier.cidr_mask, offset / block)?;
                allocations.push(SubnetAllocation {
                    tier: tier.name.clone(),
                    subnet_type: tier.subnet_type,
                    availability_zone: zone.clone(),
                    cidr,
                    position: i + 1,
                });
            }
        }

        Ok(allocations)
    }

    /// Start offsets of every tier × zone block, tier-major, and the first
    /// free offset after the last one
    ///
    /// Each block starts on a multiple of its own size, so mixed masks leave
    /// gaps that count against the VPC block.
    fn block_offsets(&self, az_count: usize) -> (Vec<u64>, u64) {
        let mut offsets = Vec::with_capacity(self.subnets.len() * az_count);
        let mut offset: u64 = 0;
        for tier in &self.subnets {
            let block = self.addresses_of(tier.cidr_mask);
            for _ in 0..az_count {
                offset = offset.div_ceil(block) * block;
                offsets.push(offset);
                offset += block;
            }
        }
        (offsets, offset)
    }

    fn tiers_of(&self, subnet_type: SubnetType) -> impl Iterator<Item = &SubnetConfiguration> {
        self.subnets
            .iter()
            .filter(move |tier| tier.subnet_type == subnet_type)
    }

    fn addresses_of(&self, mask: u8) -> u64 {
        1u64 << (32 - u32::from(mask))
    }
}

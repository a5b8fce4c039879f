// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Static building blocks of a declared topology. Every value here is
//! validated on construction and immutable afterwards.
//!
//! # Value Objects
//!
//! - [`Ipv4Cidr`] - IPv4 network block, no host bits set
//! - [`InstanceType`] - `family.size` identifier
//! - [`SecurityRule`] - (protocol, port, source) ingress tuple
//!
//! # Declarations
//!
//! - [`NetworkTopology`] - VPC block and subnet tiers
//! - [`SecurityGroupSpec`] - the shared security group
//! - [`ImageProfile`] / [`InstanceSpec`] - images, bootstrap scripts, placements
//! - [`OutputDeclaration`] - named values exposed after provisioning

pub mod instance;
pub mod network;
pub mod output;
pub mod security;
pub mod subnet;

pub use instance::{
    BootstrapScript, ImageProfile, InstanceError, InstanceSpec, InstanceSpecBuilder,
    InstanceType, MachineImage, OsFamily,
};
pub use network::{Ipv4Cidr, NetworkError};
pub use output::{AttributeRef, OutputBinding, OutputDeclaration, OutputValue};
pub use security::{Protocol, SecurityGroupSpec, SecurityRule};
pub use subnet::{NetworkTopology, SubnetAllocation, SubnetConfiguration, SubnetType};

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network block: {0}")]
    HostBitsSet(String),

    #[error("Subnet mask /{mask} is shorter than the block prefix /{prefix}")]
    MaskShorterThanPrefix { mask: u8, prefix: u8 },

    #[error("Block index {index} out of range ({count} blocks of /{mask} available)")]
    BlockOutOfRange { index: u64, count: u64, mask: u8 },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Valid IPv4 address and prefix length 0-32
/// - No host bits set below the prefix (`10.10.0.0/16`, never `10.10.1.0/16`)
///
/// # Examples
///
/// ```rust
/// use ec2_benchmark_topology::domain::Ipv4Cidr;
///
/// let vpc = Ipv4Cidr::new("10.10.0.0/16").unwrap();
/// assert_eq!(vpc.prefix_length(), 16);
/// assert_eq!(vpc.nth_block(24, 3).unwrap().to_string(), "10.10.3.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Create a new network block from CIDR notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(network, prefix_length)
    }

    /// Create from a network address and prefix length
    pub fn from_parts(network: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(network) & !Self::mask_bits(prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{}/{}",
                network, prefix_length
            )));
        }

        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// The whole IPv4 space, `0.0.0.0/0`
    pub fn any() -> Self {
        Self {
            network: Ipv4Addr::UNSPECIFIED,
            prefix_length: 0,
        }
    }

    /// Get the network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Number of `/mask` blocks that fit in this block
    pub fn block_count(&self, mask: u8) -> Result<u64, NetworkError> {
        if mask > 32 {
            return Err(NetworkError::InvalidPrefixLength(mask));
        }
        if mask < self.prefix_length {
            return Err(NetworkError::MaskShorterThanPrefix {
                mask,
                prefix: self.prefix_length,
            });
        }
        Ok(1u64 << u32::from(mask - self.prefix_length))
    }

    /// The `index`-th `/mask` block counted from the network address
    pub fn nth_block(&self, mask: u8, index: u64) -> Result<Ipv4Cidr, NetworkError> {
        let count = self.block_count(mask)?;
        if index >= count {
            return Err(NetworkError::BlockOutOfRange { index, count, mask });
        }

        let block_size = 1u64 << (32 - u32::from(mask));
        let base = u64::from(u32::from(self.network)) + index * block_size;
        // base < 2^32 because index < count
        Ok(Self {
            network: Ipv4Addr::from(base as u32),
            prefix_length: mask,
        })
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.network) & Self::mask_bits(self.prefix_length)
                == u32::from(self.network)
    }

    /// Whether the two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }

    fn mask_bits(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

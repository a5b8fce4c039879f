// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Instance Specifications
//!
//! - [`InstanceType`] - validated `family.size` identifier (`t3.micro`)
//! - [`MachineImage`] - where the image id comes from
//! - [`BootstrapScript`] - first-boot commands, opaque to this crate
//! - [`ImageProfile`] - an image paired with its bootstrap script
//! - [`InstanceSpec`] - one placed instance

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::SubnetType;

/// Instance specification validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceError {
    #[error("Invalid instance type: {0} (expected family.size)")]
    InvalidInstanceType(String),

    #[error("Instance name is empty")]
    EmptyName,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid availability zone suffix: {0} (expected a single lowercase letter)")]
    InvalidZoneSuffix(String),
}

/// Instance size identifier, e.g. `t3.micro`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(identifier: impl Into<String>) -> Result<Self, InstanceError> {
        let identifier = identifier.into();

        let valid = match identifier.split_once('.') {
            Some((family, size)) => {
                !family.is_empty()
                    && !size.is_empty()
                    && family
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && size
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            }
            None => false,
        };

        if !valid {
            return Err(InstanceError::InvalidInstanceType(identifier));
        }
        Ok(Self(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceType {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Operating system family, decides how bootstrap scripts render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Linux,
    Windows,
}

/// Source of a machine image id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MachineImage {
    /// Latest Amazon Linux, resolved by the provider at deploy time
    LatestAmazonLinux,

    /// Latest Windows Server of the given version, resolved at deploy time
    LatestWindows { version: String },

    /// Resolved at synthesis time by looking up a parameter
    Lookup { parameter_name: String },
}

impl MachineImage {
    pub const AMAZON_LINUX_PARAMETER: &'static str =
        "/aws/service/ami-amazon-linux-latest/amzn-ami-hvm-x86_64-gp2";

    pub const WINDOWS_PARAMETER_PREFIX: &'static str = "/aws/service/ami-windows-latest/";

    pub const WINDOWS_SERVER_2019_ENGLISH_FULL_BASE: &'static str =
        "Windows_Server-2019-English-Full-Base";

    pub const UBUNTU_20_04_PARAMETER: &'static str =
        "/aws/service/canonical/ubuntu/server/20.04/stable/current/amd64/hvm/ebs-gp2/ami-id";

    pub fn lookup(parameter_name: impl Into<String>) -> Self {
        MachineImage::Lookup {
            parameter_name: parameter_name.into(),
        }
    }

    /// Parameter the provider resolves when the stack deploys
    pub fn deploy_time_parameter(&self) -> Option<String> {
        match self {
            MachineImage::LatestAmazonLinux => Some(Self::AMAZON_LINUX_PARAMETER.to_string()),
            MachineImage::LatestWindows { version } => {
                Some(format!("{}{}", Self::WINDOWS_PARAMETER_PREFIX, version))
            }
            MachineImage::Lookup { .. } => None,
        }
    }

    /// Parameter that must be looked up before synthesis can finish
    pub fn synth_time_parameter(&self) -> Option<&str> {
        match self {
            MachineImage::Lookup { parameter_name } => Some(parameter_name),
            _ => None,
        }
    }

    pub fn os_family(&self) -> OsFamily {
        match self {
            MachineImage::LatestWindows { .. } => OsFamily::Windows,
            _ => OsFamily::Linux,
        }
    }
}

/// Commands executed once at first boot
///
/// The payload is opaque: commands are never parsed or validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BootstrapScript {
    os: OsFamily,
    commands: Vec<String>,
}

impl BootstrapScript {
    pub fn for_linux() -> Self {
        Self {
            os: OsFamily::Linux,
            commands: Vec::new(),
        }
    }

    pub fn for_windows() -> Self {
        Self {
            os: OsFamily::Windows,
            commands: Vec::new(),
        }
    }

    pub fn add_command(&mut self, command: impl Into<String>) -> &mut Self {
        self.commands.push(command.into());
        self
    }

    pub fn add_commands<I, S>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    /// Render the script handed to the guest
    pub fn render(&self) -> String {
        match self.os {
            OsFamily::Linux => {
                let mut lines = Vec::with_capacity(self.commands.len() + 1);
                lines.push("#!/bin/bash");
                lines.extend(self.commands.iter().map(String::as_str));
                lines.join("\n")
            }
            OsFamily::Windows => format!("<powershell>{}</powershell>", self.commands.join("\n")),
        }
    }
}

/// A machine image together with the bootstrap script its instances run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageProfile {
    pub name: String,
    pub image: MachineImage,
    pub bootstrap: BootstrapScript,
}

impl ImageProfile {
    pub fn new(name: impl Into<String>, image: MachineImage, bootstrap: BootstrapScript) -> Self {
        Self {
            name: name.into(),
            image,
            bootstrap,
        }
    }
}

/// One compute instance placement
///
/// # Invariants
/// - Non-empty name
/// - Zone suffix is a single lowercase letter (the zone is `<region><suffix>`)
/// - Image profile, security group and key are named, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub image_profile: String,
    pub instance_type: InstanceType,
    pub subnet_type: SubnetType,
    pub zone_suffix: char,
    pub security_group: String,
    pub key_name: String,
}

impl InstanceSpec {
    pub fn builder(name: impl Into<String>) -> InstanceSpecBuilder {
        InstanceSpecBuilder::new(name)
    }

    /// Availability zone this instance lands in
    pub fn availability_zone(&self, region: &str) -> String {
        format!("{}{}", region, self.zone_suffix)
    }
}

/// Builder for [`InstanceSpec`]
#[derive(Debug, Clone)]
pub struct InstanceSpecBuilder {
    name: String,
    image_profile: Option<String>,
    instance_type: Option<InstanceType>,
    subnet_type: SubnetType,
    zone_suffix: Option<String>,
    security_group: Option<String>,
    key_name: Option<String>,
}

impl InstanceSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_profile: None,
            instance_type: None,
            subnet_type: SubnetType::Public,
            zone_suffix: None,
            security_group: None,
            key_name: None,
        }
    }

    pub fn image_profile(mut self, profile: impl Into<String>) -> Self {
        self.image_profile = Some(profile.into());
        self
    }

    pub fn instance_type(mut self, instance_type: InstanceType) -> Self {
        self.instance_type = Some(instance_type);
        self
    }

    pub fn subnet_type(mut self, subnet_type: SubnetType) -> Self {
        self.subnet_type = subnet_type;
        self
    }

    pub fn zone_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.zone_suffix = Some(suffix.into());
        self
    }

    pub fn security_group(mut self, group: impl Into<String>) -> Self {
        self.security_group = Some(group.into());
        self
    }

    pub fn key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    pub fn build(self) -> Result<InstanceSpec, InstanceError> {
        if self.name.is_empty() {
            return Err(InstanceError::EmptyName);
        }

        let suffix = self
            .zone_suffix
            .ok_or(InstanceError::MissingField("zone_suffix"))?;
        let mut chars = suffix.chars();
        let zone_suffix = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => c,
            _ => return Err(InstanceError::InvalidZoneSuffix(suffix)),
        };

        Ok(InstanceSpec {
            name: self.name,
            image_profile: non_empty(self.image_profile, "image_profile")?,
            instance_type: self
                .instance_type
                .ok_or(InstanceError::MissingField("instance_type"))?,
            subnet_type: self.subnet_type,
            zone_suffix,
            security_group: non_empty(self.security_group, "security_group")?,
            key_name: non_empty(self.key_name, "key_name")?,
        })
    }
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, InstanceError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(InstanceError::MissingField(field))
}

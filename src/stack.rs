// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Definitions
//!
//! A [`StackDefinition`] is the static, declarative input of the evaluator.
//! [`benchmark_stack`] is the network benchmark topology this crate ships:
//! a `10.10.0.0/16` VPC with private, public and isolated `/24` tiers across
//! every zone of the region, one security group open on the benchmark ports,
//! and three Ubuntu instances in the public tier of zones `a`, `b` and `c`.

use serde::{Deserialize, Serialize};

use crate::config::DeployEnvironment;
use crate::domain::{
    BootstrapScript, ImageProfile, InstanceSpec, InstanceType, Ipv4Cidr, MachineImage,
    NetworkTopology, OutputDeclaration, SecurityGroupSpec, SecurityRule, SubnetConfiguration,
    SubnetType,
};
use crate::errors::TopologyResult;

/// Declarative description of one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDefinition {
    pub name: String,
    pub network: NetworkTopology,
    pub security_group: SecurityGroupSpec,
    pub image_profiles: Vec<ImageProfile>,
    pub instances: Vec<InstanceSpec>,
    pub outputs: Vec<OutputDeclaration>,
}

impl StackDefinition {
    pub fn image_profile(&self, name: &str) -> Option<&ImageProfile> {
        self.image_profiles.iter().find(|p| p.name == name)
    }
}

/// Benchmark ingress: SSH, HTTP, RDP, iperf2, iperf3, asn lookup server
pub const BENCHMARK_PORTS: [u16; 6] = [22, 80, 3389, 5001, 5201, 49200];

/// Instance zone suffixes
pub const BENCHMARK_ZONE_SUFFIXES: [&str; 3] = ["a", "b", "c"];

pub const AMAZON_LINUX_PROFILE: &str = "amazon-linux";
pub const UBUNTU_PROFILE: &str = "ubuntu";
pub const SECURITY_GROUP_NAME: &str = "pub_sg";
pub const INSTANCE_TYPE: &str = "t3.micro";

/// Written to the instance byte for byte, leading indentation included
const ASN_SERVICE_UNIT: &str = concat!(
    "\n",
    "            sudo echo \"[Unit]\n",
    "            Description=ASN lookup and traceroute server\n",
    "            After=network.target\n",
    "            StartLimitIntervalSec=0\n",
    "\n",
    "            [Service]\n",
    "            Type=simple\n",
    "            Restart=always\n",
    "            RestartSec=1\n",
    "            User=ubuntu\n",
    "            ExecStart=sudo asn -l 0.0.0.0 49200\n",
    "\n",
    "            [Install]\n",
    "            WantedBy=multi-user.target\n",
    "            \" >> /etc/systemd/system/asn.service\n",
    "\n",
    "            ",
);

/// Stack name for an environment
pub fn stack_name(env: &DeployEnvironment) -> String {
    format!("cdk-ec2-benchmark-{}", env.region)
}

/// Key pair every benchmark instance is launched with
pub fn key_pair_name(env: &DeployEnvironment) -> String {
    format!("prod-{}-keypair", env.region)
}

/// Amazon Linux tooling: web server, iperf, packet tools
pub fn amazon_linux_profile() -> ImageProfile {
    let mut bootstrap = BootstrapScript::for_linux();
    bootstrap.add_commands([
        "sudo yum install -y httpd",
        "sudo service httpd start",
        "sudo yum install -y https://dl.fedoraproject.org/pub/epel/epel-release-latest-7.noarch.rpm",
        "sudo yum install -y iperf",
        "sudo yum install -y tcpdump",
        "sudo yum install -y hping3",
        "sudo yum install -y nc",
        "sudo yum install -y mtr",
        "sudo yum install -y jwhois",
    ]);
    ImageProfile::new(AMAZON_LINUX_PROFILE, MachineImage::LatestAmazonLinux, bootstrap)
}

/// Ubuntu 20.04 tooling plus the asn lookup server as a systemd unit
pub fn ubuntu_profile() -> ImageProfile {
    let mut bootstrap = BootstrapScript::for_linux();
    bootstrap.add_commands([
        "sudo apt update && sudo apt -y install net-tools curl whois bind9-host jq ipcalc grepcidr ncat iperf3 hping3 mtr traceroute aha apache2",
        "sudo curl https://raw.githubusercontent.com/nitefood/asn/master/asn > /usr/bin/asn",
        "sudo chmod 0755 /usr/bin/asn",
        ASN_SERVICE_UNIT,
        "sudo setcap cap_net_raw+ep $(which mtr-packet)",
        "systemctl start asn",
    ]);
    ImageProfile::new(
        UBUNTU_PROFILE,
        MachineImage::lookup(MachineImage::UBUNTU_20_04_PARAMETER),
        bootstrap,
    )
}

/// The network benchmark stack for an environment
pub fn benchmark_stack(env: &DeployEnvironment) -> TopologyResult<StackDefinition> {
    let network = NetworkTopology::new(
        Ipv4Cidr::new("10.10.0.0/16")?,
        vec![
            SubnetConfiguration::new("private", SubnetType::Private, 24),
            SubnetConfiguration::new("public", SubnetType::Public, 24),
            SubnetConfiguration::new("isolated", SubnetType::Isolated, 24),
        ],
    );

    let mut security_group = SecurityGroupSpec::new(SECURITY_GROUP_NAME);
    for port in BENCHMARK_PORTS {
        security_group.add_ingress_rule(SecurityRule::tcp(Ipv4Cidr::any(), port));
    }

    let key_name = key_pair_name(env);
    let instances = BENCHMARK_ZONE_SUFFIXES
        .iter()
        .map(|suffix| {
            InstanceSpec::builder(format!("pub-instance_{}", suffix))
                .image_profile(UBUNTU_PROFILE)
                .instance_type(InstanceType::new(INSTANCE_TYPE)?)
                .subnet_type(SubnetType::Public)
                .zone_suffix(*suffix)
                .security_group(SECURITY_GROUP_NAME)
                .key_name(key_name.as_str())
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outputs = vec![
        OutputDeclaration::instance_public_ip("public-ip-instance-a", "pub-instance_a"),
        OutputDeclaration::instance_public_ip("public-ip-instance-b", "pub-instance_b"),
        OutputDeclaration::instance_public_ip("public-ip-instance-c", "pub-instance_c"),
        OutputDeclaration::subnet_id("public-subnet-a", SubnetType::Public, 0),
        OutputDeclaration::subnet_id("public-subnets-b", SubnetType::Public, 1),
        OutputDeclaration::subnet_id("public-subnets-c", SubnetType::Public, 2),
    ];

    Ok(StackDefinition {
        name: stack_name(env),
        network,
        security_group,
        image_profiles: vec![amazon_linux_profile(), ubuntu_profile()],
        instances,
        outputs,
    })
}

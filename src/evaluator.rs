// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Definition Evaluator
//!
//! Turns a [`StackDefinition`] into a [`ResourceGraph`] in one pass:
//!
//! ```text
//! environment ─▶ zones (lookup) ─▶ validate ─▶ allocate subnets
//!      ─▶ resolve images (lookup) ─▶ network, security group, instances ─▶ outputs
//! ```
//!
//! Everything that can fail for reasons outside the definition (lookups,
//! address space, placement) fails before the first instance is built, and
//! nothing is returned unless the whole graph is built.

use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::DeployEnvironment;
use crate::domain::{
    AttributeRef, ImageProfile, InstanceSpec, OutputBinding, OutputDeclaration, OutputValue,
    SecurityGroupSpec, SubnetAllocation, SubnetType,
};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::{get_att, logical_id, reference, Resource, ResourceGraph, TemplateParameter};
use crate::lookup::LookupService;
use crate::stack::StackDefinition;

const VPC_ID: &str = "vpc";
const ANYWHERE: &str = "0.0.0.0/0";

/// A fully evaluated stack
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub environment: DeployEnvironment,
    /// Zones the VPC spans
    pub availability_zones: Vec<String>,
    pub subnets: Vec<SubnetAllocation>,
    pub graph: ResourceGraph,
}

impl SynthesizedStack {
    /// CloudFormation template of the stack
    pub fn template(&self) -> Value {
        self.graph.to_template()
    }

    pub fn outputs(&self) -> &[OutputBinding] {
        self.graph.outputs()
    }
}

/// Where an instance's image id comes from once resolved
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedImage {
    /// Concrete id known at synthesis time
    Id(String),
    /// Template parameter resolved by the provider at deploy time
    Parameter(String),
}

impl ResolvedImage {
    fn to_value(&self) -> Value {
        match self {
            ResolvedImage::Id(id) => Value::String(id.clone()),
            ResolvedImage::Parameter(param) => reference(param),
        }
    }
}

/// Evaluates stack definitions against a lookup service
pub struct TopologyEvaluator<'a, L: LookupService + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: LookupService + ?Sized> TopologyEvaluator<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Evaluate `definition` for `env`
    pub fn evaluate(
        &self,
        env: &DeployEnvironment,
        definition: &StackDefinition,
    ) -> TopologyResult<SynthesizedStack> {
        info!("Evaluating stack {} for {}", definition.name, env);

        if env.account.trim().is_empty() || env.region.trim().is_empty() {
            return Err(TopologyError::MissingConfiguration(
                "deploy environment needs both account and region".to_string(),
            ));
        }
        validate_definition(definition)?;

        let available = self.lookup.availability_zones(env)?;
        let zones = definition.network.select_zones(&available).to_vec();
        debug!("Spanning {} of {} availability zones", zones.len(), available.len());

        let allocations = definition.network.allocate(&zones)?;
        check_placements(env, definition, &allocations)?;

        let images = self.resolve_images(env, definition)?;

        let mut graph = ResourceGraph::new().with_description(format!(
            "EC2 network benchmark topology ({})",
            env.region
        ));
        build_network(&mut graph, definition, &allocations)?;
        let group_id = build_security_group(&mut graph, &definition.security_group)?;
        for (profile, image) in &images {
            if let ResolvedImage::Parameter(param_id) = image {
                let parameter = definition
                    .image_profile(profile)
                    .and_then(|p| p.image.deploy_time_parameter())
                    .ok_or_else(|| {
                        TopologyError::ConstraintViolation(format!(
                            "image profile '{}' has no deploy-time parameter",
                            profile
                        ))
                    })?;
                graph.add_parameter(param_id.clone(), TemplateParameter::image_id_from_ssm(parameter))?;
            }
        }

        let mut instance_ids = BTreeMap::new();
        for instance in &definition.instances {
            let id = build_instance(
                &mut graph,
                env,
                definition,
                instance,
                &images,
                &allocations,
                &group_id,
            )?;
            instance_ids.insert(instance.name.clone(), id);
        }

        for declaration in &definition.outputs {
            let binding = bind_output(declaration, &instance_ids, &allocations)?;
            graph.add_output(binding)?;
        }

        graph.validate_references()?;

        info!(
            "Stack {} evaluated: {} resources, {} subnets, {} instances, {} outputs",
            definition.name,
            graph.len(),
            allocations.len(),
            instance_ids.len(),
            graph.outputs().len()
        );

        Ok(SynthesizedStack {
            stack_name: definition.name.clone(),
            environment: env.clone(),
            availability_zones: zones,
            subnets: allocations,
            graph,
        })
    }

    /// Resolve every image profile some instance uses
    fn resolve_images(
        &self,
        env: &DeployEnvironment,
        definition: &StackDefinition,
    ) -> TopologyResult<BTreeMap<String, ResolvedImage>> {
        let referenced: BTreeSet<&str> = definition
            .instances
            .iter()
            .map(|i| i.image_profile.as_str())
            .collect();

        let mut images = BTreeMap::new();
        for name in referenced {
            let profile = profile_of(definition, name)?;
            let resolved = match (
                profile.image.synth_time_parameter(),
                profile.image.deploy_time_parameter(),
            ) {
                (Some(parameter), _) => {
                    ResolvedImage::Id(self.lookup.string_parameter(env, parameter)?)
                }
                (None, Some(parameter)) => ResolvedImage::Parameter(logical_id(&[
                    "SsmParameterValue",
                    &parameter,
                    "Parameter",
                ])),
                (None, None) => {
                    return Err(TopologyError::ConstraintViolation(format!(
                        "image profile '{}' has no image source",
                        name
                    )))
                }
            };
            debug!("Image profile {} resolved to {:?}", name, resolved);
            images.insert(name.to_string(), resolved);
        }
        Ok(images)
    }
}

fn profile_of<'d>(definition: &'d StackDefinition, name: &str) -> TopologyResult<&'d ImageProfile> {
    definition.image_profile(name).ok_or_else(|| {
        TopologyError::ConstraintViolation(format!("unknown image profile '{}'", name))
    })
}

/// Cross-reference checks that need no lookups
fn validate_definition(definition: &StackDefinition) -> TopologyResult<()> {
    if definition.name.is_empty() {
        return Err(TopologyError::ConstraintViolation(
            "stack name is empty".to_string(),
        ));
    }

    let mut names = BTreeSet::new();
    for instance in &definition.instances {
        if !names.insert(logical_id(&[&instance.name])) {
            return Err(TopologyError::ConstraintViolation(format!(
                "duplicate instance name '{}'",
                instance.name
            )));
        }
        profile_of(definition, &instance.image_profile)?;
        if instance.security_group != definition.security_group.name {
            return Err(TopologyError::ConstraintViolation(format!(
                "instance '{}' references unknown security group '{}'",
                instance.name, instance.security_group
            )));
        }
    }
    Ok(())
}

/// Every instance must land in a zone the VPC spans
fn check_placements(
    env: &DeployEnvironment,
    definition: &StackDefinition,
    allocations: &[SubnetAllocation],
) -> TopologyResult<()> {
    for instance in &definition.instances {
        select_subnet(env, instance, allocations)?;
    }
    Ok(())
}

/// The subnet of the instance's tier type in the instance's zone
fn select_subnet<'s>(
    env: &DeployEnvironment,
    instance: &InstanceSpec,
    allocations: &'s [SubnetAllocation],
) -> TopologyResult<&'s SubnetAllocation> {
    let zone = instance.availability_zone(&env.region);
    allocations
        .iter()
        .find(|s| s.subnet_type == instance.subnet_type && s.availability_zone == zone)
        .ok_or_else(|| {
            TopologyError::ConstraintViolation(format!(
                "instance '{}' placed in {} but the VPC has no {} subnet there",
                instance.name, zone, instance.subnet_type
            ))
        })
}

fn name_tag(value: &str) -> Value {
    json!([{ "Key": "Name", "Value": value }])
}

fn subnet_prefix(allocation: &SubnetAllocation) -> String {
    logical_id(&[
        VPC_ID,
        &allocation.tier,
        "Subnet",
        &allocation.position.to_string(),
    ])
}

fn subnet_logical_id(allocation: &SubnetAllocation) -> String {
    format!("{}Subnet", subnet_prefix(allocation))
}

/// VPC, gateways, subnets and routing
fn build_network(
    graph: &mut ResourceGraph,
    definition: &StackDefinition,
    allocations: &[SubnetAllocation],
) -> TopologyResult<()> {
    let stack = &definition.name;

    graph.add_resource(
        VPC_ID,
        Resource::new(
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": definition.network.cidr.to_string(),
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
                "InstanceTenancy": "default",
                "Tags": name_tag(&format!("{}/{}", stack, VPC_ID)),
            }),
        )?,
    )?;

    let has_public = allocations.iter().any(|s| s.subnet_type == SubnetType::Public);
    let has_private = allocations.iter().any(|s| s.subnet_type == SubnetType::Private);
    let igw_id = logical_id(&[VPC_ID, "IGW"]);
    let attachment_id = logical_id(&[VPC_ID, "VPCGW"]);

    if has_public {
        graph.add_resource(
            igw_id.clone(),
            Resource::new(
                "AWS::EC2::InternetGateway",
                json!({ "Tags": name_tag(&format!("{}/{}", stack, VPC_ID)) }),
            )?,
        )?;
        graph.add_resource(
            attachment_id.clone(),
            Resource::new(
                "AWS::EC2::VPCGatewayAttachment",
                json!({
                    "VpcId": reference(VPC_ID),
                    "InternetGatewayId": reference(&igw_id),
                }),
            )?,
        )?;
    }

    // NAT gateways live in the first public tier, one per zone
    let nat_tier = allocations
        .iter()
        .find(|s| s.subnet_type == SubnetType::Public)
        .map(|s| s.tier.clone());
    let mut nat_by_zone: BTreeMap<String, String> = BTreeMap::new();

    for allocation in allocations {
        let prefix = subnet_prefix(allocation);
        let subnet_id = subnet_logical_id(allocation);
        let route_table_id = format!("{}RouteTable", prefix);
        let path = format!(
            "{}/{}/{}Subnet{}",
            stack, VPC_ID, allocation.tier, allocation.position
        );

        graph.add_resource(
            subnet_id.clone(),
            Resource::new(
                "AWS::EC2::Subnet",
                json!({
                    "CidrBlock": allocation.cidr.to_string(),
                    "VpcId": reference(VPC_ID),
                    "AvailabilityZone": allocation.availability_zone,
                    "MapPublicIpOnLaunch": allocation.subnet_type == SubnetType::Public,
                    "Tags": [
                        { "Key": "Name", "Value": path },
                        { "Key": "aws-cdk:subnet-name", "Value": allocation.tier },
                        { "Key": "aws-cdk:subnet-type", "Value": allocation.subnet_type.label() },
                    ],
                }),
            )?,
        )?;
        graph.add_resource(
            route_table_id.clone(),
            Resource::new(
                "AWS::EC2::RouteTable",
                json!({ "VpcId": reference(VPC_ID), "Tags": name_tag(&path) }),
            )?,
        )?;
        graph.add_resource(
            format!("{}RouteTableAssociation", prefix),
            Resource::new(
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({
                    "RouteTableId": reference(&route_table_id),
                    "SubnetId": reference(&subnet_id),
                }),
            )?,
        )?;

        if allocation.subnet_type == SubnetType::Public {
            graph.add_resource(
                format!("{}DefaultRoute", prefix),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "RouteTableId": reference(&route_table_id),
                        "DestinationCidrBlock": ANYWHERE,
                        "GatewayId": reference(&igw_id),
                    }),
                )?
                .depends_on(attachment_id.clone()),
            )?;

            if has_private && nat_tier.as_deref() == Some(allocation.tier.as_str()) {
                let eip_id = format!("{}EIP", prefix);
                let nat_id = format!("{}NATGateway", prefix);
                graph.add_resource(
                    eip_id.clone(),
                    Resource::new(
                        "AWS::EC2::EIP",
                        json!({ "Domain": "vpc", "Tags": name_tag(&path) }),
                    )?,
                )?;
                graph.add_resource(
                    nat_id.clone(),
                    Resource::new(
                        "AWS::EC2::NatGateway",
                        json!({
                            "AllocationId": get_att(&eip_id, "AllocationId"),
                            "SubnetId": reference(&subnet_id),
                            "Tags": name_tag(&path),
                        }),
                    )?,
                )?;
                nat_by_zone.insert(allocation.availability_zone.clone(), nat_id);
            }
        }
    }

    // private routes need the NAT of their zone, which exists only after the public pass
    for allocation in allocations
        .iter()
        .filter(|s| s.subnet_type == SubnetType::Private)
    {
        let prefix = subnet_prefix(allocation);
        let nat_id = nat_by_zone
            .get(&allocation.availability_zone)
            .ok_or_else(|| {
                TopologyError::ConstraintViolation(format!(
                    "no NAT gateway in {} for private subnet {}",
                    allocation.availability_zone,
                    subnet_logical_id(allocation)
                ))
            })?;
        graph.add_resource(
            format!("{}DefaultRoute", prefix),
            Resource::new(
                "AWS::EC2::Route",
                json!({
                    "RouteTableId": reference(&format!("{}RouteTable", prefix)),
                    "DestinationCidrBlock": ANYWHERE,
                    "NatGatewayId": reference(nat_id),
                }),
            )?,
        )?;
    }

    debug!("Built network: {} subnets", allocations.len());
    Ok(())
}

/// Returns the intrinsic resolving the group id
fn build_security_group(
    graph: &mut ResourceGraph,
    group: &SecurityGroupSpec,
) -> TopologyResult<Value> {
    let sg_id = logical_id(&[&group.name]);

    let ingress: Vec<Value> = group
        .ingress_rules()
        .iter()
        .map(|rule| {
            json!({
                "CidrIp": rule.source.to_string(),
                "Description": rule.description(),
                "FromPort": rule.port,
                "IpProtocol": rule.protocol.as_str(),
                "ToPort": rule.port,
            })
        })
        .collect();

    let mut properties = json!({
        "GroupDescription": group.description,
        "GroupName": group.name,
        "VpcId": reference(VPC_ID),
        "SecurityGroupIngress": ingress,
    });
    if group.allow_all_outbound {
        properties["SecurityGroupEgress"] = json!([{
            "CidrIp": ANYWHERE,
            "Description": "Allow all outbound traffic by default",
            "IpProtocol": "-1",
        }]);
    }

    graph.add_resource(sg_id.clone(), Resource::new("AWS::EC2::SecurityGroup", properties)?)?;
    debug!(
        "Built security group {} with {} ingress rules",
        group.name,
        group.ingress_rules().len()
    );
    Ok(get_att(&sg_id, "GroupId"))
}

/// Role, instance profile and instance; returns the instance's logical id
fn build_instance(
    graph: &mut ResourceGraph,
    env: &DeployEnvironment,
    definition: &StackDefinition,
    instance: &InstanceSpec,
    images: &BTreeMap<String, ResolvedImage>,
    allocations: &[SubnetAllocation],
    group_id: &Value,
) -> TopologyResult<String> {
    let instance_id = logical_id(&[&instance.name]);
    let role_id = logical_id(&[&instance.name, "InstanceRole"]);
    let profile_id = logical_id(&[&instance.name, "InstanceProfile"]);
    let path = format!("{}/{}", definition.name, instance.name);

    let profile = profile_of(definition, &instance.image_profile)?;
    let image = images.get(&profile.name).ok_or_else(|| {
        TopologyError::ConstraintViolation(format!(
            "image profile '{}' was not resolved",
            profile.name
        ))
    })?;

    let subnet = select_subnet(env, instance, allocations)?;
    let zone = subnet.availability_zone.as_str();

    graph.add_resource(
        role_id.clone(),
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "ec2.amazonaws.com" },
                    }],
                    "Version": "2012-10-17",
                },
                "Tags": name_tag(&path),
            }),
        )?,
    )?;
    graph.add_resource(
        profile_id.clone(),
        Resource::new(
            "AWS::IAM::InstanceProfile",
            json!({ "Roles": [reference(&role_id)] }),
        )?,
    )?;
    graph.add_resource(
        instance_id.clone(),
        Resource::new(
            "AWS::EC2::Instance",
            json!({
                "AvailabilityZone": zone,
                "IamInstanceProfile": reference(&profile_id),
                "ImageId": image.to_value(),
                "InstanceType": instance.instance_type.as_str(),
                "KeyName": instance.key_name,
                "SecurityGroupIds": [group_id],
                "SubnetId": reference(&subnet_logical_id(subnet)),
                "Tags": name_tag(&path),
                "UserData": { "Fn::Base64": profile.bootstrap.render() },
            }),
        )?
        .depends_on(role_id),
    )?;

    debug!("Built instance {} in {}", instance.name, zone);
    Ok(instance_id)
}

fn bind_output(
    declaration: &OutputDeclaration,
    instance_ids: &BTreeMap<String, String>,
    allocations: &[SubnetAllocation],
) -> TopologyResult<OutputBinding> {
    let target = match &declaration.value {
        OutputValue::InstancePublicIp { instance } => {
            let id = instance_ids.get(instance).ok_or_else(|| {
                TopologyError::ConstraintViolation(format!(
                    "output '{}' references unknown instance '{}'",
                    declaration.name, instance
                ))
            })?;
            AttributeRef::attribute(id.clone(), "PublicIp")
        }
        OutputValue::SubnetId { subnet_type, index } => {
            let subnet = allocations
                .iter()
                .filter(|s| s.subnet_type == *subnet_type)
                .nth(*index)
                .ok_or_else(|| {
                    TopologyError::ConstraintViolation(format!(
                        "output '{}' references {} subnet #{} which does not exist",
                        declaration.name, subnet_type, index
                    ))
                })?;
            AttributeRef::physical_id(subnet_logical_id(subnet))
        }
    };

    Ok(OutputBinding {
        name: declaration.name.clone(),
        logical_id: logical_id(&[&declaration.name]),
        target,
    })
}

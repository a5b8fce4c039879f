// Copyright (c) 2025 - Cowboy AI, Inc.
//! Evaluator Integration Tests
//!
//! Evaluates the benchmark stack end to end against cached lookups and
//! checks the shape of the resulting resource graph.

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use test_case::test_case;

use ec2_benchmark_topology::domain::SubnetType;
use ec2_benchmark_topology::graph::{get_att, reference};
use ec2_benchmark_topology::{
    benchmark_stack, ContextStore, DeployEnvironment, SynthesizedStack, TopologyError,
    TopologyEvaluator,
};

use fixtures::*;

fn evaluate(env: &DeployEnvironment, context: &ContextStore) -> Result<SynthesizedStack, TopologyError> {
    let definition = benchmark_stack(env)?;
    TopologyEvaluator::new(context).evaluate(env, &definition)
}

fn three_zone_stack() -> SynthesizedStack {
    evaluate(&environment(), &three_zone_context()).unwrap()
}

/// Test: 10.10.0.0/16 with /24 tiers across 3 zones gives 9 subnets
#[test]
fn test_nine_subnets_across_three_zones() {
    let stack = three_zone_stack();

    assert_eq!(stack.subnets.len(), 9);
    assert_eq!(
        stack.graph.resources_of_type("AWS::EC2::Subnet").count(),
        9
    );

    let cidrs: Vec<String> = stack.subnets.iter().map(|s| s.cidr.to_string()).collect();
    let expected: Vec<String> = (0..9).map(|i| format!("10.10.{}.0/24", i)).collect();
    assert_eq!(cidrs, expected);

    for (tier, subnet_type) in [
        ("private", SubnetType::Private),
        ("public", SubnetType::Public),
        ("isolated", SubnetType::Isolated),
    ] {
        let zones: Vec<&str> = stack
            .subnets
            .iter()
            .filter(|s| s.tier == tier)
            .inspect(|s| assert_eq!(s.subnet_type, subnet_type))
            .map(|s| s.availability_zone.as_str())
            .collect();
        assert_eq!(zones, THREE_ZONES.to_vec());
    }
}

/// Test: one security group, exactly the six benchmark ports from anywhere
#[test]
fn test_security_group_ingress() {
    let stack = three_zone_stack();

    let groups: Vec<_> = stack
        .graph
        .resources_of_type("AWS::EC2::SecurityGroup")
        .collect();
    assert_eq!(groups.len(), 1);

    let (_, group) = groups[0];
    let ingress = group.property("SecurityGroupIngress").unwrap().as_array().unwrap();
    assert_eq!(ingress.len(), 6);

    let ports: BTreeSet<u64> = ingress
        .iter()
        .map(|rule| {
            assert_eq!(rule["CidrIp"], "0.0.0.0/0");
            assert_eq!(rule["IpProtocol"], "tcp");
            assert_eq!(rule["FromPort"], rule["ToPort"]);
            rule["FromPort"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(ports, BTreeSet::from([22, 80, 3389, 5001, 5201, 49200]));

    assert_eq!(group.property("GroupName"), Some(&json!("pub_sg")));
}

/// Test: three instances in zones a/b/c, public tier, one shared group
#[test]
fn test_instance_placement() {
    let stack = three_zone_stack();

    let instances: Vec<_> = stack
        .graph
        .resources_of_type("AWS::EC2::Instance")
        .collect();
    assert_eq!(instances.len(), 3);

    let public_subnet_ids: Vec<String> = stack
        .graph
        .resources_of_type("AWS::EC2::Subnet")
        .filter(|(_, r)| r.property("MapPublicIpOnLaunch") == Some(&Value::Bool(true)))
        .map(|(id, _)| id.clone())
        .collect();
    assert_eq!(public_subnet_ids.len(), 3);

    for ((id, instance), (suffix, position)) in instances.iter().zip([("a", 1), ("b", 2), ("c", 3)]) {
        assert_eq!(id.as_str(), format!("pubinstance{}", suffix));
        assert_eq!(
            instance.property("AvailabilityZone"),
            Some(&json!(format!("us-east-1{}", suffix)))
        );
        assert_eq!(
            instance.property("SubnetId"),
            Some(&reference(&format!("vpcpublicSubnet{}Subnet", position)))
        );
        assert_eq!(
            instance.property("SecurityGroupIds"),
            Some(&json!([get_att("pubsg", "GroupId")]))
        );
        assert_eq!(instance.property("InstanceType"), Some(&json!("t3.micro")));
        assert_eq!(instance.property("KeyName"), Some(&json!("prod-us-east-1-keypair")));
        assert_eq!(instance.property("ImageId"), Some(&json!(UBUNTU_AMI)));
    }
}

/// Test: the six declared outputs bind to instance addresses and public subnets
#[test]
fn test_output_bindings() {
    let stack = three_zone_stack();
    let template = stack.template();

    assert_eq!(
        template["Outputs"],
        json!({
            "publicipinstancea": { "Value": { "Fn::GetAtt": ["pubinstancea", "PublicIp"] } },
            "publicipinstanceb": { "Value": { "Fn::GetAtt": ["pubinstanceb", "PublicIp"] } },
            "publicipinstancec": { "Value": { "Fn::GetAtt": ["pubinstancec", "PublicIp"] } },
            "publicsubneta": { "Value": { "Ref": "vpcpublicSubnet1Subnet" } },
            "publicsubnetsb": { "Value": { "Ref": "vpcpublicSubnet2Subnet" } },
            "publicsubnetsc": { "Value": { "Ref": "vpcpublicSubnet3Subnet" } },
        })
    );

    let names: Vec<&str> = stack.outputs().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "public-ip-instance-a",
            "public-ip-instance-b",
            "public-ip-instance-c",
            "public-subnet-a",
            "public-subnets-b",
            "public-subnets-c",
        ]
    );
}

/// Test: same configuration, same graph
#[test]
fn test_evaluation_is_idempotent() {
    let first = three_zone_stack();
    let second = three_zone_stack();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.template()).unwrap(),
        serde_json::to_string(&second.template()).unwrap()
    );
}

/// Test: a failing image lookup aborts before instances or outputs exist
#[test]
fn test_image_lookup_failure_aborts() {
    let lookup = ImageLookupDown::new(zones_for(REGION, 3));
    let env = environment();
    let definition = benchmark_stack(&env).unwrap();

    let err = TopologyEvaluator::new(&lookup)
        .evaluate(&env, &definition)
        .unwrap_err();

    assert!(matches!(err, TopologyError::ExternalLookupFailure { .. }));
    // one profile is referenced, so exactly one lookup was attempted
    assert_eq!(lookup.image_calls.get(), 1);
}

/// Test: no cached zones means no evaluation
#[test]
fn test_missing_zone_context() {
    let err = evaluate(&environment(), &ContextStore::new()).unwrap_err();
    match err {
        TopologyError::ExternalLookupFailure { key, .. } => {
            assert_eq!(key, "availability-zones:account=123456789012:region=us-east-1");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: regions with fewer than three zones cannot host instance c
#[test]
fn test_two_zone_region_rejects_third_instance() {
    let env = environment();
    let context = context_for(&env, &zones_for(REGION, 2));

    let err = evaluate(&env, &context).unwrap_err();
    assert!(matches!(err, TopologyError::ConstraintViolation(msg) if msg.contains("us-east-1c")));
}

#[test_case("us-east-1", 3, 9 ; "three zones")]
#[test_case("us-east-1", 4, 12 ; "four zones")]
#[test_case("ap-northeast-1", 3, 9 ; "tokyo")]
#[test_case("us-east-1", 6, 18 ; "six zones")]
fn test_subnet_count_follows_zone_count(region: &str, zones: usize, subnets: usize) {
    let env = DeployEnvironment::new(ACCOUNT, region).unwrap();
    let stack = evaluate(&env, &context_for(&env, &zones_for(region, zones))).unwrap();

    assert_eq!(stack.subnets.len(), subnets);
    assert_eq!(stack.availability_zones.len(), zones);
    assert_eq!(
        stack.graph.resources_of_type("AWS::EC2::NatGateway").count(),
        zones
    );
    assert_eq!(stack.graph.resources_of_type("AWS::EC2::Instance").count(), 3);
}

/// Test: max_azs caps the zones spanned
#[test]
fn test_max_azs_caps_zones() {
    let env = environment();
    let mut definition = benchmark_stack(&env).unwrap();
    definition.network = definition.network.clone().with_max_azs(3);

    let context = context_for(&env, &zones_for(REGION, 6));
    let stack = TopologyEvaluator::new(&context)
        .evaluate(&env, &definition)
        .unwrap();

    assert_eq!(stack.availability_zones, zones_for(REGION, 3));
    assert_eq!(stack.subnets.len(), 9);
}

/// Test: empty environment identifiers are rejected by the evaluator too
#[test]
fn test_empty_environment_rejected() {
    let env = DeployEnvironment {
        account: String::new(),
        region: REGION.to_string(),
    };
    let definition = benchmark_stack(&environment()).unwrap();
    let err = TopologyEvaluator::new(&three_zone_context())
        .evaluate(&env, &definition)
        .unwrap_err();
    assert!(matches!(err, TopologyError::MissingConfiguration(_)));
}

/// Test: the rendered template is self-consistent
#[test]
fn test_template_references_resolve() {
    let stack = three_zone_stack();
    stack.graph.validate_references().unwrap();

    let template = stack.template();
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert!(template.get("Parameters").is_none());
    assert_eq!(
        template["Resources"]["vpc"]["Properties"]["CidrBlock"],
        "10.10.0.0/16"
    );
    assert_eq!(
        template["Resources"]["vpcpublicSubnet1DefaultRoute"]["DependsOn"],
        json!(["vpcVPCGW"])
    );
}

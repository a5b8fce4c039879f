// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Evaluation
//!
//! For any account, any region and any zone count of at least three, the
//! benchmark stack evaluates to the same fixed shape, and evaluating twice
//! yields identical graphs.

use proptest::prelude::*;
use std::collections::BTreeSet;

use ec2_benchmark_topology::{benchmark_stack, DeployEnvironment, TopologyEvaluator};

use crate::fixtures::{context_for, zones_for};

// ============================================================================
// Strategies
// ============================================================================

fn account() -> impl Strategy<Value = String> {
    "[0-9]{12}"
}

fn region() -> impl Strategy<Value = String> {
    ("(us|eu|ap|sa|ca|me|af)", "(north|south|east|west|central|northeast|southeast)", 1u8..5)
        .prop_map(|(area, direction, n)| format!("{}-{}-{}", area, direction, n))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: 3 tiers x N zones subnets, 1 group with 6 rules, 3 instances
    #[test]
    fn prop_stack_shape(account in account(), region in region(), zones in 3usize..=6) {
        let env = DeployEnvironment::new(account, region.clone()).unwrap();
        let context = context_for(&env, &zones_for(&region, zones));
        let definition = benchmark_stack(&env).unwrap();

        let stack = TopologyEvaluator::new(&context).evaluate(&env, &definition).unwrap();

        prop_assert_eq!(stack.subnets.len(), 3 * zones);
        prop_assert_eq!(stack.graph.resources_of_type("AWS::EC2::Subnet").count(), 3 * zones);

        let groups: Vec<_> = stack.graph.resources_of_type("AWS::EC2::SecurityGroup").collect();
        prop_assert_eq!(groups.len(), 1);
        let ingress = groups[0].1.property("SecurityGroupIngress").unwrap().as_array().unwrap();
        prop_assert_eq!(ingress.len(), 6);

        let instance_zones: BTreeSet<String> = stack
            .graph
            .resources_of_type("AWS::EC2::Instance")
            .map(|(_, r)| r.property("AvailabilityZone").unwrap().as_str().unwrap().to_string())
            .collect();
        let expected: BTreeSet<String> =
            ["a", "b", "c"].iter().map(|s| format!("{}{}", region, s)).collect();
        prop_assert_eq!(instance_zones, expected);

        prop_assert_eq!(stack.outputs().len(), 6);
        prop_assert!(stack.graph.validate_references().is_ok());
    }

    /// Property: evaluation is deterministic
    #[test]
    fn prop_evaluation_is_idempotent(account in account(), region in region(), zones in 3usize..=6) {
        let env = DeployEnvironment::new(account, region.clone()).unwrap();
        let context = context_for(&env, &zones_for(&region, zones));
        let definition = benchmark_stack(&env).unwrap();
        let evaluator = TopologyEvaluator::new(&context);

        let first = evaluator.evaluate(&env, &definition).unwrap();
        let second = evaluator.evaluate(&env, &definition).unwrap();

        prop_assert_eq!(first.template(), second.template());
        prop_assert_eq!(first, second);
    }

    /// Property: fewer than three zones always fails, never yields a partial stack
    #[test]
    fn prop_too_few_zones_fail(account in account(), region in region(), zones in 1usize..3) {
        let env = DeployEnvironment::new(account, region.clone()).unwrap();
        let context = context_for(&env, &zones_for(&region, zones));
        let definition = benchmark_stack(&env).unwrap();

        prop_assert!(TopologyEvaluator::new(&context).evaluate(&env, &definition).is_err());
    }
}

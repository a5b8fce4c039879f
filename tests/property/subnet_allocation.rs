// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Subnet Allocation
//!
//! Allocated subnets never overlap, always lie inside the VPC block, and
//! appear exactly once per tier per zone.

use proptest::prelude::*;

use ec2_benchmark_topology::domain::{
    Ipv4Cidr, NetworkTopology, SubnetConfiguration, SubnetType,
};

fn subnet_type() -> impl Strategy<Value = SubnetType> {
    prop_oneof![
        Just(SubnetType::Public),
        Just(SubnetType::Private),
        Just(SubnetType::Isolated),
    ]
}

/// 1-4 tiers with masks /20-/28, always including a public tier
fn tiers() -> impl Strategy<Value = Vec<SubnetConfiguration>> {
    prop::collection::vec((subnet_type(), 20u8..=28), 0..4).prop_map(|extra| {
        let mut tiers = vec![SubnetConfiguration::new("public", SubnetType::Public, 24)];
        tiers.extend(
            extra
                .into_iter()
                .enumerate()
                .map(|(i, (kind, mask))| SubnetConfiguration::new(format!("tier{}", i), kind, mask)),
        );
        tiers
    })
}

fn zones(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("zone-{}", i)).collect()
}

proptest! {
    #[test]
    fn prop_allocations_are_disjoint_and_contained(
        tiers in tiers(),
        zone_count in 1usize..=6,
    ) {
        let vpc = Ipv4Cidr::new("10.10.0.0/16").unwrap();
        let topology = NetworkTopology::new(vpc, tiers.clone());
        let zones = zones(zone_count);

        // validation walks the same aligned layout as allocation, so the two
        // always agree, gaps between mixed masks included
        let validated = topology.validate(zone_count);
        let allocated = topology.allocate(&zones);
        prop_assert_eq!(validated.is_ok(), allocated.is_ok());
        let subnets = match allocated {
            Ok(subnets) => subnets,
            Err(err) => {
                prop_assert_eq!(Err(err), validated);
                return Ok(());
            }
        };

        prop_assert_eq!(subnets.len(), tiers.len() * zone_count);
        for (i, a) in subnets.iter().enumerate() {
            prop_assert!(vpc.contains(&a.cidr));
            for b in &subnets[i + 1..] {
                prop_assert!(!a.cidr.overlaps(&b.cidr), "{} overlaps {}", a.cidr, b.cidr);
            }
        }

        for tier in &tiers {
            let in_tier: Vec<_> = subnets.iter().filter(|s| s.tier == tier.name).collect();
            prop_assert_eq!(in_tier.len(), zone_count);
            for (position, subnet) in in_tier.iter().enumerate() {
                prop_assert_eq!(subnet.position, position + 1);
                prop_assert_eq!(&subnet.availability_zone, &zones[position]);
                prop_assert_eq!(subnet.cidr.prefix_length(), tier.cidr_mask);
            }
        }
    }

    #[test]
    fn prop_validation_matches_address_budget(mask in 16u8..=28, zone_count in 1usize..=8) {
        let vpc = Ipv4Cidr::new("10.10.0.0/16").unwrap();
        let topology = NetworkTopology::new(
            vpc,
            vec![
                SubnetConfiguration::new("private", SubnetType::Private, mask),
                SubnetConfiguration::new("public", SubnetType::Public, mask),
                SubnetConfiguration::new("isolated", SubnetType::Isolated, mask),
            ],
        );

        let needed = 3 * zone_count as u64 * (1u64 << (32 - mask));
        prop_assert_eq!(topology.validate(zone_count).is_ok(), needed <= vpc.size());
    }
}

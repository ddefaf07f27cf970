//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use maplit::btreeset;
use nlsr::route;

use super::*;

const ROUTER_A: &str = "/ndn/site/%C1.Router/this-router";
const ROUTER_B: &str = "/ndn/site/%C1.Router/b";
const ROUTER_C: &str = "/ndn/site/%C1.Router/c";
const ROUTER_D: &str = "/ndn/site/%C1.Router/d";

const FACE_A: &str = "udp4://10.0.0.1";
const FACE_B: &str = "udp4://10.0.0.2";
const FACE_C: &str = "udp4://10.0.0.3";
const FACE_D: &str = "udp4://10.0.0.4";

const LINK_AB_COST: u64 = 5;
const LINK_AC_COST: u64 = 10;
const LINK_BC_COST: u64 = 17;

// Triangle topology with routers A (local), B and C.
fn setup_triangle() -> TestRouter {
    let mut router = new_router(ROUTER_A);
    router.install(adj_lsa(
        ROUTER_A,
        1,
        &[(ROUTER_B, FACE_B, LINK_AB_COST), (ROUTER_C, FACE_C, LINK_AC_COST)],
    ));
    router.install(adj_lsa(
        ROUTER_B,
        1,
        &[(ROUTER_A, FACE_A, LINK_AB_COST), (ROUTER_C, FACE_C, LINK_BC_COST)],
    ));
    router.install(adj_lsa(
        ROUTER_C,
        1,
        &[(ROUTER_A, FACE_A, LINK_AC_COST), (ROUTER_B, FACE_B, LINK_BC_COST)],
    ));
    router.drain_ibus();
    router
}

#[test]
fn multicast_triangle() {
    let mut router = setup_triangle();
    let destinations =
        btreeset![name(ROUTER_A), name(ROUTER_B), name(ROUTER_C)];

    let (instance, arenas) = router.instance.as_up();
    let nexthops = route::calculate_multicast_nexthops(
        instance.config,
        &destinations,
        &instance.state.lsdb,
        &arenas.lsa_entries,
    );

    assert_eq!(nexthops.len(), 2);
    for nexthop in nexthops.iter() {
        assert!(nexthop.face_uri == FACE_B || nexthop.face_uri == FACE_C);
    }
}

#[test]
fn unicast_triangle() {
    let mut router = setup_triangle();
    router.run_routing_calc();

    let table = &router.instance.state.routing_table;
    let entry_b = table.get(&name(ROUTER_B)).unwrap();
    assert_eq!(entry_b.nexthops.len(), 1);
    let hop = entry_b.nexthops.iter().next().unwrap();
    assert_eq!(hop.face_uri, FACE_B);
    assert_eq!(hop.cost, 5.0);

    // The direct link beats the two-hop detour through B.
    let entry_c = table.get(&name(ROUTER_C)).unwrap();
    assert_eq!(entry_c.nexthops.len(), 1);
    let hop = entry_c.nexthops.iter().next().unwrap();
    assert_eq!(hop.face_uri, FACE_C);
    assert_eq!(hop.cost, 10.0);
}

#[test]
fn unicast_equal_cost_multipath() {
    // Square topology: two equal-cost paths from A to D.
    let mut router = new_router(ROUTER_A);
    router.install(adj_lsa(
        ROUTER_A,
        1,
        &[(ROUTER_B, FACE_B, 1), (ROUTER_C, FACE_C, 1)],
    ));
    router.install(adj_lsa(
        ROUTER_B,
        1,
        &[(ROUTER_A, FACE_A, 1), (ROUTER_D, FACE_D, 1)],
    ));
    router.install(adj_lsa(
        ROUTER_C,
        1,
        &[(ROUTER_A, FACE_A, 1), (ROUTER_D, FACE_D, 1)],
    ));
    router.install(adj_lsa(
        ROUTER_D,
        1,
        &[(ROUTER_B, FACE_B, 1), (ROUTER_C, FACE_C, 1)],
    ));
    router.drain_ibus();
    router.run_routing_calc();

    let table = &router.instance.state.routing_table;
    let entry = table.get(&name(ROUTER_D)).unwrap();
    assert_eq!(entry.nexthops.len(), 2);

    // Ties are broken by ascending face URI.
    let faces = entry
        .nexthops
        .iter()
        .map(|nexthop| nexthop.face_uri.as_str())
        .collect::<Vec<_>>();
    assert_eq!(faces, vec![FACE_B, FACE_C]);
    for nexthop in entry.nexthops.iter() {
        assert_eq!(nexthop.cost, 2.0);
    }
}

#[test]
fn asymmetric_costs_drop_the_link() {
    let mut router = new_router(ROUTER_A);
    router.install(adj_lsa(ROUTER_A, 1, &[(ROUTER_B, FACE_B, 5)]));
    router.install(adj_lsa(ROUTER_B, 1, &[(ROUTER_A, FACE_A, 6)]));
    router.drain_ibus();
    router.run_routing_calc();

    assert!(router.instance.state.routing_table.get(&name(ROUTER_B)).is_none());
}

#[test]
fn one_way_adjacency_unused() {
    let mut router = new_router(ROUTER_A);
    router.install(adj_lsa(ROUTER_A, 1, &[(ROUTER_B, FACE_B, 5)]));
    router.install(adj_lsa(ROUTER_B, 1, &[]));
    router.drain_ibus();
    router.run_routing_calc();

    assert!(router.instance.state.routing_table.get(&name(ROUTER_B)).is_none());
}

#[test]
fn hyperbolic_distance_oracle() {
    let mut router = new_router(ROUTER_A);
    router.install(coordinate_lsa(ROUTER_A, 1, 10.0, &[0.0]));
    router.install(coordinate_lsa(ROUTER_B, 1, 10.0, &[std::f64::consts::PI]));
    router.drain_ibus();

    let (instance, arenas) = router.instance.as_up();
    let lsdb = &instance.state.lsdb;

    assert_eq!(
        route::hyperbolic_distance(
            lsdb,
            &arenas.lsa_entries,
            &name(ROUTER_A),
            &name(ROUTER_A)
        ),
        Some(0.0)
    );

    // Antipodal points on the disk: the distance approaches r1 + r2.
    let distance = route::hyperbolic_distance(
        lsdb,
        &arenas.lsa_entries,
        &name(ROUTER_A),
        &name(ROUTER_B),
    )
    .unwrap();
    assert!((distance - 20.0).abs() < 0.01);

    // No coordinates, no distance.
    assert!(
        route::hyperbolic_distance(
            lsdb,
            &arenas.lsa_entries,
            &name(ROUTER_A),
            &name(ROUTER_C)
        )
        .is_none()
    );
}

#[test]
fn hyperbolic_routing_table() {
    let mut config = nlsr::config::InstanceCfg::default();
    config.hyperbolic_routing = true;
    let mut router = new_router_with_config(ROUTER_A, config);

    router.install(adj_lsa(ROUTER_A, 1, &[(ROUTER_B, FACE_B, 1)]));
    router.install(adj_lsa(ROUTER_B, 1, &[(ROUTER_A, FACE_A, 1)]));
    router.install(coordinate_lsa(ROUTER_A, 1, 10.0, &[0.0]));
    router.install(coordinate_lsa(ROUTER_B, 1, 10.0, &[1.0]));
    router.drain_ibus();
    router.run_routing_calc();

    let table = &router.instance.state.routing_table;
    let entry = table.get(&name(ROUTER_B)).unwrap();
    assert_eq!(entry.nexthops.len(), 1);
    assert_eq!(entry.nexthops.iter().next().unwrap().face_uri, FACE_B);
}

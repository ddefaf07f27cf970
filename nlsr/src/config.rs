//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::path::PathBuf;

use nlsr_utils::name::Name;

// Instance configuration.
//
// The configuration file parsing and the CLI live outside this crate; the
// embedding daemon fills this struct and hands it over on instance creation.
#[derive(Clone, Debug)]
pub struct InstanceCfg {
    // Name of the local router.
    pub router_name: Name,
    // Prefix under which LSAs are fetched and sync updates are announced.
    pub chronosync_lsa_prefix: Name,
    // LSA fetch deadline, in milliseconds.
    pub interest_resend_time: u32,
    // Delay between a topology change and the routing recalculation, in
    // milliseconds. Multiple changes within the window coalesce into a
    // single run.
    pub routing_calc_interval: u32,
    // Refresh interval for self-originated LSAs, in seconds. Originated
    // LSAs carry twice this value as their lifetime.
    pub lsa_refresh_time: u32,
    // Whether multicast name prefixes are processed.
    pub multicast_routing: bool,
    // Whether the hyperbolic distance oracle replaces link-state distances.
    pub hyperbolic_routing: bool,
    // Name prefixes advertised by the local router at startup.
    pub advertised_names: BTreeSet<Name>,
    pub advertised_mc_names: BTreeSet<Name>,
    // Local hyperbolic coordinates (radius, angles).
    pub coordinates: Option<(f64, Vec<f64>)>,
    // Directory holding the sequence number file.
    pub state_dir: PathBuf,
}

// ===== impl InstanceCfg =====

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            router_name: Name::default(),
            chronosync_lsa_prefix: Name::from_uri("/ndn/NLSR/LSA").unwrap(),
            interest_resend_time: 5000,
            routing_calc_interval: 15000,
            lsa_refresh_time: 1800,
            multicast_routing: true,
            hyperbolic_routing: false,
            advertised_names: Default::default(),
            advertised_mc_names: Default::default(),
            coordinates: None,
            state_dir: PathBuf::from("/var/lib/nlsr"),
        }
    }
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use maplit::btreeset;
use nlsr::lsdb::{InstallOutcome, LsdbUpdate};
use nlsr::packet::consts::LsaType;
use nlsr::tasks::messages::input::{
    AdjacencyStatusMsg, LsaRefreshMsg, LsaRxMsg, PrefixUpdateMsg, ProtocolMsg,
};

use super::*;

const ROUTER: &str = "/ndn/site/%C1.Router/this-router";
const ORIGIN: &str = "/ndn/site/%C1.Router/remote";

#[test]
fn install_update_diff() {
    let mut router = new_router(ROUTER);

    let outcome = router.install(name_lsa(ORIGIN, 1, &["/n1", "/n2"], &[]));
    assert_eq!(outcome, InstallOutcome::Installed);

    // A fresher advertisement yields the set difference quadruple.
    let outcome = router.install(name_lsa(ORIGIN, 2, &["/n1", "/n3"], &[]));
    let InstallOutcome::Updated(diff) = outcome else {
        panic!("expected an update, got {outcome:?}");
    };
    assert_eq!(diff.add, btreeset![name("/n3")]);
    assert_eq!(diff.remove, btreeset![name("/n2")]);
    assert!(diff.mc_add.is_empty());
    assert!(diff.mc_remove.is_empty());

    // The stored name set equals the last non-removed advertisement.
    let key = LsaKey::new(name(ORIGIN), LsaType::Name);
    let (instance, arenas) = router.instance.as_up();
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    let lsa = lse.data.as_name().unwrap();
    assert_eq!(lsa.names, btreeset![name("/n1"), name("/n3")]);
}

#[test]
fn stale_seqno_ignored() {
    let mut router = new_router(ROUTER);

    router.install(name_lsa(ORIGIN, 5, &["/n1"], &[]));

    // Neither an equal nor a lower sequence number changes LSDB state.
    for seqno in [5, 4, 1] {
        let outcome = router.install(name_lsa(ORIGIN, seqno, &["/other"], &[]));
        assert_eq!(outcome, InstallOutcome::Stale);
    }

    let key = LsaKey::new(name(ORIGIN), LsaType::Name);
    let (instance, arenas) = router.instance.as_up();
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(lse.data.hdr().seqno, 5);
    assert_eq!(lse.data.as_name().unwrap().names, btreeset![name("/n1")]);
}

#[test]
fn malformed_lsa_rejected() {
    let mut router = new_router(ROUTER);
    let outcome = router.install(name_lsa("/", 1, &["/n1"], &[]));
    assert_eq!(outcome, InstallOutcome::Rejected);
}

#[test]
fn removal_carries_prior_names() {
    let mut router = new_router(ROUTER);

    router.install(name_lsa(ORIGIN, 1, &["/n1", "/n2"], &["/video"]));
    let IbusMsg::LsdbEvent { kind, .. } = router.rx.ibus.try_recv().unwrap()
    else {
        panic!("expected an LSDB event");
    };
    assert_eq!(kind, LsdbUpdate::Installed);

    let key = LsaKey::new(name(ORIGIN), LsaType::Name);
    assert!(router.remove(&key));

    // Consumers receive the full prior LSA so they can diff against empty.
    let IbusMsg::LsdbEvent { lsa, kind, .. } =
        router.rx.ibus.try_recv().unwrap()
    else {
        panic!("expected an LSDB event");
    };
    assert_eq!(kind, LsdbUpdate::Removed);
    let lsa = lsa.as_name().unwrap();
    assert_eq!(lsa.names, btreeset![name("/n1"), name("/n2")]);
    assert_eq!(lsa.mc_names, btreeset![name("/video")]);

    // Removing it twice is a no-op.
    assert!(!router.remove(&key));
}

#[test]
fn originate_initial_lsas() {
    let mut config = InstanceCfg::default();
    config.state_dir = temp_state_dir("originate");
    config.advertised_names = btreeset![name("/ndn/site/service")];
    let mut router = new_router_with_config(ROUTER, config);

    router.instance.start().unwrap();

    // The local NameLSA and AdjacencyLSA are in the LSDB at sequence 1.
    let (instance, arenas) = router.instance.as_up();
    for lsa_type in [LsaType::Name, LsaType::Adjacency] {
        let key = LsaKey::new(name(ROUTER), lsa_type);
        let (_, lse) =
            instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
        assert_eq!(lse.data.hdr().seqno, 1);
    }
    let key = LsaKey::new(name(ROUTER), LsaType::Name);
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(
        lse.data.as_name().unwrap().names,
        btreeset![name("/ndn/site/service")]
    );

    // Each origination publishes the combined sequence number.
    let publishes = router
        .drain_output()
        .into_iter()
        .filter(|msg| matches!(msg, ProtocolOutputMsg::SyncPublish(_)))
        .count();
    assert_eq!(publishes, 2);
}

#[test]
fn refresh_bumps_seqno() {
    let mut config = InstanceCfg::default();
    config.state_dir = temp_state_dir("refresh");
    let mut router = new_router_with_config(ROUTER, config);
    router.instance.start().unwrap();

    let key = LsaKey::new(name(ROUTER), LsaType::Name);
    let lse_id = {
        let (instance, arenas) = router.instance.as_up();
        let (_, lse) =
            instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
        lse.id
    };

    router
        .instance
        .process_protocol_msg(ProtocolMsg::LsaRefresh(LsaRefreshMsg {
            lse_key: lse_id.into(),
        }));

    let (instance, arenas) = router.instance.as_up();
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(lse.data.hdr().seqno, 2);
    assert_eq!(instance.state.seqmgr.name_seq, 2);
}

#[test]
fn adjacency_change_reoriginates() {
    let mut config = InstanceCfg::default();
    config.state_dir = temp_state_dir("adjacency");
    let mut router = new_router_with_config(ROUTER, config);
    router.instance.start().unwrap();

    let neighbor = "/ndn/site/%C1.Router/b";
    router.instance.process_protocol_msg(ProtocolMsg::AdjacencyStatus(
        AdjacencyStatusMsg {
            neighbor: name(neighbor),
            face_uri: "udp4://10.0.0.2".to_owned(),
            cost: 25,
            up: true,
        },
    ));

    let key = LsaKey::new(name(ROUTER), LsaType::Adjacency);
    {
        let (instance, arenas) = router.instance.as_up();
        let (_, lse) =
            instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
        assert_eq!(lse.data.hdr().seqno, 2);
        let lsa = lse.data.as_adjacency().unwrap();
        assert_eq!(lsa.adjacencies.len(), 1);
        assert_eq!(lsa.adjacencies[0].neighbor, name(neighbor));
        assert_eq!(lsa.adjacencies[0].cost, 25);
    }

    // The adjacency going down leaves the advertisement empty.
    router.instance.process_protocol_msg(ProtocolMsg::AdjacencyStatus(
        AdjacencyStatusMsg {
            neighbor: name(neighbor),
            face_uri: "udp4://10.0.0.2".to_owned(),
            cost: 25,
            up: false,
        },
    ));
    let (instance, arenas) = router.instance.as_up();
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(lse.data.hdr().seqno, 3);
    assert!(lse.data.as_adjacency().unwrap().adjacencies.is_empty());
}

#[test]
fn prefix_update_reoriginates() {
    let mut config = InstanceCfg::default();
    config.state_dir = temp_state_dir("prefix-update");
    let mut router = new_router_with_config(ROUTER, config);
    router.instance.start().unwrap();

    router.instance.process_protocol_msg(ProtocolMsg::PrefixUpdate(
        PrefixUpdateMsg {
            name: name("/ndn/site/service"),
            multicast: false,
            advertise: true,
        },
    ));

    let key = LsaKey::new(name(ROUTER), LsaType::Name);
    {
        let (instance, arenas) = router.instance.as_up();
        let (_, lse) =
            instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
        assert_eq!(lse.data.hdr().seqno, 2);
        assert_eq!(
            lse.data.as_name().unwrap().names,
            btreeset![name("/ndn/site/service")]
        );
    }

    // Advertising the same prefix again changes nothing.
    router.instance.process_protocol_msg(ProtocolMsg::PrefixUpdate(
        PrefixUpdateMsg {
            name: name("/ndn/site/service"),
            multicast: false,
            advertise: true,
        },
    ));
    let (instance, arenas) = router.instance.as_up();
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(lse.data.hdr().seqno, 2);
}

#[test]
fn restart_continues_sequence() {
    let dir = temp_state_dir("restart");
    std::fs::write(dir.join("sequence.txt"), format!("{}\n", 5u64 << 40 | 2 << 20))
        .unwrap();

    let mut config = InstanceCfg::default();
    config.state_dir = dir;
    let mut router = new_router_with_config(ROUTER, config);
    router.instance.start().unwrap();

    // The restarted router picks up past its last published sequences.
    let (instance, arenas) = router.instance.as_up();
    for (lsa_type, seqno) in [(LsaType::Name, 6), (LsaType::Adjacency, 3)] {
        let key = LsaKey::new(name(ROUTER), lsa_type);
        let (_, lse) =
            instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
        assert_eq!(lse.data.hdr().seqno, seqno);
    }
}

#[test]
fn own_lsa_echo_reoriginates() {
    let mut config = InstanceCfg::default();
    config.state_dir = temp_state_dir("echo");
    let mut router = new_router_with_config(ROUTER, config);
    router.instance.start().unwrap();

    // A stale instance of this router published sequence 7; ours is 1.
    let echoed = name_lsa(ROUTER, 7, &["/stale"], &[]);
    router
        .instance
        .process_protocol_msg(ProtocolMsg::LsaRx(LsaRxMsg {
            interest_name: name("/ndn/NLSR/LSA"),
            bytes: echoed.encode(),
        }));

    // The local advertisement jumped past the echoed sequence number.
    let (instance, arenas) = router.instance.as_up();
    let key = LsaKey::new(name(ROUTER), LsaType::Name);
    let (_, lse) = instance.state.lsdb.get(&arenas.lsa_entries, &key).unwrap();
    assert_eq!(lse.data.hdr().seqno, 8);
    assert!(lse.data.as_name().unwrap().names.is_empty());
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use nlsr::fib::Fib;
use nlsr::ibus::IbusMsg;
use nlsr::tasks::messages::ProtocolOutputMsg;
use nlsr::tasks::messages::input::FibRetryMsg;
use nlsr_utils::southbound::{FibCommandMsg, FibOp};
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;

use super::*;

struct TestFib {
    fib: Fib,
    output_rx: UnboundedReceiver<ProtocolOutputMsg>,
    retry_rx: UnboundedReceiver<FibRetryMsg>,
    ibus_rx: UnboundedReceiver<IbusMsg>,
}

fn new_fib() -> TestFib {
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let (retry_tx, retry_rx) = mpsc::unbounded_channel();
    let (ibus_tx, ibus_rx) = mpsc::unbounded_channel();
    TestFib {
        fib: Fib::new(output_tx, retry_tx, ibus_tx),
        output_rx,
        retry_rx,
        ibus_rx,
    }
}

impl TestFib {
    fn commands(&mut self) -> Vec<FibCommandMsg> {
        let mut commands = vec![];
        while let Ok(msg) = self.output_rx.try_recv() {
            let ProtocolOutputMsg::FibCommand(msg) = msg else {
                panic!("unexpected output message");
            };
            commands.push(msg);
        }
        commands
    }
}

#[test]
fn update_registers_nexthops() {
    let mut fib = new_fib();

    fib.fib.update(
        name("/prefix"),
        &nexthops(&[("udp4://10.0.0.1", 10.0), ("udp4://10.0.0.2", 20.0)]),
    );
    let commands = fib.commands();
    assert_eq!(commands.len(), 2);
    for command in &commands {
        assert!(matches!(command.op, FibOp::RegisterNexthop { .. }));
    }
    assert_eq!(fib.fib.entries[&name("/prefix")].version, 0);
}

#[test]
fn update_is_idempotent() {
    let mut fib = new_fib();
    let hops = nexthops(&[("udp4://10.0.0.1", 10.0)]);

    fib.fib.update(name("/prefix"), &hops);
    fib.commands();

    // Same next hops: no wire traffic, no version bump.
    fib.fib.update(name("/prefix"), &hops);
    assert!(fib.commands().is_empty());
    assert_eq!(fib.fib.entries[&name("/prefix")].version, 0);
}

#[test]
fn update_emits_minimal_diff() {
    let mut fib = new_fib();

    fib.fib.update(
        name("/prefix"),
        &nexthops(&[("udp4://10.0.0.1", 10.0), ("udp4://10.0.0.2", 20.0)]),
    );
    fib.commands();

    // Face .1 keeps its cost, face .2 disappears, face .3 shows up.
    fib.fib.update(
        name("/prefix"),
        &nexthops(&[("udp4://10.0.0.1", 10.0), ("udp4://10.0.0.3", 30.0)]),
    );
    let commands = fib.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands.iter().any(|command| matches!(
        &command.op,
        FibOp::RegisterNexthop { face_uri, .. } if face_uri == "udp4://10.0.0.3"
    )));
    assert!(commands.iter().any(|command| matches!(
        &command.op,
        FibOp::UnregisterNexthop { face_uri, .. } if face_uri == "udp4://10.0.0.2"
    )));
    assert_eq!(fib.fib.entries[&name("/prefix")].version, 1);
}

#[test]
fn remove_unregisters_everything() {
    let mut fib = new_fib();

    fib.fib.update(
        name("/prefix"),
        &nexthops(&[("udp4://10.0.0.1", 10.0), ("udp4://10.0.0.2", 20.0)]),
    );
    fib.commands();

    fib.fib.remove(&name("/prefix"));
    let commands = fib.commands();
    assert_eq!(commands.len(), 2);
    for command in &commands {
        assert!(matches!(command.op, FibOp::UnregisterNexthop { .. }));
    }

    // Removing an absent prefix produces no wire traffic.
    fib.fib.remove(&name("/prefix"));
    assert!(fib.commands().is_empty());
}

#[test]
fn command_retries_are_bounded() {
    let mut fib = new_fib();

    fib.fib
        .update(name("/prefix"), &nexthops(&[("udp4://10.0.0.1", 10.0)]));
    let command = fib.commands().remove(0);
    let id = command.id;

    // Three failed attempts are retried with backoff.
    for attempt in 2..=4u8 {
        assert!(!fib.fib.process_response(id, false));
        fib.fib.process_retry(id);
        assert_eq!(fib.fib.pending[&id].attempts, attempt);
        assert_eq!(fib.commands().len(), 1);
    }

    // The fourth failure exhausts the retries: the command is dropped
    // and reported.
    assert!(fib.fib.process_response(id, false));
    assert!(!fib.fib.pending.contains_key(&id));
    assert!(matches!(
        fib.ibus_rx.try_recv(),
        Ok(IbusMsg::FibCommandFailed { .. })
    ));

    // A success acknowledgment clears a pending command.
    fib.fib
        .update(name("/other"), &nexthops(&[("udp4://10.0.0.1", 10.0)]));
    let command = fib.commands().remove(0);
    assert!(!fib.fib.process_response(command.id, true));
    assert!(fib.fib.pending.is_empty());
}

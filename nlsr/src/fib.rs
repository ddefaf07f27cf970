//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};

use nlsr_utils::name::Name;
use nlsr_utils::southbound::{CommandId, FibCommandMsg, FibOp};
use nlsr_utils::task::TimeoutTask;
use tokio::sync::mpsc::UnboundedSender;

use crate::debug::Debug;
use crate::error::Error;
use crate::ibus::{IbusMsg, IbusSender};
use crate::route::NexthopList;
use crate::tasks;
use crate::tasks::messages::input::FibRetryMsg;
use crate::tasks::messages::ProtocolOutputMsg;

// Base interval of the exponential backoff between command retries.
const RETRY_BASE_INTERVAL: u64 = 500;
// Maximum number of times a command is sent before giving up.
const MAX_COMMAND_ATTEMPTS: u8 = 4;

// FIB projector.
//
// Keeps a versioned record per name prefix and expresses every change as
// the minimal sequence of register/unregister commands toward the external
// forwarder. Repeated updates with unchanged next hops produce no wire
// traffic.
#[derive(Debug)]
pub struct Fib {
    pub entries: BTreeMap<Name, FibEntry>,
    pub pending: HashMap<CommandId, PendingCommand>,
    next_command_id: CommandId,
    proto_output_tx: UnboundedSender<ProtocolOutputMsg>,
    fib_retryp: UnboundedSender<FibRetryMsg>,
    ibus_tx: IbusSender,
}

// Projected state for one name prefix.
#[derive(Debug)]
pub struct FibEntry {
    pub name: Name,
    pub nexthops: NexthopList,
    pub version: u64,
}

// Command awaiting a forwarder acknowledgment.
#[derive(Debug)]
pub struct PendingCommand {
    pub op: FibOp,
    pub attempts: u8,
    pub retry_timer: Option<TimeoutTask>,
}

// ===== impl Fib =====

impl Fib {
    pub fn new(
        proto_output_tx: UnboundedSender<ProtocolOutputMsg>,
        fib_retryp: UnboundedSender<FibRetryMsg>,
        ibus_tx: IbusSender,
    ) -> Fib {
        Fib {
            entries: Default::default(),
            pending: Default::default(),
            next_command_id: 0,
            proto_output_tx,
            fib_retryp,
            ibus_tx,
        }
    }

    // Replaces the next hops registered for the prefix.
    pub fn update(&mut self, name: Name, nexthops: &NexthopList) {
        let old = self.entries.get(&name);
        if let Some(entry) = old
            && entry.nexthops == *nexthops
        {
            return;
        }

        // Minimal command sequence: register new or re-costed faces,
        // unregister vanished ones.
        let mut ops = vec![];
        for nexthop in nexthops.iter() {
            let unchanged = old.is_some_and(|entry| {
                entry.nexthops.iter().any(|other| {
                    other.face_uri == nexthop.face_uri
                        && other.cost == nexthop.cost
                })
            });
            if !unchanged {
                ops.push(FibOp::RegisterNexthop {
                    name: name.clone(),
                    face_uri: nexthop.face_uri.clone(),
                    cost: nexthop.cost.round() as u64,
                });
            }
        }
        if let Some(entry) = old {
            for nexthop in entry.nexthops.iter() {
                if !nexthops
                    .iter()
                    .any(|other| other.face_uri == nexthop.face_uri)
                {
                    ops.push(FibOp::UnregisterNexthop {
                        name: name.clone(),
                        face_uri: nexthop.face_uri.clone(),
                    });
                }
            }
        }

        Debug::FibUpdate(&name, nexthops.len()).log();
        let version = old.map_or(0, |entry| entry.version + 1);
        self.entries.insert(
            name.clone(),
            FibEntry {
                name,
                nexthops: nexthops.clone(),
                version,
            },
        );
        for op in ops {
            self.send_command(op);
        }
    }

    // Unregisters every next hop of the prefix.
    pub fn remove(&mut self, name: &Name) {
        let Some(entry) = self.entries.remove(name) else {
            return;
        };
        Debug::FibRemove(name).log();
        for nexthop in entry.nexthops.iter() {
            self.send_command(FibOp::UnregisterNexthop {
                name: name.clone(),
                face_uri: nexthop.face_uri.clone(),
            });
        }
    }

    fn send_command(&mut self, op: FibOp) {
        self.next_command_id += 1;
        let id = self.next_command_id;
        let msg = FibCommandMsg::new(id, op.clone());
        self.pending.insert(
            id,
            PendingCommand {
                op,
                attempts: 1,
                retry_timer: None,
            },
        );
        let _ = self.proto_output_tx.send(ProtocolOutputMsg::FibCommand(msg));
    }

    // Handles a forwarder acknowledgment. Returns whether the command was
    // dropped after exhausting its retries.
    pub fn process_response(
        &mut self,
        id: CommandId,
        success: bool,
    ) -> bool {
        if success {
            self.pending.remove(&id);
            return false;
        }
        let Some(pending) = self.pending.get_mut(&id) else {
            return false;
        };

        if pending.attempts >= MAX_COMMAND_ATTEMPTS {
            // The in-memory record is left as-is and reconciled by the
            // next successful round of updates.
            let pending = self.pending.remove(&id).unwrap();
            Error::ForwarderUnavailable(pending.op.clone()).log();
            let _ = self
                .ibus_tx
                .send(IbusMsg::FibCommandFailed { op: pending.op });
            return true;
        }

        // Exponential backoff before the retry.
        let backoff = RETRY_BASE_INTERVAL << (pending.attempts - 1);
        Debug::FibRetry(id, pending.attempts).log();
        pending.retry_timer =
            Some(tasks::fib_retry_timer(id, backoff, &self.fib_retryp));
        false
    }

    // Resends a command once its backoff timer fires.
    pub fn process_retry(&mut self, id: CommandId) {
        let Some(pending) = self.pending.get_mut(&id) else {
            return;
        };
        pending.retry_timer = None;
        pending.attempts += 1;
        let msg = FibCommandMsg::new(id, pending.op.clone());
        let _ = self.proto_output_tx.send(ProtocolOutputMsg::FibCommand(msg));
    }
}

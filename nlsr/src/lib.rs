//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]

pub mod collections;
pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod fib;
pub mod ibus;
pub mod instance;
pub mod lsdb;
pub mod npt;
pub mod packet;
pub mod route;
pub mod seqnum;
pub mod spf;
pub mod sync;
pub mod tasks;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! grantflow core
//!
//! Lifecycle engine for foundation grant records: Letters of Interest,
//! Applications, review inputs and decision release.
//!
//! # Architecture
//!
//! - **domain:** records, status machine, access policy, repository contracts
//! - **application:** one service per workflow area plus the
//!   [`GrantWorkflow`](application::GrantWorkflow) facade
//! - **infrastructure:** in-memory and PostgreSQL stores, event bus, notification senders
//! - **presentation:** HTTP API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;

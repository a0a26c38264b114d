// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Entities, value objects and rules of the grant-record lifecycle. Nothing in
//! this layer performs I/O; persistence and delivery are expressed as traits
//! (`repository::GrantStore`, `notification::NotificationSender`).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Grant workflow model, transition table and access policy

pub mod actor;
pub mod application;
pub mod communication;
pub mod cycle;
pub mod errors;
pub mod events;
pub mod history;
pub mod loi;
pub mod notification;
pub mod organization;
pub mod policy;
pub mod portal_config;
pub mod repository;
pub mod review;
pub mod status;
pub mod transitions;

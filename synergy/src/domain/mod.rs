// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Provides mod functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod activity;
pub mod config;
pub mod error;
pub mod events;
pub mod link;
pub mod network;
pub mod node;

pub use activity::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use link::*;
pub use network::*;
pub use node::*;

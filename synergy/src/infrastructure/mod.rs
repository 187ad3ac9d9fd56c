// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for the synergy bounded context

pub mod event_bus;
pub mod registry;

pub use event_bus::{EventBusError, EventReceiver, SynergyEventBus};
pub use registry::{NetworkHandle, NetworkRegistry};

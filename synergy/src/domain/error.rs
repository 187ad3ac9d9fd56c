// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Error types for the synergy engine surface

use thiserror::Error;

/// Errors reported synchronously to callers of the orchestrator surface
///
/// Operations addressed at an unknown network id degrade to a boolean
/// `false` instead of an error wherever batch callers need to continue;
/// `NetworkNotFound` is reserved for lookups where there is nothing
/// sensible to return.
#[derive(Debug, Error)]
pub enum SynergyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network not found: {0}")]
    NetworkNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SynergyError::InvalidArgument("network name must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: network name must not be empty"
        );
    }
}

//! Device binding check.

use sealshare_crypto::constant_time_eq;

use super::geofence::GateVerdict;

/// Compares a share's bound device fingerprint with the presented one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceGate;

impl DeviceGate {
    /// Creates a gate.
    pub fn new() -> Self {
        Self
    }

    /// Unbound shares always pass. Bound shares require an exact match.
    pub fn evaluate(&self, stored: Option<&str>, presented: Option<&str>) -> GateVerdict {
        let Some(stored) = stored else {
            return GateVerdict::allow("No device restriction");
        };
        match presented {
            Some(presented) if constant_time_eq(stored.as_bytes(), presented.as_bytes()) => {
                GateVerdict::allow("Device allowed")
            }
            _ => GateVerdict::deny("Access not allowed from this device"),
        }
    }
}

//! Core types shared by the polling and setpoint paths.
//!
//! Every poll cycle produces fresh values; nothing here is mutated in place.

use chrono::{DateTime, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One configured thermostat: display label plus bare host/IP (no scheme).
///
/// Supplied by configuration and treated as immutable; the address uniquely
/// identifies the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub address: String,
}

/// A thermostat's state as read from one status-page fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub power_on: bool,
    /// Heating turns on under this temperature.
    pub setpoint_on_c: f64,
    /// Heating turns off over this temperature.
    pub setpoint_off_c: f64,
}

/// Everything that can go wrong talking to, or reading from, one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Connection failed or was refused.
    Unreachable(String),
    /// No response within the configured deadline.
    Timeout,
    /// The device answered with a non-2xx status.
    BadResponse(u16),
    /// The status page did not yield a complete, numeric state.
    Parse(String),
    /// Operator-submitted setpoint rejected before any network call.
    InvalidInput(String),
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Unreachable(s) => write!(f, "device unreachable: {}", s),
            DeviceError::Timeout => write!(f, "device did not respond in time"),
            DeviceError::BadResponse(status) => write!(f, "device returned http {}", status),
            DeviceError::Parse(s) => write!(f, "status page parse failed: {}", s),
            DeviceError::InvalidInput(s) => write!(f, "invalid setpoint input: {}", s),
        }
    }
}

impl Error for DeviceError {}

/// Per-device outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub descriptor: DeviceDescriptor,
    pub outcome: Result<DeviceState, DeviceError>,
}

/// Aggregated fleet snapshot: one entry per configured device, in
/// configuration order, regardless of individual failures.
#[derive(Debug, Clone)]
pub struct FleetReport {
    pub polled_at: DateTime<Utc>,
    pub devices: Vec<DeviceReport>,
}

impl FleetReport {
    pub fn failure_count(&self) -> usize {
        self.devices.iter().filter(|d| d.outcome.is_err()).count()
    }
}

/// Operator-submitted setpoint change for one device. Thresholds are kept as
/// the raw submitted strings; validation happens in the setpoint service.
#[derive(Debug, Clone)]
pub struct SetpointRequest {
    pub device: DeviceDescriptor,
    pub on_threshold: String,
    pub off_threshold: String,
}

//! Minimal runtime configuration helpers.
//!
//! The device list is the only required input. It comes from the `DEVICES`
//! environment variable (inline JSON) or, failing that, from a JSON file
//! (`DEVICES_FILE`, default `devices.json` in the working directory):
//!
//! ```json
//! [
//!   { "name": "Living Room", "address": "192.168.178.43" },
//!   { "name": "Bedroom", "address": "192.168.178.67" }
//! ]
//! ```
//!
//! Once loaded the list is immutable and passed explicitly to the services;
//! nothing reads ambient state after startup.

use std::time::Duration;
use std::{fs, path::Path};

use crate::models::device::DeviceDescriptor;

pub const DEFAULT_DEVICES_FILE: &str = "devices.json";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered fleet; report order follows this list.
    pub devices: Vec<DeviceDescriptor>,
    /// Per-device request deadline.
    pub poll_timeout: Duration,
    /// Monitor loop cadence.
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Prefer inline env var; fall back to the devices file.
        let devices_json = match std::env::var("DEVICES") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                let path = std::env::var("DEVICES_FILE").unwrap_or_else(|_| DEFAULT_DEVICES_FILE.to_string());
                let path = Path::new(&path);
                fs::read_to_string(path).map_err(|e| {
                    format!(
                        "Missing device list: set DEVICES or provide {} ({})",
                        path.display(),
                        e
                    )
                })?
            }
        };
        let devices = parse_devices(&devices_json)?;

        let poll_timeout_secs = parse_secs("POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;
        let poll_interval_secs = parse_secs("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;

        Ok(Config {
            devices,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

fn parse_secs(var: &str, default: u64) -> Result<u64, String> {
    match std::env::var(var) {
        Ok(s) if !s.trim().is_empty() => match s.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(format!("{} must be a positive integer number of seconds", var)),
        },
        _ => Ok(default),
    }
}

/// Parse and validate a device-list document.
pub fn parse_devices(json: &str) -> Result<Vec<DeviceDescriptor>, String> {
    let devices: Vec<DeviceDescriptor> =
        serde_json::from_str(json).map_err(|e| format!("device list is not valid JSON: {}", e))?;

    if devices.is_empty() {
        return Err("device list is empty; configure at least one thermostat".to_string());
    }

    for device in &devices {
        if device.name.trim().is_empty() {
            return Err(format!("device {:?} has an empty name", device.address));
        }
        if device.address.trim().is_empty() {
            return Err(format!("device {:?} has an empty address", device.name));
        }
        if device.address.contains("://") {
            return Err(format!(
                "device {:?}: address must be a bare host/IP, got {:?}",
                device.name, device.address
            ));
        }
    }

    for (i, device) in devices.iter().enumerate() {
        if devices[..i].iter().any(|d| d.address == device.address) {
            return Err(format!("duplicate device address: {:?}", device.address));
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_device_list() {
        let devices = parse_devices(
            r#"[
                { "name": "Living Room", "address": "192.168.178.43" },
                { "name": "Bedroom", "address": "192.168.178.67" }
            ]"#,
        )
        .expect("valid list");

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Living Room");
        assert_eq!(devices[0].address, "192.168.178.43");
        assert_eq!(devices[1].name, "Bedroom");
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_devices("[]").is_err());
    }

    #[test]
    fn rejects_address_with_scheme() {
        let err = parse_devices(r#"[{ "name": "Attic", "address": "http://10.0.0.1" }]"#)
            .expect_err("scheme should be rejected");
        assert!(err.contains("bare host/IP"), "{}", err);
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let err = parse_devices(
            r#"[
                { "name": "A", "address": "10.0.0.1" },
                { "name": "B", "address": "10.0.0.1" }
            ]"#,
        )
        .expect_err("duplicates should be rejected");
        assert!(err.contains("duplicate"), "{}", err);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_devices("not json").is_err());
    }
}

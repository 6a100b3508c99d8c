//! Concurrent fleet polling.
//!
//! Every device is an independent failure domain: one unreachable or
//! garbled thermostat degrades to a per-device error entry and never blocks
//! or voids the rest of the report. Total wall time is bounded by the
//! slowest single device (the transport's timeout), not the sum.

use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

use crate::client::DeviceTransport;
use crate::extract;
use crate::models::device::{DeviceDescriptor, DeviceError, DeviceReport, DeviceState, FleetReport};

/// Poll every configured device concurrently and aggregate the outcomes.
///
/// The returned report has exactly one entry per device, in configuration
/// order regardless of completion order.
pub fn fetch_all<T: DeviceTransport>(transport: &T, devices: &[DeviceDescriptor]) -> FleetReport {
    let started = Instant::now();

    let outcomes: Vec<Result<DeviceState, DeviceError>> = thread::scope(|scope| {
        let handles: Vec<_> = devices
            .iter()
            .map(|device| scope.spawn(move || poll_device(transport, device)))
            .collect();
        // Joining in spawn order preserves configuration order.
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(DeviceError::Unreachable("poll worker panicked".into())))
            })
            .collect()
    });

    let report = FleetReport {
        polled_at: chrono::Utc::now(),
        devices: devices
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(descriptor, outcome)| DeviceReport { descriptor, outcome })
            .collect(),
    };

    debug!(
        "Fleet poll complete: {} device(s), {} failure(s), {} ms",
        report.devices.len(),
        report.failure_count(),
        started.elapsed().as_millis()
    );
    report
}

fn poll_device<T: DeviceTransport>(
    transport: &T,
    device: &DeviceDescriptor,
) -> Result<DeviceState, DeviceError> {
    let markup = transport.fetch_status(&device.address)?;
    extract::extract(&markup)
}

/// Poll the fleet on a steady cadence, logging each device's state or error.
pub fn run_loop<T: DeviceTransport>(transport: &T, devices: &[DeviceDescriptor], interval: Duration) {
    loop {
        let tick_start = Instant::now();

        let report = fetch_all(transport, devices);
        log_report(&report);

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

pub fn log_report(report: &FleetReport) {
    for device in &report.devices {
        match &device.outcome {
            Ok(state) => info!(
                "{} ({}): {:.1}ºC, {:.0}% RH, power {}, on under {:.1}ºC, off over {:.1}ºC",
                device.descriptor.name,
                device.descriptor.address,
                state.temperature_c,
                state.humidity_pct,
                if state.power_on { "on" } else { "off" },
                state.setpoint_on_c,
                state.setpoint_off_c
            ),
            Err(e) => warn!(
                "{} ({}): {}",
                device.descriptor.name, device.descriptor.address, e
            ),
        }
    }
}

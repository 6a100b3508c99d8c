//! Operator setpoint submission, independent of the polling path.

use log::info;

use crate::client::DeviceTransport;
use crate::models::device::{DeviceError, SetpointRequest};

/// Validate and forward a setpoint change to its device.
///
/// Both thresholds must be finite decimals; a malformed input is rejected
/// with `InvalidInput` before any network call. Threshold ordering is not
/// checked — the device is authoritative about its own semantics.
pub fn apply<T: DeviceTransport>(transport: &T, request: &SetpointRequest) -> Result<(), DeviceError> {
    let on_c = parse_threshold("on", &request.on_threshold)?;
    let off_c = parse_threshold("off", &request.off_threshold)?;

    transport.submit_setpoint(&request.device.address, on_c, off_c)?;
    info!(
        "Setpoint applied to {} ({}): on under {}ºC, off over {}ºC",
        request.device.name, request.device.address, on_c, off_c
    );
    Ok(())
}

fn parse_threshold(field: &str, raw: &str) -> Result<f64, DeviceError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DeviceError::InvalidInput(format!(
            "{} threshold is not a decimal: {:?}",
            field, raw
        ))),
    }
}

pub mod client;
pub mod config;
pub mod extract;
pub mod models {
    pub mod device;
}
pub mod services {
    pub mod fleet;
    pub mod setpoint;
}

use crate::client::DeviceClient;
use crate::config::Config;
use crate::models::device::SetpointRequest;
use crate::services::{fleet, setpoint};
use log::{error, info};

#[derive(Debug)]
enum Mode {
    /// Poll the fleet on a steady cadence (default).
    Monitor,
    /// Poll the fleet once, report, exit.
    Once,
    /// Apply a setpoint pair to one named device, then exit.
    Set {
        device_name: String,
        on_threshold: String,
        off_threshold: String,
    },
}

fn run(mode: Mode) -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded ({} device(s), poll_timeout={}s, poll_interval={}s)",
        cfg.devices.len(),
        cfg.poll_timeout.as_secs(),
        cfg.poll_interval.as_secs()
    );

    // 2) Init device client
    let client = DeviceClient::new(cfg.poll_timeout);

    match mode {
        Mode::Set {
            device_name,
            on_threshold,
            off_threshold,
        } => {
            let device = cfg
                .devices
                .iter()
                .find(|d| d.name == device_name)
                .ok_or_else(|| format!("no configured device named {:?}", device_name))?;
            let request = SetpointRequest {
                device: device.clone(),
                on_threshold,
                off_threshold,
            };
            setpoint::apply(&client, &request).map_err(|e| {
                format!("setpoint submission to {:?} failed: {}", device.name, e)
            })?;
            Ok(())
        }
        Mode::Once => {
            let report = fleet::fetch_all(&client, &cfg.devices);
            fleet::log_report(&report);
            info!(
                "Fleet poll complete: {} device(s), {} failure(s)",
                report.devices.len(),
                report.failure_count()
            );
            Ok(())
        }
        Mode::Monitor => {
            info!(
                "Starting monitor loop: {} device(s), interval={}s",
                cfg.devices.len(),
                cfg.poll_interval.as_secs()
            );
            fleet::run_loop(&client, &cfg.devices, cfg.poll_interval);
            Ok(())
        }
    }
}

fn parse_cli() -> Result<Mode, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut mode: Option<Mode> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--once") => {
                if mode.is_some() {
                    return Err("`--once` conflicts with an earlier mode argument".to_string());
                }
                mode = Some(Mode::Once);
            }
            Some("--set") => {
                if mode.is_some() {
                    return Err("`--set` conflicts with an earlier mode argument".to_string());
                }
                let mut value = |what: &str| {
                    args.next()
                        .and_then(|v| v.to_str().map(str::to_string))
                        .ok_or_else(|| format!("`--set` requires {} (usage: --set <name> <on> <off>)", what))
                };
                let device_name = value("a device name")?;
                let on_threshold = value("an on-threshold")?;
                let off_threshold = value("an off-threshold")?;
                mode = Some(Mode::Set {
                    device_name,
                    on_threshold,
                    off_threshold,
                });
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    Ok(mode.unwrap_or(Mode::Monitor))
}

fn main() {
    let mode = match parse_cli() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    info!(
        "thermofleet {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(mode) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

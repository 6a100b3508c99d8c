//! HTTP access to a single thermostat.
//!
//! - Blocking client using `ureq` (no async).
//! - One request per call, bounded by the agent-wide timeout; no retries —
//!   retry policy belongs to the caller.
//! - No state retained between calls beyond the connection agent itself.
//!
//! The devices speak plain HTTP on their root path: `GET http://{address}/`
//! returns the status page, `POST http://{address}/` with form fields `on`,
//! `off` and `save` applies new thresholds.

use std::io::ErrorKind;
use std::time::Duration;

use crate::models::device::DeviceError;

/// Seam between the services and the network, so the aggregation and
/// setpoint paths can be exercised against canned transports in tests.
pub trait DeviceTransport: Sync {
    /// Fetch the raw status markup of the device at `address`.
    fn fetch_status(&self, address: &str) -> Result<String, DeviceError>;

    /// Submit new on/off thresholds (celsius) to the device at `address`.
    fn submit_setpoint(&self, address: &str, on_c: f64, off_c: f64) -> Result<(), DeviceError>;
}

pub struct DeviceClient {
    agent: ureq::Agent,
}

impl DeviceClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        DeviceClient { agent }
    }

    fn url(address: &str) -> String {
        format!("http://{}/", address)
    }
}

impl DeviceTransport for DeviceClient {
    fn fetch_status(&self, address: &str) -> Result<String, DeviceError> {
        let mut resp = self
            .agent
            .get(&Self::url(address))
            .call()
            .map_err(to_device_error)?;
        resp.body_mut().read_to_string().map_err(to_device_error)
    }

    fn submit_setpoint(&self, address: &str, on_c: f64, off_c: f64) -> Result<(), DeviceError> {
        let on = on_c.to_string();
        let off = off_c.to_string();
        self.agent
            .post(&Self::url(address))
            .send_form([("on", on.as_str()), ("off", off.as_str()), ("save", "")])
            .map(|_| ())
            .map_err(to_device_error)
    }
}

fn to_device_error(err: ureq::Error) -> DeviceError {
    match err {
        ureq::Error::StatusCode(status) => DeviceError::BadResponse(status),
        ureq::Error::Timeout(_) => DeviceError::Timeout,
        ureq::Error::Io(e) if e.kind() == ErrorKind::TimedOut => DeviceError::Timeout,
        other => DeviceError::Unreachable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Read one full HTTP request (headers plus Content-Length body).
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serve exactly one canned HTTP response on a loopback port, capturing
    /// the request bytes. Returns (address, join handle yielding the request).
    fn one_shot_server(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).expect("write response");
            request
        });
        (address, handle)
    }

    #[test]
    fn fetch_status_returns_body() {
        let (address, server) = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Length: 22\r\nConnection: close\r\n\r\n<dl><dd>21.5</dd></dl>",
        );
        let client = DeviceClient::new(Duration::from_secs(2));
        let body = client.fetch_status(&address).expect("status fetch");
        assert_eq!(body, "<dl><dd>21.5</dd></dl>");

        let request = server.join().expect("server thread");
        assert!(request.starts_with("GET / HTTP/1.1"));
    }

    #[test]
    fn non_2xx_maps_to_bad_response() {
        let (address, server) = one_shot_server(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let client = DeviceClient::new(Duration::from_secs(2));
        let err = client.fetch_status(&address).expect_err("expected failure");
        assert_eq!(err, DeviceError::BadResponse(503));
        server.join().expect("server thread");
    }

    #[test]
    fn refused_connection_maps_to_unreachable() {
        // Bind then drop to obtain a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        drop(listener);

        let client = DeviceClient::new(Duration::from_secs(2));
        match client.fetch_status(&address) {
            Err(DeviceError::Unreachable(_)) => {}
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }

    #[test]
    fn silent_server_maps_to_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        // Accept but never answer.
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            thread::sleep(Duration::from_millis(800));
            drop(stream);
        });

        let client = DeviceClient::new(Duration::from_millis(200));
        let err = client.fetch_status(&address).expect_err("expected timeout");
        assert_eq!(err, DeviceError::Timeout);
        server.join().expect("server thread");
    }

    #[test]
    fn setpoint_posts_form_fields() {
        let (address, server) =
            one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let client = DeviceClient::new(Duration::from_secs(2));
        client.submit_setpoint(&address, 19.0, 24.5).expect("setpoint accepted");

        let request = server.join().expect("server thread");
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.contains("on=19"));
        assert!(request.contains("off=24.5"));
        assert!(request.contains("save="));
    }
}

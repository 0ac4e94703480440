//! Remote parameter source.
//!
//! The production source is a plain `GET` returning the [`RemotePayload`]
//! JSON object. Tests substitute their own [`ParameterSource`].

use std::io::Read;
use std::time::Duration;

use thiserror::Error;

use bidwatch_core::{ParameterSnapshot, RemotePayload};

/// Bytes of an error response body kept for the log line.
const ERROR_BODY_LIMIT: u64 = 1024;

/// Fetch or decode failure. Never fatal; the next tick retries.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or transport failure, including timeouts.
    #[error("failed to GET {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected status {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The body was not the expected JSON object.
    #[error("failed to decode JSON from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where parameter snapshots come from.
pub trait ParameterSource: Send {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<ParameterSnapshot, SourceError>;
}

/// Blocking HTTP/JSON source with a bounded per-request timeout.
pub struct HttpSource {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl ParameterSource for HttpSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    fn fetch(&self) -> Result<ParameterSnapshot, SourceError> {
        let response = match self.agent.get(&self.endpoint).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(SourceError::Status {
                    endpoint: self.endpoint.clone(),
                    status,
                    body: read_error_body(response),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(SourceError::Transport {
                    endpoint: self.endpoint.clone(),
                    source: Box::new(transport),
                });
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(SourceError::Status {
                endpoint: self.endpoint.clone(),
                status,
                body: read_error_body(response),
            });
        }

        let payload: RemotePayload =
            serde_json::from_reader(response.into_reader()).map_err(|source| {
                SourceError::Decode {
                    endpoint: self.endpoint.clone(),
                    source,
                }
            })?;
        Ok(ParameterSnapshot::from(payload))
    }
}

fn read_error_body(response: ureq::Response) -> String {
    let mut buf = Vec::new();
    let _ = response
        .into_reader()
        .take(ERROR_BODY_LIMIT)
        .read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use bidwatch_core::ParamValue;

    use super::*;

    /// Serve exactly one canned HTTP response on an ephemeral port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut line = String::new();
            while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}/config")
    }

    #[test]
    fn describe_is_the_endpoint_url() {
        let source = HttpSource::new("http://127.0.0.1:9/params", Duration::from_secs(1));
        assert_eq!(source.describe(), "http://127.0.0.1:9/params");
    }

    #[test]
    fn decodes_partial_payload() {
        let endpoint = serve_once("200 OK", r#"{"small_bid":0.1,"max_concurrency":10}"#);
        let snapshot = HttpSource::new(endpoint, Duration::from_secs(5))
            .fetch()
            .expect("fetch");

        assert_eq!(
            snapshot.get("BID_SMALL_AMOUNT"),
            Some(ParamValue::Decimal(0.1))
        );
        assert_eq!(snapshot.get("BID_LARGE_AMOUNT"), None);
        assert_eq!(
            snapshot.get("BIDDER_MAX_CONCURRENT_PROOFS"),
            Some(ParamValue::Integer(10))
        );
    }

    #[test]
    fn non_success_status_is_status_error_with_body() {
        let endpoint = serve_once("503 Service Unavailable", "maintenance");
        let err = HttpSource::new(endpoint, Duration::from_secs(5))
            .fetch()
            .unwrap_err();

        match err {
            SourceError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let endpoint = serve_once("200 OK", r#"{"small_bid": "cheap"}"#);
        let err = HttpSource::new(endpoint, Duration::from_secs(5))
            .fetch()
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }), "got: {err}");
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let err = HttpSource::new(
            format!("http://127.0.0.1:{port}/config"),
            Duration::from_secs(2),
        )
        .fetch()
        .unwrap_err();
        assert!(matches!(err, SourceError::Transport { .. }), "got: {err}");
    }
}
